pub mod aim;
pub mod ball;
pub mod config;
pub mod sim_params;
pub mod snapshot;
pub mod vecmath;
pub mod viewport;
pub mod world;

// Re-export key types for easier use by dependent crates
pub use aim::{AimTracker, Launch};
pub use ball::{resolve_collision, Ball, BorderBounds};
pub use config::{BallConfig, CanvasConfig, GestureConfig, InitialConditions, OutputConfig, OutputFormat, PhysicsConfig, SimulationConfig, TimingConfig, WorldConfig};
pub use sim_params::{MovementProperties, SimParams, REFERENCE_FPS};
pub use snapshot::{BallView, Snapshot};
pub use vecmath::{clamp, Vector2D, NEAR_ZERO};
pub use viewport::{LocalDimensions, Viewport};
pub use world::World;
