use serde::{Deserialize, Serialize};

use crate::viewport::{LocalDimensions, Viewport};

/// Frame rate the movement constants were tuned for.
pub const REFERENCE_FPS: u32 = 60;

/// Per-frame movement constants of a ball.
///
/// All values are per frame at `REFERENCE_FPS`; changing the frame rate means
/// re-deriving them together.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovementProperties {
    /// Isotropic velocity decay applied every frame.
    pub air_resistance: f64,
    /// Vertical speed kept when hitting the floor.
    pub hit_resistance: f64,
    /// Horizontal speed kept per frame while touching the floor.
    pub rolling_resistance: f64,
    /// Added to the vertical velocity every frame the ball is airborne.
    pub gravity: f64,
    /// Converts an aim vector into per-frame displacement, applied once at launch.
    pub velocity_factor: f64,
    /// Speed below which a grounded ball is locked at rest.
    pub near_zero: f64,
}

impl Default for MovementProperties {
    fn default() -> Self {
        MovementProperties {
            air_resistance: 0.995,
            hit_resistance: 0.8,
            rolling_resistance: 0.98,
            gravity: 0.05,
            velocity_factor: 0.07,
            near_zero: crate::vecmath::NEAR_ZERO,
        }
    }
}

/// Simulation parameters derived from the configuration, used at runtime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimParams {
    // World
    pub dimensions: LocalDimensions,
    pub viewport: Viewport,

    // Time
    pub fps: u32,
    pub frame_interval_secs: f64,
    pub total_frames: u64,
    pub record_interval_frames: u64,
    pub realtime: bool,

    // Balls
    pub ball_radius: f64,
    pub movement: MovementProperties,
    pub seed: u64,
}
