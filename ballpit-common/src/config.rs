use anyhow::Result;
use log::warn;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::sim_params::{MovementProperties, SimParams, REFERENCE_FPS};
use crate::viewport::{LocalDimensions, Viewport};

// Configuration for frame timing
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct TimingConfig {
    #[serde(default = "default_fps")]
    pub fps: u32,
    pub duration_secs: f64,
    #[serde(default = "default_record_interval_frames")]
    pub record_interval_frames: u64,
    /// Pace steps to the wall clock instead of running as fast as possible.
    #[serde(default)]
    pub realtime: bool,
}

// Logical size of the world, in simulation units
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct WorldConfig {
    pub width: f64,
    pub height: f64,
}

impl Default for WorldConfig {
    fn default() -> Self {
        let dims = LocalDimensions::default();
        WorldConfig { width: dims.width, height: dims.height }
    }
}

// Movement constants, all per frame at the configured fps
#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(default)]
pub struct PhysicsConfig {
    pub air_resistance: f64,
    pub hit_resistance: f64,
    pub rolling_resistance: f64,
    pub gravity: f64,
    pub velocity_factor: f64,
    pub near_zero: f64,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        let m = MovementProperties::default();
        PhysicsConfig {
            air_resistance: m.air_resistance,
            hit_resistance: m.hit_resistance,
            rolling_resistance: m.rolling_resistance,
            gravity: m.gravity,
            velocity_factor: m.velocity_factor,
            near_zero: m.near_zero,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct BallConfig {
    pub radius: f64,
}

impl Default for BallConfig {
    fn default() -> Self {
        BallConfig { radius: 1.5 }
    }
}

// Device-space placement of the drawing surface the gestures are recorded on
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct CanvasConfig {
    #[serde(default)]
    pub left: f64,
    #[serde(default)]
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        CanvasConfig { left: 0.0, top: 0.0, width: 1200.0, height: 800.0 }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct InitialConditions {
    /// Seed for the generator that separates still, overlapping balls.
    #[serde(default)]
    pub seed: u64,
}

/// A scripted pointer gesture, replayed before the step of `frame`.
/// Points are in canvas (device) pixels.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct GestureConfig {
    pub frame: u64,
    pub press: [f64; 2],
    #[serde(default)]
    pub drag: Vec<[f64; 2]>,
    /// Release at the end of the drag. Without it the aim stays open for a later gesture.
    #[serde(default = "default_release")]
    pub release: bool,
}

fn default_release() -> bool {
    true
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Json,
    Bincode,
    Messagepack,
}

// Configuration for output settings
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct OutputConfig {
    pub base_filename: String,
    #[serde(default = "default_output_format")]
    pub format: OutputFormat,
    #[serde(default = "default_true")]
    pub save_stats: bool,
    #[serde(default)]
    pub save_positions: bool,
    #[serde(default = "default_true")]
    pub save_positions_in_snapshot: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig {
            base_filename: String::from("ballpit"),
            format: default_output_format(),
            save_stats: true,
            save_positions: false,
            save_positions_in_snapshot: true,
        }
    }
}

fn default_fps() -> u32 {
    REFERENCE_FPS
}

fn default_record_interval_frames() -> u64 {
    1
}

fn default_output_format() -> OutputFormat {
    OutputFormat::Bincode
}

fn default_true() -> bool {
    true
}

// Main simulation configuration structure, loaded from config.toml.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct SimulationConfig {
    pub timing: TimingConfig,
    #[serde(default)]
    pub world: WorldConfig,
    #[serde(default)]
    pub physics: PhysicsConfig,
    #[serde(default)]
    pub ball: BallConfig,
    #[serde(default)]
    pub canvas: CanvasConfig,
    #[serde(default)]
    pub initial_conditions: InitialConditions,
    #[serde(default)]
    pub gestures: Vec<GestureConfig>,
    #[serde(default)]
    pub output: OutputConfig,
}

impl SimulationConfig {
    /// Loads the simulation configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();

        let config_str = std::fs::read_to_string(path_ref)
            .map_err(|e| anyhow::anyhow!("Failed to read config file '{}': {}", path_ref.display(), e))?;
        Self::from_toml_str(&config_str)
            .map_err(|e| anyhow::anyhow!("Invalid config '{}': {}", path_ref.display(), e))
    }

    /// Parses and validates a configuration from TOML text.
    pub fn from_toml_str(config_str: &str) -> Result<Self> {
        let mut config: SimulationConfig = toml::from_str(config_str)?;
        config.validate()?;
        config.gestures.sort_by_key(|g| g.frame);
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.timing.fps == 0 {
            anyhow::bail!("fps must be greater than 0.");
        }
        if !(self.timing.duration_secs >= 0.0) {
            anyhow::bail!("duration_secs must not be negative.");
        }
        if !(self.world.width > 0.0 && self.world.height > 0.0) {
            anyhow::bail!("World dimensions must be positive.");
        }
        let radius = self.ball.radius;
        if !(radius > 0.0) {
            anyhow::bail!("Ball radius must be positive.");
        }
        if 2.0 * radius > self.world.width || 2.0 * radius > self.world.height {
            anyhow::bail!(
                "Ball radius {} does not fit in a {}x{} world.",
                radius,
                self.world.width,
                self.world.height
            );
        }
        let physics = &self.physics;
        for (name, value) in [
            ("air_resistance", physics.air_resistance),
            ("hit_resistance", physics.hit_resistance),
            ("rolling_resistance", physics.rolling_resistance),
        ] {
            if !(value > 0.0 && value <= 1.0) {
                anyhow::bail!("{} must be in (0, 1], got {}.", name, value);
            }
        }
        if !(physics.gravity >= 0.0) || !(physics.velocity_factor >= 0.0) || !(physics.near_zero >= 0.0) {
            anyhow::bail!("gravity, velocity_factor and near_zero must not be negative.");
        }
        if !(self.canvas.width > 0.0 && self.canvas.height > 0.0) {
            anyhow::bail!("Canvas dimensions must be positive.");
        }

        if self.timing.fps != REFERENCE_FPS {
            warn!(
                "fps is {} but the movement constants are tuned for {} fps; re-derive them together.",
                self.timing.fps, REFERENCE_FPS
            );
        }
        Ok(())
    }

    pub fn dimensions(&self) -> LocalDimensions {
        LocalDimensions::new(self.world.width, self.world.height)
    }

    /// Converts the configuration into simulation parameters used at runtime.
    pub fn get_sim_params(&self) -> SimParams {
        let dimensions = self.dimensions();
        let fps = self.timing.fps;
        let total_frames = (self.timing.duration_secs * fps as f64).ceil() as u64;

        SimParams {
            dimensions,
            viewport: Viewport::new(
                self.canvas.left,
                self.canvas.top,
                self.canvas.width,
                self.canvas.height,
                &dimensions,
            ),
            fps,
            frame_interval_secs: 1.0 / fps as f64,
            total_frames,
            record_interval_frames: self.timing.record_interval_frames,
            realtime: self.timing.realtime,
            ball_radius: self.ball.radius,
            movement: MovementProperties {
                air_resistance: self.physics.air_resistance,
                hit_resistance: self.physics.hit_resistance,
                rolling_resistance: self.physics.rolling_resistance,
                gravity: self.physics.gravity,
                velocity_factor: self.physics.velocity_factor,
                near_zero: self.physics.near_zero,
            },
            seed: self.initial_conditions.seed,
        }
    }
}
