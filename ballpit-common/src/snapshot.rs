use serde::{Deserialize, Serialize};

use crate::ball::Ball;

/// What the renderer needs to draw one ball.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct BallView {
    pub x: f64,
    pub y: f64,
    pub radius: f64,
}

impl From<&Ball> for BallView {
    fn from(ball: &Ball) -> Self {
        BallView {
            x: ball.position.x,
            y: ball.position.y,
            radius: ball.radius(),
        }
    }
}

/// A snapshot of the simulation state and metrics at a specific frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    /// Number of steps taken when the snapshot was recorded.
    pub frame: u64,
    /// Simulated time in seconds (`frame / fps`).
    pub time: f64,
    /// The total number of balls in the world.
    pub ball_count: u32,
    /// Balls whose center lies on the floor bound.
    pub grounded_count: u32,
    /// Grounded balls with an exactly zero velocity.
    pub resting_count: u32,
    /// Sum of `|v|^2 / 2` over all balls (unit masses, per-frame units).
    pub kinetic_energy: f64,
    /// Collisions resolved during the step that produced this state.
    pub collisions: u32,
    /// Every ball's position and radius, if recorded.
    /// Always serialized (even as `None`) so the bincode stream stays readable.
    pub balls: Option<Vec<BallView>>,
}
