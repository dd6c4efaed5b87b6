use anyhow::Result;
use log::debug;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::aim::Launch;
use crate::ball::{resolve_collision, Ball};
use crate::sim_params::{MovementProperties, SimParams};
use crate::snapshot::BallView;
use crate::vecmath::Vector2D;
use crate::viewport::LocalDimensions;

/// The simulation context: every active ball plus the constants they move by.
///
/// Owned by the caller and stepped once per frame. Balls are only ever added,
/// between steps.
pub struct World {
    dimensions: LocalDimensions,
    movement: MovementProperties,
    ball_radius: f64,
    balls: Vec<Ball>,
    /// Only used to pick a separation direction for still, overlapping pairs.
    rng: StdRng,
}

impl World {
    pub fn new(dimensions: LocalDimensions, movement: MovementProperties, ball_radius: f64, seed: u64) -> Self {
        World {
            dimensions,
            movement,
            ball_radius,
            balls: Vec::new(),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_params(params: &SimParams) -> Self {
        World::new(params.dimensions, params.movement, params.ball_radius, params.seed)
    }

    pub fn balls(&self) -> &[Ball] {
        &self.balls
    }

    pub fn len(&self) -> usize {
        self.balls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.balls.is_empty()
    }

    pub fn dimensions(&self) -> &LocalDimensions {
        &self.dimensions
    }

    /// Adds a ball for a completed aim gesture. Returns its index.
    pub fn spawn(&mut self, launch: Launch) -> Result<usize> {
        let ball = Ball::launch(launch.position, launch.direction, self.ball_radius, &self.dimensions, &self.movement)?;
        debug!(
            "Spawned ball #{} at ({:.2}, {:.2}) with velocity ({:.3}, {:.3})",
            self.balls.len(),
            ball.position.x,
            ball.position.y,
            ball.velocity.x,
            ball.velocity.y
        );
        self.balls.push(ball);
        Ok(self.balls.len() - 1)
    }

    /// Adds an already constructed ball.
    pub fn push(&mut self, ball: Ball) -> usize {
        self.balls.push(ball);
        self.balls.len() - 1
    }

    /// Advances every ball one frame, then resolves all pairwise collisions.
    /// Returns the number of colliding pairs.
    pub fn step(&mut self) -> usize {
        for ball in self.balls.iter_mut() {
            ball.advance(&self.movement);
        }

        let mut collisions = 0;
        for i in 0..self.balls.len() {
            for j in (i + 1)..self.balls.len() {
                let (left, right) = self.balls.split_at_mut(j);
                if resolve_collision(&mut left[i], &mut right[0], &mut self.rng) {
                    collisions += 1;
                }
            }
        }
        collisions
    }

    /// Position and radius of every ball, for rendering.
    pub fn views(&self) -> impl Iterator<Item = BallView> + '_ {
        self.balls.iter().map(BallView::from)
    }

    pub fn positions(&self) -> Vec<Vector2D> {
        self.balls.iter().map(|b| b.position).collect()
    }

    pub fn kinetic_energy(&self) -> f64 {
        self.balls.iter().map(Ball::kinetic_energy).sum()
    }

    pub fn grounded_count(&self) -> usize {
        self.balls.iter().filter(|b| b.is_grounded()).count()
    }

    pub fn resting_count(&self) -> usize {
        self.balls.iter().filter(|b| b.is_resting()).count()
    }
}
