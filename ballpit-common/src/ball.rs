use anyhow::Result;
use log::trace;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::sim_params::MovementProperties;
use crate::vecmath::Vector2D;
use crate::viewport::LocalDimensions;

/// Extra separation added on top of the overlap so resolved pairs end up strictly apart.
const SEPARATION_EPSILON: f64 = 0.001;

/// Axis-aligned rectangle, inset by the radius, that a ball's center must stay in.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct BorderBounds {
    pub top: f64,
    pub bottom: f64,
    pub left: f64,
    pub right: f64,
}

impl BorderBounds {
    pub fn new(radius: f64, dimensions: &LocalDimensions) -> Self {
        BorderBounds {
            top: radius,
            bottom: dimensions.height - radius,
            left: radius,
            right: dimensions.width - radius,
        }
    }

    pub fn contains(&self, point: Vector2D) -> bool {
        point.x >= self.left && point.x <= self.right && point.y >= self.top && point.y <= self.bottom
    }
}

/// One simulated circle. Built through `Ball::new`, which validates the radius.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ball {
    /// Center, in simulation units.
    pub position: Vector2D,
    /// Displacement per frame (already time-integrated).
    pub velocity: Vector2D,
    radius: f64,
    bounds: BorderBounds,
}

impl Ball {
    /// Creates a ball with a raw per-frame velocity.
    ///
    /// Fails if the radius is not a positive finite number or does not fit
    /// inside `dimensions` (which would invert the border bounds).
    pub fn new(position: Vector2D, velocity: Vector2D, radius: f64, dimensions: &LocalDimensions) -> Result<Self> {
        anyhow::ensure!(
            radius.is_finite() && radius > 0.0,
            "Ball radius must be a positive finite number, got {}.",
            radius
        );
        anyhow::ensure!(
            2.0 * radius <= dimensions.width && 2.0 * radius <= dimensions.height,
            "Ball radius {} does not fit in a {}x{} world.",
            radius,
            dimensions.width,
            dimensions.height
        );

        Ok(Ball {
            position,
            velocity,
            radius,
            bounds: BorderBounds::new(radius, dimensions),
        })
    }

    /// Creates a ball from an aim vector, scaling it by the velocity factor.
    pub fn launch(
        position: Vector2D,
        aim: Vector2D,
        radius: f64,
        dimensions: &LocalDimensions,
        props: &MovementProperties,
    ) -> Result<Self> {
        Ball::new(position, aim.mult(props.velocity_factor), radius, dimensions)
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn bounds(&self) -> &BorderBounds {
        &self.bounds
    }

    /// Center lies exactly on the bottom bound.
    pub fn is_grounded(&self) -> bool {
        self.position.y == self.bounds.bottom
    }

    /// Velocity exactly zero while on the floor.
    pub fn is_resting(&self) -> bool {
        self.velocity.is_zero() && self.is_grounded()
    }

    /// Kinetic energy with unit mass.
    pub fn kinetic_energy(&self) -> f64 {
        0.5 * self.velocity.length_squared()
    }

    /// Advances the ball by one frame: integrate, contain within the walls,
    /// then apply resistances and gravity. The order of the steps matters.
    pub fn advance(&mut self, props: &MovementProperties) {
        let bounds = self.bounds;

        // --- 1. Lock a grounded, almost still ball at rest ---
        if self.velocity.is_near_zero_by(props.near_zero)
            && self.position.y == bounds.bottom
            && !self.velocity.is_zero()
        {
            self.velocity = Vector2D::zero();
        }

        // --- 2. Integrate ---
        self.position = self.position + self.velocity;

        // --- 3. Side walls (elastic reflection) ---
        if self.position.x <= bounds.left || self.position.x >= bounds.right {
            self.position.x = if self.position.x <= bounds.left { bounds.left } else { bounds.right };
            self.velocity.x = -self.velocity.x;
        }

        // --- 4. Ceiling and floor ---
        if self.position.y <= bounds.top || self.position.y >= bounds.bottom {
            self.position.y = if self.position.y <= bounds.top { bounds.top } else { bounds.bottom };

            if self.position.y == bounds.bottom {
                // Floor contact: inelastic impact plus rolling friction
                self.velocity.y *= props.hit_resistance;
                self.velocity.x *= props.rolling_resistance;
            }

            self.velocity.y = -self.velocity.y;
        }

        // --- 5. Air resistance ---
        self.velocity = self.velocity.mult(props.air_resistance);

        // --- 6. Gravity, unless the ball sits on the floor ---
        if self.position.y == bounds.bottom && self.velocity.y.abs() <= props.near_zero {
            self.velocity.y = 0.0;
        } else {
            self.velocity.y += props.gravity;
        }
    }

    /// Resolves an elastic collision with `other`, mutating both balls.
    ///
    /// Equal masses are assumed. Returns `false` without touching either ball
    /// when they do not overlap.
    pub fn collide<R: Rng + ?Sized>(&mut self, other: &mut Ball, rng: &mut R) -> bool {
        let min_distance = self.radius + other.radius;
        let delta = self.position - other.position;
        let distance = delta.length();

        if distance > min_distance {
            return false;
        }

        // Coincident centers have no line of centers; only separate them.
        if distance != 0.0 {
            let coeff = (self.velocity - other.velocity).dot(delta) / (distance * distance);
            self.velocity = self.velocity - delta.mult(coeff);
            other.velocity = other.velocity - delta.opposite().mult(coeff);
        }

        // Two still balls need some direction to be pushed apart along.
        let kicked = self.velocity.is_zero() && other.velocity.is_zero();
        if kicked {
            self.velocity = Vector2D::random(rng);
            other.velocity = self.velocity.opposite();
        }

        let correction = (min_distance - distance) / 2.0 + SEPARATION_EPSILON;
        self.position = self.position + self.velocity.try_normalize().mult(correction);
        other.position = other.position + other.velocity.try_normalize().mult(correction);

        if kicked {
            self.velocity = Vector2D::zero();
            other.velocity = Vector2D::zero();
        }

        trace!(
            "Collision at distance {:.4} (min {:.4}){}",
            distance,
            min_distance,
            if kicked { ", separated still pair" } else { "" }
        );
        true
    }
}

/// Resolves a collision between two balls. See [`Ball::collide`].
pub fn resolve_collision<R: Rng + ?Sized>(a: &mut Ball, b: &mut Ball, rng: &mut R) -> bool {
    a.collide(b, rng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const EPSILON: f64 = 1e-8;

    fn near_equal(a: f64, b: f64) -> bool {
        (a - b).abs() < EPSILON
    }

    fn dimensions() -> LocalDimensions {
        LocalDimensions::new(100.0, 100.0 * (2.0 / 3.0))
    }

    fn launched(x: f64, y: f64, aim_x: f64, aim_y: f64) -> Ball {
        Ball::launch(
            Vector2D::new(x, y),
            Vector2D::new(aim_x, aim_y),
            1.0,
            &dimensions(),
            &MovementProperties::default(),
        )
        .expect("valid ball")
    }

    #[test]
    fn bounds_are_inset_by_radius() {
        let ball = Ball::new(Vector2D::new(10.0, 10.0), Vector2D::zero(), 1.5, &dimensions()).unwrap();
        let bounds = ball.bounds();
        assert_eq!(bounds.top, 1.5);
        assert_eq!(bounds.left, 1.5);
        assert_eq!(bounds.right, 98.5);
        assert_eq!(bounds.bottom, 100.0 * (2.0 / 3.0) - 1.5);
    }

    #[test]
    fn rejects_invalid_radius() {
        let dims = LocalDimensions::new(10.0, 6.0);
        assert!(Ball::new(Vector2D::zero(), Vector2D::zero(), 0.0, &dims).is_err());
        assert!(Ball::new(Vector2D::zero(), Vector2D::zero(), -1.0, &dims).is_err());
        assert!(Ball::new(Vector2D::zero(), Vector2D::zero(), f64::NAN, &dims).is_err());
        assert!(Ball::new(Vector2D::zero(), Vector2D::zero(), 3.5, &dims).is_err());
        assert!(Ball::new(Vector2D::zero(), Vector2D::zero(), 3.0, &dims).is_ok());
    }

    #[test]
    fn launch_applies_velocity_factor() {
        let ball = launched(50.0, 50.0, 10.0, -5.0);
        assert!(near_equal(ball.velocity.x, 0.7));
        assert!(near_equal(ball.velocity.y, -0.35));
    }

    #[test]
    fn clone_is_independent() {
        let ball = launched(50.0, 50.0, 10.0, 0.0);
        let mut copy = ball.clone();
        assert_eq!(copy, ball);
        copy.position.x = 1.0;
        copy.velocity = Vector2D::zero();
        assert_eq!(ball.position.x, 50.0);
        assert!(!ball.velocity.is_zero());
    }

    #[test]
    fn no_collision_leaves_balls_unchanged() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut a = launched(50.0, 50.0, 10.0, 0.0);
        let mut b = launched(60.0, 50.0, 10.0, 0.0);
        let (old_a, old_b) = (a.clone(), b.clone());

        assert!(!a.collide(&mut b, &mut rng));

        assert_eq!(a, old_a);
        assert_eq!(b, old_b);
    }

    #[test]
    fn moving_ball_stops_and_pushes_stationary_ball() {
        let mut rng = StdRng::seed_from_u64(1);
        let old_position_a = Vector2D::new(50.0, 50.0);
        let old_position_b = Vector2D::new(50.5, 50.0);
        let mut a = launched(old_position_a.x, old_position_a.y, 10.0, 0.0);
        let mut b = launched(old_position_b.x, old_position_b.y, 0.0, 0.0);
        let (old_velocity_a, old_velocity_b) = (a.velocity, b.velocity);

        assert!(a.collide(&mut b, &mut rng));

        assert!(near_equal(a.position.x, old_position_a.x));
        assert!(near_equal(a.position.y, old_position_a.y));
        assert!(near_equal(a.velocity.x, old_velocity_b.x));
        assert!(near_equal(a.velocity.y, old_velocity_b.y));
        assert!(!near_equal(b.position.x, old_position_b.x));
        assert!(near_equal(b.position.y, old_position_b.y));
        assert!(near_equal(b.velocity.x, old_velocity_a.x));
        assert!(near_equal(b.velocity.y, old_velocity_a.y));
    }

    #[test]
    fn two_moving_balls_swap_velocities() {
        let mut rng = StdRng::seed_from_u64(1);
        let old_position_a = Vector2D::new(50.0, 50.0);
        let old_position_b = Vector2D::new(50.5, 50.0);
        let mut a = launched(old_position_a.x, old_position_a.y, 10.0, 0.0);
        let mut b = launched(old_position_b.x, old_position_b.y, -7.0, 0.0);
        let (old_velocity_a, old_velocity_b) = (a.velocity, b.velocity);

        assert!(a.collide(&mut b, &mut rng));

        assert!(!near_equal(a.position.x, old_position_a.x));
        assert!(near_equal(a.position.y, old_position_a.y));
        assert!(near_equal(a.velocity.x, old_velocity_b.x));
        assert!(near_equal(a.velocity.y, old_velocity_b.y));
        assert!(!near_equal(b.position.x, old_position_b.x));
        assert!(near_equal(b.position.y, old_position_b.y));
        assert!(near_equal(b.velocity.x, old_velocity_a.x));
        assert!(near_equal(b.velocity.y, old_velocity_a.y));
    }

    #[test]
    fn collision_is_symmetric() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut a1 = launched(40.0, 30.0, 4.0, 2.0);
        let mut b1 = launched(41.2, 30.9, -3.0, 1.0);
        let mut a2 = a1.clone();
        let mut b2 = b1.clone();

        a1.collide(&mut b1, &mut rng);
        b2.collide(&mut a2, &mut rng);

        assert!(near_equal(a1.velocity.x, a2.velocity.x));
        assert!(near_equal(a1.velocity.y, a2.velocity.y));
        assert!(near_equal(b1.velocity.x, b2.velocity.x));
        assert!(near_equal(b1.velocity.y, b2.velocity.y));
        assert!(near_equal(a1.position.x, a2.position.x));
        assert!(near_equal(b1.position.y, b2.position.y));
    }

    #[test]
    fn resolve_collision_exchanges_velocities_along_normal() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut a = launched(50.0, 50.0, 10.0, 0.0);
        let mut b = launched(50.5, 50.0, 0.0, 0.0);

        assert!(resolve_collision(&mut a, &mut b, &mut rng));
        assert!(near_equal(a.velocity.x, 0.0));
        assert!(near_equal(b.velocity.x, 0.7));
        // Only the moving ball carries a direction to be pushed along
        assert!(near_equal(b.position.x, 50.5 + 0.751));

        let mut far = launched(80.0, 50.0, 0.0, 0.0);
        assert!(!resolve_collision(&mut a, &mut far, &mut rng));
    }

    #[test]
    fn collision_conserves_momentum() {
        let mut rng = StdRng::seed_from_u64(99);
        for _ in 0..200 {
            let a_pos = Vector2D::new(rng.random_range(40.0..60.0), rng.random_range(20.0..40.0));
            let offset = Vector2D::new(rng.random_range(-1.4..1.4), rng.random_range(-1.4..1.4));
            let mut a = Ball::new(
                a_pos,
                Vector2D::new(rng.random_range(-2.0..2.0), rng.random_range(-2.0..2.0)),
                1.0,
                &dimensions(),
            )
            .unwrap();
            let mut b = Ball::new(
                a_pos + offset,
                Vector2D::new(rng.random_range(-2.0..2.0), rng.random_range(-2.0..2.0)),
                1.0,
                &dimensions(),
            )
            .unwrap();
            let before = a.velocity + b.velocity;

            a.collide(&mut b, &mut rng);

            let after = a.velocity + b.velocity;
            assert!(near_equal(before.x, after.x));
            assert!(near_equal(before.y, after.y));
            assert!(!a.position.is_undefined() && !b.position.is_undefined());
        }
    }

    #[test]
    fn coincident_still_balls_are_separated_and_stay_still() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut a = Ball::new(Vector2D::new(30.0, 30.0), Vector2D::zero(), 1.0, &dimensions()).unwrap();
        let mut b = a.clone();

        assert!(a.collide(&mut b, &mut rng));

        assert!(a.velocity.is_zero());
        assert!(b.velocity.is_zero());
        // Pushed in opposite directions by half the overlap plus epsilon each
        assert!(near_equal(a.position.distance(b.position), 2.0 * (1.0 + SEPARATION_EPSILON)));
        assert!(a.position.distance(b.position) > a.radius() + b.radius());
    }

    #[test]
    fn coincident_centers_skip_exchange() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut a = Ball::new(Vector2D::new(30.0, 30.0), Vector2D::new(1.0, 0.0), 1.0, &dimensions()).unwrap();
        let mut b = Ball::new(Vector2D::new(30.0, 30.0), Vector2D::zero(), 1.0, &dimensions()).unwrap();

        assert!(a.collide(&mut b, &mut rng));

        assert_eq!(a.velocity, Vector2D::new(1.0, 0.0));
        assert!(b.velocity.is_zero());
        assert!(near_equal(a.position.x, 31.001));
        assert_eq!(b.position, Vector2D::new(30.0, 30.0));
    }

    #[test]
    fn grounded_ball_locks_at_rest() {
        let props = MovementProperties::default();
        let dims = dimensions();
        let bottom = dims.height - 1.0;
        let mut ball = Ball::new(Vector2D::new(50.0, bottom), Vector2D::new(0.005, 0.0), 1.0, &dims).unwrap();
        assert!(ball.velocity.is_near_zero());
        assert!(!ball.velocity.is_zero());

        ball.advance(&props);

        assert_eq!(ball.velocity.y, 0.0);
        assert!(ball.velocity.is_zero());
        assert_eq!(ball.position.y, bottom);
        assert!(ball.is_resting());
    }

    #[test]
    fn falling_ball_gains_gravity() {
        let props = MovementProperties::default();
        let mut ball = Ball::new(Vector2D::new(50.0, 30.0), Vector2D::new(0.0, 0.5), 1.0, &dimensions()).unwrap();

        ball.advance(&props);

        assert!(near_equal(ball.position.y, 30.5));
        assert!(near_equal(ball.velocity.y, 0.5 * props.air_resistance + props.gravity));
        assert_eq!(ball.velocity.x, 0.0);
    }

    #[test]
    fn side_wall_reflects_without_loss() {
        let props = MovementProperties::default();
        let mut ball = Ball::new(Vector2D::new(98.5, 30.0), Vector2D::new(1.0, 0.0), 1.0, &dimensions()).unwrap();

        ball.advance(&props);

        assert_eq!(ball.position.x, 99.0);
        assert!(near_equal(ball.velocity.x, -props.air_resistance));
    }

    #[test]
    fn floor_impact_damps_and_reflects() {
        let props = MovementProperties::default();
        let dims = dimensions();
        let bottom = dims.height - 1.0;
        let mut ball = Ball::new(Vector2D::new(50.0, bottom - 0.5), Vector2D::new(1.0, 2.0), 1.0, &dims).unwrap();

        ball.advance(&props);

        assert_eq!(ball.position.y, bottom);
        let expected_y = -2.0 * props.hit_resistance * props.air_resistance + props.gravity;
        assert!(near_equal(ball.velocity.y, expected_y));
        assert!(near_equal(ball.velocity.x, props.rolling_resistance * props.air_resistance));
    }

    #[test]
    fn ceiling_reflects_without_floor_damping() {
        let props = MovementProperties::default();
        let mut ball = Ball::new(Vector2D::new(50.0, 1.2), Vector2D::new(0.0, -1.0), 1.0, &dimensions()).unwrap();

        ball.advance(&props);

        assert_eq!(ball.position.y, 1.0);
        assert!(near_equal(ball.velocity.y, props.air_resistance + props.gravity));
    }

    #[test]
    fn random_states_stay_contained() {
        let props = MovementProperties::default();
        let dims = dimensions();
        let mut rng = StdRng::seed_from_u64(2024);
        for _ in 0..500 {
            let radius = rng.random_range(0.5..5.0);
            let bounds = BorderBounds::new(radius, &dims);
            let position = Vector2D::new(
                rng.random_range(bounds.left..=bounds.right),
                rng.random_range(bounds.top..=bounds.bottom),
            );
            let velocity = Vector2D::new(rng.random_range(-20.0..20.0), rng.random_range(-20.0..20.0));
            let mut ball = Ball::new(position, velocity, radius, &dims).unwrap();
            for _ in 0..50 {
                ball.advance(&props);
                assert!(ball.bounds().contains(ball.position), "escaped: {:?}", ball);
            }
        }
    }

    #[test]
    fn dropped_ball_settles_on_the_floor() {
        let props = MovementProperties::default();
        let dims = dimensions();
        let mut ball = Ball::new(Vector2D::new(50.0, 10.0), Vector2D::zero(), 1.5, &dims).unwrap();
        let initial_energy = ball.kinetic_energy() + props.gravity * (ball.bounds().bottom - ball.position.y);

        for _ in 0..3000 {
            ball.advance(&props);
        }

        assert!(ball.is_grounded());
        assert_eq!(ball.position.x, 50.0);
        assert!(ball.kinetic_energy() < initial_energy);
        let settled = ball.position;
        ball.advance(&props);
        assert_eq!(ball.position, settled);
    }
}
