use rand::Rng;
use serde::{Deserialize, Serialize};
use std::ops::{Add, Div, Mul, Neg, Sub};

use crate::viewport::Viewport;

/// Length below which a velocity counts as "at rest".
/// Tied to the 60 fps velocity scale; re-derive together with the movement constants.
pub const NEAR_ZERO: f64 = 0.01;

/// A simple 2D vector value type. Every operation returns a new vector.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vector2D {
    pub x: f64,
    pub y: f64,
}

impl Vector2D {
    /// Sentinel meaning "no vector yet". Distinct from the zero vector.
    /// Never feed it into arithmetic; only inspect it with `is_undefined`.
    pub const UNDEFINED: Vector2D = Vector2D { x: f64::NAN, y: f64::NAN };

    /// Creates a new Vector2D.
    pub fn new(x: f64, y: f64) -> Self {
        Vector2D { x, y }
    }

    /// Creates a zero vector.
    pub fn zero() -> Self {
        Vector2D { x: 0.0, y: 0.0 }
    }

    /// Componentwise uniform vector in [0, 1).
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Vector2D { x: rng.random::<f64>(), y: rng.random::<f64>() }
    }

    /// Calculates the squared length (magnitude) of the vector.
    pub fn length_squared(&self) -> f64 {
        self.x * self.x + self.y * self.y
    }

    /// Calculates the length (magnitude) of the vector.
    pub fn length(&self) -> f64 {
        self.length_squared().sqrt()
    }

    /// Calculates the distance to another vector (point).
    pub fn distance(&self, other: Vector2D) -> f64 {
        (*self - other).length()
    }

    /// Angle of the vector as `atan2(x, y)`.
    ///
    /// Note the argument order: this is measured from the +Y axis, not the
    /// usual `atan2(y, x)`. Parallel vectors with the same orientation always
    /// share the same angle.
    pub fn angle(&self) -> f64 {
        self.x.atan2(self.y)
    }

    /// Returns the unit vector in the same direction, or the zero vector if
    /// the length is exactly zero. Never returns NaN for finite input.
    pub fn try_normalize(&self) -> Self {
        let length = self.length();
        if length == 0.0 {
            Vector2D::zero()
        } else {
            *self / length
        }
    }

    /// Calculates the dot product with another vector.
    pub fn dot(&self, other: Vector2D) -> f64 {
        self.x * other.x + self.y * other.y
    }

    /// Scales the vector by a scalar value. Same as `self * factor`.
    pub fn mult(&self, factor: f64) -> Self {
        *self * factor
    }

    /// Negated vector. Same as `-self`.
    pub fn opposite(&self) -> Self {
        -*self
    }

    /// Vector pointing from this point to `target`.
    pub fn direction(&self, target: Vector2D) -> Self {
        target - *self
    }

    /// Exact componentwise comparison with zero (no epsilon).
    pub fn is_zero(&self) -> bool {
        self.x == 0.0 && self.y == 0.0
    }

    /// `length() < NEAR_ZERO`.
    pub fn is_near_zero(&self) -> bool {
        self.is_near_zero_by(NEAR_ZERO)
    }

    /// `length() < tolerance`, for a configured rest tolerance.
    pub fn is_near_zero_by(&self, tolerance: f64) -> bool {
        self.length() < tolerance
    }

    /// True if either component is unset (the `UNDEFINED` sentinel).
    pub fn is_undefined(&self) -> bool {
        self.x.is_nan() || self.y.is_nan()
    }

    /// Maps a device-space point into simulation-local units:
    /// subtract the viewport offset, then divide by the scale ratio.
    pub fn convert_to_local(&self, viewport: &Viewport) -> Self {
        Vector2D::new(self.x - viewport.left, self.y - viewport.top) / viewport.scale_ratio
    }
}

impl Default for Vector2D {
    fn default() -> Self {
        Vector2D::zero()
    }
}

// Standard operators for convenience
impl Add for Vector2D {
    type Output = Self;
    fn add(self, other: Self) -> Self {
        Self { x: self.x + other.x, y: self.y + other.y }
    }
}

impl Sub for Vector2D {
    type Output = Self;
    fn sub(self, other: Self) -> Self {
        Self { x: self.x - other.x, y: self.y - other.y }
    }
}

impl Mul<f64> for Vector2D {
    type Output = Self;
    fn mul(self, scalar: f64) -> Self {
        Self { x: self.x * scalar, y: self.y * scalar }
    }
}

impl Div<f64> for Vector2D {
    type Output = Self;
    fn div(self, scalar: f64) -> Self {
        Self { x: self.x / scalar, y: self.y / scalar }
    }
}

impl Neg for Vector2D {
    type Output = Self;
    fn neg(self) -> Self {
        Self { x: -self.x, y: -self.y }
    }
}

impl From<[f64; 2]> for Vector2D {
    fn from(v: [f64; 2]) -> Self {
        Vector2D::new(v[0], v[1])
    }
}

/// Clamps a value between a minimum and maximum.
pub fn clamp(value: f64, min: f64, max: f64) -> f64 {
    value.max(min).min(max)
}
