use log::debug;

use crate::vecmath::Vector2D;
use crate::viewport::{LocalDimensions, Viewport};

/// A completed aim gesture: where the new ball appears and where it is thrown.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Launch {
    pub position: Vector2D,
    /// Aim vector, still in pointer units (the velocity factor is applied by the ball).
    pub direction: Vector2D,
}

/// Turns pointer press / move / release events into launches.
///
/// The first pointer sample fixes the launch position; dragging away from it
/// aims the ball in the opposite direction, like a slingshot. Dragging onto or
/// past any edge of the viewport releases the ball immediately.
#[derive(Debug, Clone)]
pub struct AimTracker {
    viewport: Viewport,
    dimensions: LocalDimensions,
    aiming: bool,
    origin: Vector2D,
    direction: Vector2D,
}

impl AimTracker {
    pub fn new(viewport: Viewport, dimensions: LocalDimensions) -> Self {
        AimTracker {
            viewport,
            dimensions,
            aiming: false,
            origin: Vector2D::UNDEFINED,
            direction: Vector2D::zero(),
        }
    }

    pub fn is_aiming(&self) -> bool {
        self.aiming
    }

    /// Launch position of the pending ball, for drawing it while aiming.
    pub fn preview(&self) -> Option<Vector2D> {
        if self.aiming && !self.origin.is_undefined() {
            Some(self.origin)
        } else {
            None
        }
    }

    /// Starts aiming at a device-space point.
    pub fn press(&mut self, device_point: Vector2D) -> Option<Launch> {
        self.aiming = true;
        self.move_to(device_point)
    }

    /// Updates the aim. Returns a launch if the pointer left the viewport.
    pub fn move_to(&mut self, device_point: Vector2D) -> Option<Launch> {
        if !self.aiming {
            return None;
        }

        let pointer = device_point.convert_to_local(&self.viewport);
        if self.origin.is_undefined() {
            self.origin = pointer;
        }

        if pointer.x <= 0.0
            || pointer.x >= self.dimensions.width
            || pointer.y <= 0.0
            || pointer.y >= self.dimensions.height
        {
            debug!("Pointer left the viewport at ({:.2}, {:.2}), releasing.", pointer.x, pointer.y);
            return self.release();
        }

        self.direction = pointer.direction(self.origin);
        None
    }

    /// Finishes the gesture. `None` if no gesture was in progress.
    pub fn release(&mut self) -> Option<Launch> {
        let was_aiming = self.aiming;
        self.aiming = false;

        let launch = if was_aiming && !self.origin.is_undefined() {
            Some(Launch { position: self.origin, direction: self.direction })
        } else {
            None
        };

        self.direction = Vector2D::zero();
        self.origin = Vector2D::UNDEFINED;
        launch
    }
}
