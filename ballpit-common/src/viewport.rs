use serde::{Deserialize, Serialize};

/// Logical size of the simulation area, in simulation units.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalDimensions {
    pub width: f64,
    pub height: f64,
}

impl LocalDimensions {
    pub fn new(width: f64, height: f64) -> Self {
        LocalDimensions { width, height }
    }
}

impl Default for LocalDimensions {
    /// 100 units wide with a 3:2 aspect ratio.
    fn default() -> Self {
        LocalDimensions { width: 100.0, height: 100.0 * (2.0 / 3.0) }
    }
}

/// Placement of the drawing surface in device space (pixels).
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
    /// Device pixels per simulation unit.
    pub scale_ratio: f64,
}

impl Viewport {
    /// Creates a viewport whose scale ratio maps `local.width` onto `width` pixels.
    pub fn new(left: f64, top: f64, width: f64, height: f64, local: &LocalDimensions) -> Self {
        Viewport {
            left,
            top,
            width,
            height,
            scale_ratio: width / local.width,
        }
    }
}
