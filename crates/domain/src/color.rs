//! Color points in CIE xy space, as the bridge consumes them.

use serde::{Deserialize, Serialize};

/// A chromaticity coordinate in CIE 1931 xy space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorPoint {
    pub x: f64,
    pub y: f64,
}

impl ColorPoint {
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// The xy pair in the array form the bridge API expects.
    #[must_use]
    pub fn as_xy(self) -> [f64; 2] {
        [self.x, self.y]
    }
}

/// Neutral daylight white.
pub const DAYLIGHT: ColorPoint = ColorPoint::new(0.4506, 0.4081);

/// Warm early-evening white.
pub const SUNSET: ColorPoint = ColorPoint::new(0.4904, 0.4075);

/// Deep warm late-evening white.
pub const DUSK: ColorPoint = ColorPoint::new(0.5304, 0.4068);
