//! Value types shared by the resolver and the adapters.

use serde::{Deserialize, Serialize};

/// An axis-aligned rectangle with a fixed size and a movable center.
///
/// `length` is the extent along X, `width` the extent along Y. The name is
/// carried for reporting only.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Workstation {
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub length: f64,
    pub width: f64,
}

impl Workstation {
    pub fn new(name: impl Into<String>, x: f64, y: f64, length: f64, width: f64) -> Self {
        Self {
            name: name.into(),
            x,
            y,
            length,
            width,
        }
    }

    /// Strict AABB intersection: the projections overlap on both axes.
    /// Rectangles that merely touch do not overlap.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        (self.x - other.x).abs() < (self.length + other.length) / 2.0
            && (self.y - other.y).abs() < (self.width + other.width) / 2.0
    }

    /// Whether the rectangle lies entirely on the floor.
    #[must_use]
    pub fn fits(&self, floor: &Floor) -> bool {
        let (hl, hw) = (self.length / 2.0, self.width / 2.0);
        hl <= self.x && self.x <= floor.width - hl && hw <= self.y && self.y <= floor.height - hw
    }

    /// Pull the center back onto the floor.
    ///
    /// `max` then `min`, so an oversize rectangle ends up pinned to the far edge
    /// rather than panicking the way `f64::clamp` would.
    pub fn clamp_to(&mut self, floor: &Floor) {
        let (hl, hw) = (self.length / 2.0, self.width / 2.0);
        self.x = self.x.max(hl).min(floor.width - hl);
        self.y = self.y.max(hw).min(floor.height - hw);
    }

    #[must_use]
    pub fn placement(&self) -> Placement {
        Placement {
            name: self.name.clone(),
            x: self.x,
            y: self.y,
        }
    }
}

/// The floor: a rectangle with corners at (0, 0) and (width, height).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Floor {
    pub width: f64,
    pub height: f64,
}

impl Floor {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

impl Default for Floor {
    fn default() -> Self {
        Self::new(15_885.22, 8_935.76)
    }
}

/// Resolved center of one workstation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub name: String,
    pub x: f64,
    pub y: f64,
}
