//! World coordinates and the tile distance metric

use serde::{Deserialize, Serialize};
use std::fmt;

/// A tile in the game world
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct WorldPoint {
    pub x: i32,
    pub y: i32,
    #[serde(default)]
    pub plane: i32,
}

impl WorldPoint {
    pub const fn new(x: i32, y: i32, plane: i32) -> Self {
        Self { x, y, plane }
    }

    /// Tile (Chebyshev) distance to `other`.
    ///
    /// Points on different planes are unreachable from each other and report
    /// `u32::MAX`, so they never pass a distance bound and sort last.
    pub fn distance_to(&self, other: &WorldPoint) -> u32 {
        if self.plane != other.plane {
            return u32::MAX;
        }
        let dx = self.x.abs_diff(other.x);
        let dy = self.y.abs_diff(other.y);
        dx.max(dy)
    }

    pub fn same_plane(&self, other: &WorldPoint) -> bool {
        self.plane == other.plane
    }

    pub fn plane_difference(&self, other: &WorldPoint) -> u32 {
        self.plane.abs_diff(other.plane)
    }

    /// False across planes, whatever `max_distance` is
    pub fn is_within_distance(&self, other: &WorldPoint, max_distance: u32) -> bool {
        self.same_plane(other) && self.distance_to(other) <= max_distance
    }
}

impl fmt::Display for WorldPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.plane)
    }
}
