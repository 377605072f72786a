// Footprint and overlap geometry on the stud lattice.
//
// Once a placement is grid-snapped, every footprint edge lies on a half-stud
// line: an odd-width brick is centred on an integer and spans +-w/2, an
// even-width brick is centred on a .5 and spans +-w/2. Vertically, every
// bottom and every height is a whole number of levels (vertical units). So a
// `BoundingBox` stores X/Z in half-studs and Y in levels, all `i64`, and
// every predicate here is exact integer arithmetic. There is no epsilon:
// touching faces compare equal, not "almost" overlapping.
//
// Predicates:
// - `xz_overlap_area`: the overlap AREA in square studs (zero if either axis
//   is disjoint or merely touching). Support needs a magnitude threshold.
// - `y_overlaps`: true only for a positive-length shared interval, so a brick
//   resting exactly on another does not collide with it.
// - `collides`: both of the above.
//
// Bounds arithmetic saturates, so a box built from an out-of-range
// placement pins to the `i64` limits rather than overflowing.

use crate::grid::{half_studs, round_half_up};
use crate::types::{Placement, Yaw};

/// Axis-aligned box on the stud lattice. X/Z bounds are in half-studs,
/// Y bounds in levels. Bounds are `[min, max)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BoundingBox {
    pub x_min: i64,
    pub x_max: i64,
    pub z_min: i64,
    pub z_max: i64,
    pub y_min: i64,
    pub y_max: i64,
}

impl BoundingBox {
    /// Box for a footprint centred at (`center_x2`, `center_z2`) half-studs,
    /// with effective (already rotation-swapped) dimensions in studs, resting
    /// at `level` and `height_levels` tall.
    pub fn new(
        center_x2: i64,
        center_z2: i64,
        footprint_width: u32,
        footprint_length: u32,
        level: i64,
        height_levels: i64,
    ) -> Self {
        // Half of w studs is w half-studs.
        let half_w = i64::from(footprint_width);
        let half_l = i64::from(footprint_length);
        Self {
            x_min: center_x2.saturating_sub(half_w),
            x_max: center_x2.saturating_add(half_w),
            z_min: center_z2.saturating_sub(half_l),
            z_max: center_z2.saturating_add(half_l),
            y_min: level,
            y_max: level.saturating_add(height_levels),
        }
    }

    /// Box of an already-resolved placement. Values are rounded onto the
    /// lattice, so this is exact for resolver output and approximate for
    /// anything else.
    pub fn of_placement(placement: &Placement, vertical_unit: f64) -> Self {
        let yaw = Yaw::from_degrees(placement.rotation.y);
        let width = round_dimension(placement.size.width);
        let length = round_dimension(placement.size.length);
        let (fw, fl) = if yaw.swaps_footprint() {
            (length, width)
        } else {
            (width, length)
        };
        let level = round_half_up(placement.position.y / vertical_unit) as i64;
        let height = (round_half_up(placement.size.height / vertical_unit) as i64).max(1);
        Self::new(
            half_studs(placement.position.x),
            half_studs(placement.position.z),
            fw,
            fl,
            level,
            height,
        )
    }

    /// The same footprint moved horizontally by whole half-studs.
    pub fn translated(&self, dx2: i64, dz2: i64) -> Self {
        Self {
            x_min: self.x_min.saturating_add(dx2),
            x_max: self.x_max.saturating_add(dx2),
            z_min: self.z_min.saturating_add(dz2),
            z_max: self.z_max.saturating_add(dz2),
            ..*self
        }
    }

    /// The same footprint moved so its bottom sits at `level`.
    pub fn at_level(&self, level: i64) -> Self {
        Self {
            y_min: level,
            y_max: level.saturating_add(self.y_max.saturating_sub(self.y_min)),
            ..*self
        }
    }

    /// Top face in levels.
    pub fn top(&self) -> i64 {
        self.y_max
    }

    /// Bottom face in levels.
    pub fn bottom(&self) -> i64 {
        self.y_min
    }

    /// Overlap area in square half-studs.
    pub fn xz_overlap_half_units(&self, other: &BoundingBox) -> i64 {
        let dx = self.x_max.min(other.x_max).saturating_sub(self.x_min.max(other.x_min));
        let dz = self.z_max.min(other.z_max).saturating_sub(self.z_min.max(other.z_min));
        if dx <= 0 || dz <= 0 {
            return 0;
        }
        dx.saturating_mul(dz)
    }

    /// Overlap area in square studs.
    pub fn xz_overlap_area(&self, other: &BoundingBox) -> f64 {
        self.xz_overlap_half_units(other) as f64 / 4.0
    }

    pub fn y_overlaps(&self, other: &BoundingBox) -> bool {
        self.y_min < other.y_max && other.y_min < self.y_max
    }

    pub fn collides(&self, other: &BoundingBox) -> bool {
        self.xz_overlap_half_units(other) > 0 && self.y_overlaps(other)
    }

    /// Minimum X in studs.
    pub fn min_x(&self) -> f64 {
        self.x_min as f64 / 2.0
    }

    /// Maximum X in studs.
    pub fn max_x(&self) -> f64 {
        self.x_max as f64 / 2.0
    }

    /// Minimum Z in studs.
    pub fn min_z(&self) -> f64 {
        self.z_min as f64 / 2.0
    }

    /// Maximum Z in studs.
    pub fn max_z(&self) -> f64 {
        self.z_max as f64 / 2.0
    }
}

fn round_dimension(value: f64) -> u32 {
    if !value.is_finite() {
        return 1;
    }
    round_half_up(value).max(1.0) as u32
}
