// Core plan types shared across the resolver.
//
// Defines the wire-level `Placement` record (one proposed or resolved brick),
// its `Vec3` / `BrickSize` components, and the closed `Yaw` enum that the
// normalizer snaps free-form rotations onto. All wire types derive
// `Serialize` and `Deserialize` with camelCase field names so they match the
// build-plan JSON produced by the generation loop.
//
// Coordinate conventions (stud units):
// - X and Z are the horizontal plane; `position.x` / `position.z` are the
//   footprint CENTRE.
// - Y is up; `position.y` is the BOTTOM of the brick, not its centre.
// - `size.width` runs along X and `size.length` along Z before rotation.
//
// See also: `grid.rs` for how these are snapped, `geometry.rs` for the
// derived bounding boxes.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Spatial types
// ---------------------------------------------------------------------------

/// A 3-component vector, used for both positions and Euler rotations.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub z: f64,
}

impl Vec3 {
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

impl fmt::Display for Vec3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// Brick dimensions. Width and length are in studs; height is in stud
/// units too (a standard brick is 1.2, a plate 0.4).
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BrickSize {
    #[serde(default)]
    pub width: f64,
    #[serde(default)]
    pub height: f64,
    #[serde(default)]
    pub length: f64,
}

impl BrickSize {
    pub const fn new(width: f64, height: f64, length: f64) -> Self {
        Self {
            width,
            height,
            length,
        }
    }
}

/// Yaw rotation snapped to the four stud-grid orientations.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Yaw {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Yaw {
    pub const ALL: [Yaw; 4] = [Yaw::Deg0, Yaw::Deg90, Yaw::Deg180, Yaw::Deg270];

    /// Snap an arbitrary yaw in degrees. Buckets are half-open:
    /// [315, 45) -> 0, [45, 135) -> 90, [135, 225) -> 180, [225, 315) -> 270.
    /// Negative and >= 360 values wrap first; non-finite values map to 0.
    pub fn from_degrees(degrees: f64) -> Self {
        if !degrees.is_finite() {
            return Yaw::Deg0;
        }
        let d = degrees.rem_euclid(360.0);
        if d < 45.0 {
            Yaw::Deg0
        } else if d < 135.0 {
            Yaw::Deg90
        } else if d < 225.0 {
            Yaw::Deg180
        } else if d < 315.0 {
            Yaw::Deg270
        } else {
            Yaw::Deg0
        }
    }

    pub fn degrees(self) -> f64 {
        match self {
            Yaw::Deg0 => 0.0,
            Yaw::Deg90 => 90.0,
            Yaw::Deg180 => 180.0,
            Yaw::Deg270 => 270.0,
        }
    }

    /// Quarter turns exchange which dimension faces X and which faces Z.
    pub fn swaps_footprint(self) -> bool {
        matches!(self, Yaw::Deg90 | Yaw::Deg270)
    }
}

// ---------------------------------------------------------------------------
// Placement
// ---------------------------------------------------------------------------

/// One brick in a build plan, either as proposed by the generator or as
/// emitted by the resolver.
///
/// `shape` and `brick_type` are opaque to the resolver apart from keying the
/// height lookup. The optional descriptive fields are carried through
/// untouched.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Placement {
    #[serde(default)]
    pub step_id: u32,
    #[serde(default)]
    pub shape: String,
    #[serde(rename = "type", default)]
    pub brick_type: String,
    #[serde(default)]
    pub position: Vec3,
    #[serde(default)]
    pub rotation: Vec3,
    #[serde(default)]
    pub size: BrickSize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hex_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub part_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Placement {
    /// Convenience constructor for an unrotated brick with no descriptive
    /// fields. Height is left at 0; the resolver fills it in.
    pub fn new(
        step_id: u32,
        shape: impl Into<String>,
        brick_type: impl Into<String>,
        position: Vec3,
        width: f64,
        length: f64,
    ) -> Self {
        Self {
            step_id,
            shape: shape.into(),
            brick_type: brick_type.into(),
            position,
            rotation: Vec3::ZERO,
            size: BrickSize::new(width, 0.0, length),
            ..Self::default()
        }
    }

    /// Builder-style yaw override, in degrees.
    pub fn with_yaw(mut self, degrees: f64) -> Self {
        self.rotation.y = degrees;
        self
    }

    /// Human-readable label for reports: the explicit part name when the
    /// generator supplied one, otherwise "<type> <shape> WxL".
    pub fn display_name(&self) -> String {
        match &self.part_name {
            Some(name) if !name.is_empty() => name.clone(),
            _ => format!(
                "{} {} {}x{}",
                self.brick_type, self.shape, self.size.width, self.size.length
            ),
        }
    }
}
