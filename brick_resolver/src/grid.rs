// Grid and dimension normalizer.
//
// Runs once, eagerly, on every proposed placement before any ordering or
// overlap logic. It forces the proposal onto the stud lattice:
//
// - Yaw snaps to {0, 90, 180, 270}; pitch and roll are discarded.
// - Width and length round to whole studs in `[1, max_dimension]`.
// - Height comes from the injected `HeightLookup`, rounded to whole levels
//   and capped at `max_dimension` studs.
//   Whatever height the generator declared is ignored.
// - Quarter-turn yaw swaps the footprint's X and Z extents.
// - X/Z centres snap per axis: an even extent straddles a grid line, so the
//   centre lands on a .5; an odd extent centres on a stud, so it lands on an
//   integer.
// - Y snaps to the nearest level and is clamped to the ground.
//
// Nothing is ever rejected. Non-finite numbers become 0 (or 1 for
// dimensions), coordinates are clamped to `max_coordinate`, and every
// adjustment beyond `snap_tolerance` is reported as a `ClampWarning`.
//
// Rounding is round-half-up (`floor(v + 0.5)`), not Rust's round-half-away-
// from-zero, so that -0.5 snaps the same way as 0.5 does: towards +inf.
//
// The result is a `GridPlacement`: integer half-stud centres and integer
// levels, the representation `geometry.rs` and `resolver.rs` work in.

use crate::config::ResolverConfig;
use crate::geometry::BoundingBox;
use crate::heights::HeightLookup;
use crate::report::{ClampKind, ClampWarning, fmt_studs};
use crate::types::{BrickSize, Placement, Vec3, Yaw};

/// Round half towards positive infinity.
pub fn round_half_up(value: f64) -> f64 {
    (value + 0.5).floor()
}

/// Snap a horizontal centre coordinate for a footprint `dimension` studs
/// wide along that axis.
pub fn snap_axis(value: f64, dimension: u32) -> f64 {
    if dimension % 2 == 0 {
        round_half_up(value - 0.5) + 0.5
    } else {
        round_half_up(value)
    }
}

/// Snap a bottom height to the nearest non-negative multiple of
/// `vertical_unit`.
pub fn snap_vertical(value: f64, vertical_unit: f64) -> f64 {
    level_to_studs(snap_level(value, vertical_unit), vertical_unit)
}

/// Coordinate in studs to half-studs. Exact for snapped values.
pub fn half_studs(value: f64) -> i64 {
    round_half_up(value * 2.0) as i64
}

/// False for NaN on either side.
fn within(a: f64, b: f64, tol: f64) -> bool {
    (a - b).abs() <= tol
}

/// Nearest level at or above the ground.
fn snap_level(value: f64, vertical_unit: f64) -> i64 {
    (round_half_up(value / vertical_unit) as i64).max(0)
}

/// Levels back to studs, with float noise from the multiplication trimmed
/// (3 * 0.4 is 1.2000000000000002 otherwise).
pub fn level_to_studs(level: i64, vertical_unit: f64) -> f64 {
    (level as f64 * vertical_unit * 1e9).round() / 1e9
}

// ---------------------------------------------------------------------------
// Normalized placement
// ---------------------------------------------------------------------------

/// A placement after normalization, on the integer lattice.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GridPlacement {
    /// Index into the resolver's input slice.
    pub input_index: usize,
    pub yaw: Yaw,
    /// Declared (unrotated) width along X, in studs.
    pub width: u32,
    /// Declared (unrotated) length along Z, in studs.
    pub length: u32,
    pub height_levels: i64,
    /// Footprint centre, in half-studs.
    pub center_x2: i64,
    pub center_z2: i64,
    /// Bottom, in levels.
    pub level: i64,
}

impl GridPlacement {
    /// Effective (width along X, length along Z) after rotation.
    pub fn footprint(&self) -> (u32, u32) {
        if self.yaw.swaps_footprint() {
            (self.length, self.width)
        } else {
            (self.width, self.length)
        }
    }

    pub fn bounding_box(&self) -> BoundingBox {
        let (fw, fl) = self.footprint();
        BoundingBox::new(
            self.center_x2,
            self.center_z2,
            fw,
            fl,
            self.level,
            self.height_levels,
        )
    }

    /// Materialize back into a wire `Placement`, carrying the source's
    /// descriptive fields through unchanged.
    pub fn to_placement(&self, source: &Placement, step_id: u32, vertical_unit: f64) -> Placement {
        Placement {
            step_id,
            position: Vec3::new(
                self.center_x2 as f64 / 2.0,
                level_to_studs(self.level, vertical_unit),
                self.center_z2 as f64 / 2.0,
            ),
            rotation: Vec3::new(0.0, self.yaw.degrees(), 0.0),
            size: BrickSize::new(
                f64::from(self.width),
                level_to_studs(self.height_levels, vertical_unit),
                f64::from(self.length),
            ),
            ..source.clone()
        }
    }
}

/// Normalize one proposed placement, appending a `ClampWarning` for every
/// adjustment that moved a value by more than `config.snap_tolerance`.
///
/// `config` is expected to be sanitized (see `ResolverConfig::sanitized`).
pub fn normalize_placement<H: HeightLookup + ?Sized>(
    input_index: usize,
    placement: &Placement,
    heights: &H,
    config: &ResolverConfig,
    warnings: &mut Vec<ClampWarning>,
) -> GridPlacement {
    let tol = config.snap_tolerance;
    let unit = config.vertical_unit;
    let mut warn = |kind: ClampKind, detail: String| {
        warnings.push(ClampWarning {
            step_id: placement.step_id,
            part_name: placement.display_name(),
            kind,
            detail,
        });
    };

    // Rotation.
    let raw_yaw = placement.rotation.y;
    let yaw = Yaw::from_degrees(raw_yaw);
    if !raw_yaw.is_finite() {
        warn(ClampKind::NonFiniteValue, format!("rotation.y was {raw_yaw}, using 0"));
    } else if (raw_yaw - yaw.degrees()).abs() > tol {
        warn(
            ClampKind::RotationSnapped,
            format!("yaw {} snapped to {}", fmt_studs(raw_yaw), yaw.degrees()),
        );
    }
    let (pitch, roll) = (placement.rotation.x, placement.rotation.z);
    if !(within(pitch, 0.0, tol) && within(roll, 0.0, tol)) {
        warn(
            ClampKind::TiltDiscarded,
            format!("rotation x={pitch}, z={roll} discarded"),
        );
    }

    // Dimensions.
    let width = clamp_dimension("width", placement.size.width, config, &mut warn);
    let length = clamp_dimension("length", placement.size.length, config, &mut warn);

    let looked_up = heights.height_of(&placement.shape, &placement.brick_type);
    let max_height = f64::from(config.max_dimension);
    let looked_up = if looked_up > max_height {
        warn(
            ClampKind::DimensionClamped,
            format!(
                "height {looked_up} for {} {} clamped to {max_height}",
                placement.shape, placement.brick_type
            ),
        );
        max_height
    } else {
        looked_up
    };
    let height_levels = if looked_up.is_finite() && looked_up > 0.0 {
        (round_half_up(looked_up / unit) as i64).max(1)
    } else {
        1
    };
    let height = level_to_studs(height_levels, unit);
    let declared_height = placement.size.height;
    // A missing (zero) height is not worth a warning; anything else is.
    if declared_height != 0.0 && !within(declared_height, height, tol) {
        warn(
            ClampKind::HeightOverridden,
            format!(
                "declared height {declared_height} replaced by {} for {} {}",
                fmt_studs(height),
                placement.shape,
                placement.brick_type
            ),
        );
    }

    // Position.
    let raw = placement.position;
    let x = finite_coordinate("position.x", raw.x, config, &mut warn);
    let y = finite_coordinate("position.y", raw.y, config, &mut warn);
    let z = finite_coordinate("position.z", raw.z, config, &mut warn);

    let grid = GridPlacement {
        input_index,
        yaw,
        width,
        length,
        height_levels,
        center_x2: 0,
        center_z2: 0,
        level: snap_level(y, unit),
    };
    let (fw, fl) = grid.footprint();
    let snapped_x = snap_axis(x, fw);
    let snapped_z = snap_axis(z, fl);
    let snapped_y = level_to_studs(grid.level, unit);

    if (snapped_x - x).abs() > tol || (snapped_y - y).abs() > tol || (snapped_z - z).abs() > tol
    {
        warn(
            ClampKind::PositionSnapped,
            format!(
                "({}, {}, {}) snapped to ({}, {}, {})",
                fmt_studs(x),
                fmt_studs(y),
                fmt_studs(z),
                fmt_studs(snapped_x),
                fmt_studs(snapped_y),
                fmt_studs(snapped_z)
            ),
        );
    }

    GridPlacement {
        center_x2: half_studs(snapped_x),
        center_z2: half_studs(snapped_z),
        ..grid
    }
}

fn clamp_dimension(
    name: &str,
    raw: f64,
    config: &ResolverConfig,
    warn: &mut impl FnMut(ClampKind, String),
) -> u32 {
    let max = f64::from(config.max_dimension);
    let clamped = if raw.is_finite() {
        round_half_up(raw).clamp(1.0, max)
    } else {
        1.0
    };
    if !within(clamped, raw, config.snap_tolerance) {
        warn(
            ClampKind::DimensionClamped,
            format!("{name} {raw} clamped to {clamped}"),
        );
    }
    clamped as u32
}

fn finite_coordinate(
    name: &str,
    raw: f64,
    config: &ResolverConfig,
    warn: &mut impl FnMut(ClampKind, String),
) -> f64 {
    if !raw.is_finite() {
        warn(ClampKind::NonFiniteValue, format!("{name} was {raw}, using 0"));
        return 0.0;
    }
    let limit = config.max_coordinate;
    if raw.abs() > limit {
        let clamped = raw.clamp(-limit, limit);
        warn(
            ClampKind::CoordinateClamped,
            format!("{name} {raw} clamped to {clamped}"),
        );
        return clamped;
    }
    raw
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heights::HeightTable;

    fn normalize(p: &Placement) -> (GridPlacement, Vec<ClampWarning>) {
        let mut warnings = Vec::new();
        let g = normalize_placement(
            0,
            p,
            &HeightTable::default(),
            &ResolverConfig::default(),
            &mut warnings,
        );
        (g, warnings)
    }

    fn kinds(warnings: &[ClampWarning]) -> Vec<ClampKind> {
        warnings.iter().map(|w| w.kind).collect()
    }

    #[test]
    fn round_half_up_goes_towards_positive_infinity() {
        assert_eq!(round_half_up(0.5), 1.0);
        assert_eq!(round_half_up(-0.5), 0.0);
        assert_eq!(round_half_up(-1.5), -1.0);
        assert_eq!(round_half_up(2.49), 2.0);
    }

    #[test]
    fn even_axis_snaps_to_half_studs() {
        assert_eq!(snap_axis(0.0, 2), 0.5);
        assert_eq!(snap_axis(0.4, 2), 0.5);
        assert_eq!(snap_axis(1.1, 4), 1.5);
        assert_eq!(snap_axis(-0.2, 2), -0.5);
    }

    #[test]
    fn odd_axis_snaps_to_integers() {
        assert_eq!(snap_axis(0.73, 1), 1.0);
        assert_eq!(snap_axis(0.5, 3), 1.0);
        assert_eq!(snap_axis(-0.49, 1), 0.0);
    }

    #[test]
    fn vertical_snap_is_nearest_level_and_non_negative() {
        assert_eq!(snap_vertical(0.55, 0.4), 0.4);
        assert_eq!(snap_vertical(1.0, 0.4), 1.2);
        assert_eq!(snap_vertical(-3.0, 0.4), 0.0);
        assert_eq!(snap_vertical(1.2, 0.4), 1.2);
    }

    #[test]
    fn off_grid_one_by_one() {
        let p = Placement::new(1, "square", "brick", Vec3::new(0.73, 0.55, 0.0), 1.0, 1.0);
        let (g, warnings) = normalize(&p);
        let out = g.to_placement(&p, 1, 0.4);
        assert_eq!(out.position, Vec3::new(1.0, 0.4, 0.0));
        assert_eq!(out.size.height, 1.2);
        assert_eq!(kinds(&warnings), vec![ClampKind::PositionSnapped]);
    }

    #[test]
    fn rotated_footprint_swaps_axes() {
        let p = Placement::new(1, "rectangle", "brick", Vec3::new(0.2, 0.0, 0.2), 1.0, 4.0)
            .with_yaw(95.0);
        let (g, warnings) = normalize(&p);
        assert_eq!(g.yaw, Yaw::Deg90);
        assert_eq!(g.footprint(), (4, 1));
        let out = g.to_placement(&p, 1, 0.4);
        // X now spans 4 studs (even) -> .5 centre; Z spans 1 (odd) -> integer.
        assert_eq!(out.position.x, 0.5);
        assert_eq!(out.position.z, 0.0);
        assert_eq!(out.rotation, Vec3::new(0.0, 90.0, 0.0));
        // Declared size is kept; the rotation carries the swap.
        assert_eq!((out.size.width, out.size.length), (1.0, 4.0));
        assert!(kinds(&warnings).contains(&ClampKind::RotationSnapped));
    }

    #[test]
    fn tilt_is_discarded() {
        let mut p = Placement::new(1, "square", "plate", Vec3::ZERO, 1.0, 1.0);
        p.rotation = Vec3::new(15.0, 0.0, -5.0);
        let (g, warnings) = normalize(&p);
        let out = g.to_placement(&p, 1, 0.4);
        assert_eq!(out.rotation, Vec3::ZERO);
        assert_eq!(kinds(&warnings), vec![ClampKind::TiltDiscarded]);
    }

    #[test]
    fn degenerate_dimensions_clamp_to_one() {
        let p = Placement::new(1, "square", "brick", Vec3::ZERO, 0.0, -3.0);
        let (g, warnings) = normalize(&p);
        assert_eq!((g.width, g.length), (1, 1));
        assert_eq!(
            kinds(&warnings),
            vec![ClampKind::DimensionClamped, ClampKind::DimensionClamped]
        );
    }

    #[test]
    fn oversized_dimensions_clamp_to_max() {
        let p = Placement::new(1, "rectangle", "plate", Vec3::new(0.5, 0.0, 0.5), 500.0, 2.0);
        let (g, _) = normalize(&p);
        assert_eq!(g.width, ResolverConfig::default().max_dimension);
    }

    #[test]
    fn fractional_dimensions_round() {
        let p = Placement::new(1, "rectangle", "brick", Vec3::new(0.5, 0.0, 1.5), 2.4, 3.6);
        let (g, _) = normalize(&p);
        assert_eq!((g.width, g.length), (2, 4));
    }

    #[test]
    fn declared_height_is_overridden() {
        let mut p = Placement::new(1, "square", "plate", Vec3::ZERO, 1.0, 1.0);
        p.size.height = 3.0;
        let (g, warnings) = normalize(&p);
        assert_eq!(g.height_levels, 1);
        assert_eq!(kinds(&warnings), vec![ClampKind::HeightOverridden]);
    }

    #[test]
    fn bad_lookup_height_becomes_one_level() {
        let p = Placement::new(1, "square", "brick", Vec3::ZERO, 1.0, 1.0);
        let mut warnings = Vec::new();
        let nan_heights = |_: &str, _: &str| f64::NAN;
        let g = normalize_placement(0, &p, &nan_heights, &ResolverConfig::default(), &mut warnings);
        assert_eq!(g.height_levels, 1);
    }

    #[test]
    fn huge_lookup_height_is_capped() {
        let p = Placement::new(1, "square", "brick", Vec3::new(0.0, 0.4, 0.0), 1.0, 1.0);
        let config = ResolverConfig::default();
        for huge in [1e300, f64::INFINITY] {
            let mut warnings = Vec::new();
            let tall = |_: &str, _: &str| huge;
            let g = normalize_placement(0, &p, &tall, &config, &mut warnings);
            // 64 studs at 0.4 per level.
            assert_eq!(g.height_levels, 160);
            assert!(kinds(&warnings).contains(&ClampKind::DimensionClamped));
        }
    }

    #[test]
    fn non_finite_position_becomes_origin() {
        let p = Placement::new(
            1,
            "square",
            "brick",
            Vec3::new(f64::NAN, f64::INFINITY, 2.0),
            1.0,
            1.0,
        );
        let (g, warnings) = normalize(&p);
        assert_eq!((g.center_x2, g.level, g.center_z2), (0, 0, 4));
        assert_eq!(
            kinds(&warnings),
            vec![ClampKind::NonFiniteValue, ClampKind::NonFiniteValue]
        );
    }

    #[test]
    fn far_coordinates_are_clamped() {
        let p = Placement::new(1, "square", "brick", Vec3::new(1e12, 0.0, 0.0), 1.0, 1.0);
        let (g, warnings) = normalize(&p);
        assert_eq!(g.center_x2, 20_000);
        assert_eq!(kinds(&warnings), vec![ClampKind::CoordinateClamped]);
    }

    #[test]
    fn clean_input_produces_no_warnings() {
        let mut p = Placement::new(1, "rectangle", "brick", Vec3::new(0.5, 1.2, 1.5), 2.0, 4.0);
        p.size.height = 1.2;
        let (_, warnings) = normalize(&p);
        assert!(warnings.is_empty(), "unexpected warnings: {warnings:?}");
    }

    #[test]
    fn descriptive_fields_pass_through() {
        let p = Placement {
            color: Some("Red".into()),
            hex_color: Some("#C91A09".into()),
            part_name: Some("Brick 1 x 1".into()),
            description: Some("chimney".into()),
            ..Placement::new(9, "square", "brick", Vec3::ZERO, 1.0, 1.0)
        };
        let (g, _) = normalize(&p);
        let out = g.to_placement(&p, 3, 0.4);
        assert_eq!(out.step_id, 3);
        assert_eq!(out.color, p.color);
        assert_eq!(out.hex_color, p.hex_color);
        assert_eq!(out.part_name, p.part_name);
        assert_eq!(out.description, p.description);
        assert_eq!(out.shape, "square");
        assert_eq!(out.brick_type, "brick");
    }
}
