// Build-plan physics resolver.
//
// Repairs a generated build plan into a physically valid one and reports
// every change. The pipeline, per call:
//
// 1. Normalize every proposal onto the stud lattice (`grid.rs`).
// 2. Stable-sort ascending by snapped bottom level. This is the processing
//    order; the proposal's own `stepId`s play no part in it.
// 3. For each placement, against the running set of accepted bricks:
//    a. Gravity: the resting level is the highest top among accepted bricks
//       that start below the placement's bottom and overlap its footprint
//       by at least `min_support_area`; the ground (0) if none. The
//       declared level is advisory and is overwritten whenever it differs,
//       up or down, so a brick declared slightly into its support is lifted
//       onto it. A brick that starts at the same level is a neighbour, not
//       a support: overlapping one is a collision.
//    b. Collision: if the rested box still interpenetrates an accepted
//       brick, try one-stud nudges in the fixed order +X, -X, +Z, -Z. The
//       first clear trial is kept and re-settled onto its new support.
//    c. If no nudge is clear the placement is dropped.
// 4. Accepted bricks are numbered 1.. in acceptance order.
//
// This is a single pass, not a fixed point: a brick accepted early is never
// revisited because of something placed after it. Re-running the resolver on
// its own output changes nothing: every output brick rests on one at a lower
// level, which the re-run sorts first.
//
// Cost is O(n^2) in the number of placements (each one scans every accepted
// brick for support and collision). Plans of a few hundred bricks are fine;
// much larger inputs would want a spatial index with the same semantics.
//
// **Critical constraint: determinism.** Identical input yields identical
// output and report. The sort is stable, the nudge order is fixed, and all
// geometry is integer arithmetic (`geometry.rs`).

use crate::config::ResolverConfig;
use crate::geometry::BoundingBox;
use crate::grid::{GridPlacement, level_to_studs, normalize_placement};
use crate::heights::HeightLookup;
use crate::report::{CorrectionAction, CorrectionEntry, ValidationReport, fmt_studs};
use crate::types::Placement;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;
use tracing::{debug, info, instrument};

/// Resolver output: the corrected plan and what was done to it.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Resolution {
    #[serde(rename = "steps")]
    pub placements: Vec<Placement>,
    pub report: ValidationReport,
}

// ---------------------------------------------------------------------------
// Nudges
// ---------------------------------------------------------------------------

/// A one-stud horizontal shift.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NudgeDirection {
    PosX,
    NegX,
    PosZ,
    NegZ,
}

impl NudgeDirection {
    /// Trial order. Never reorder: callers compare successive runs.
    pub const ALL: [NudgeDirection; 4] = [
        NudgeDirection::PosX,
        NudgeDirection::NegX,
        NudgeDirection::PosZ,
        NudgeDirection::NegZ,
    ];

    /// (dx, dz) in half-studs.
    pub fn to_offset(self) -> (i64, i64) {
        match self {
            NudgeDirection::PosX => (2, 0),
            NudgeDirection::NegX => (-2, 0),
            NudgeDirection::PosZ => (0, 2),
            NudgeDirection::NegZ => (0, -2),
        }
    }
}

impl fmt::Display for NudgeDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            NudgeDirection::PosX => "+X",
            NudgeDirection::NegX => "-X",
            NudgeDirection::PosZ => "+Z",
            NudgeDirection::NegZ => "-Z",
        };
        f.pad(s)
    }
}

// ---------------------------------------------------------------------------
// Accepted set
// ---------------------------------------------------------------------------

struct Accepted {
    step_id: u32,
    bbox: BoundingBox,
}

/// Where a footprint comes to rest.
struct Support {
    level: i64,
    /// Output step id of the supporting brick; `None` means the ground.
    resting_on: Option<u32>,
}

struct PlacedSet {
    accepted: Vec<Accepted>,
    min_support_area: f64,
}

impl PlacedSet {
    fn new(capacity: usize, min_support_area: f64) -> Self {
        Self {
            accepted: Vec::with_capacity(capacity),
            min_support_area,
        }
    }

    fn len(&self) -> usize {
        self.accepted.len()
    }

    /// Highest top among bricks that start below `footprint` and overlap it
    /// by at least `min_support_area`. Ties go to the earliest accepted brick.
    fn support(&self, footprint: &BoundingBox) -> Support {
        let mut best = Support {
            level: 0,
            resting_on: None,
        };
        for a in &self.accepted {
            let top = a.bbox.top();
            if a.bbox.bottom() >= footprint.bottom() || top <= best.level {
                continue;
            }
            let area = a.bbox.xz_overlap_area(footprint);
            if area > 0.0 && area >= self.min_support_area {
                best = Support {
                    level: top,
                    resting_on: Some(a.step_id),
                };
            }
        }
        best
    }

    /// Step ids of every accepted brick `bbox` interpenetrates.
    fn collisions(&self, bbox: &BoundingBox) -> Vec<u32> {
        self.accepted
            .iter()
            .filter(|a| a.bbox.collides(bbox))
            .map(|a| a.step_id)
            .collect()
    }

    fn collides_any(&self, bbox: &BoundingBox) -> bool {
        self.accepted.iter().any(|a| a.bbox.collides(bbox))
    }

    fn accept(&mut self, bbox: BoundingBox) -> u32 {
        let step_id = self.accepted.len() as u32 + 1;
        self.accepted.push(Accepted { step_id, bbox });
        step_id
    }
}

/// A nudge that escaped every collision.
struct Nudged {
    direction: NudgeDirection,
    /// Box after the shift, re-settled onto its new support.
    settled: BoundingBox,
    support: Support,
}

/// Try each direction in order; the first trial that is collision-free both
/// at its current level and after re-settling wins.
fn try_nudge(rested: &BoundingBox, placed: &PlacedSet) -> Option<Nudged> {
    for direction in NudgeDirection::ALL {
        let (dx2, dz2) = direction.to_offset();
        let trial = rested.translated(dx2, dz2);
        if placed.collides_any(&trial) {
            continue;
        }
        let support = placed.support(&trial);
        let settled = trial.at_level(support.level);
        // Every support candidate is below the clear trial, so this can only
        // fall, and only through a brick whose overlap is too small to bear
        // weight (min_support_area above one stud).
        if settled != trial && placed.collides_any(&settled) {
            continue;
        }
        return Some(Nudged {
            direction,
            settled,
            support,
        });
    }
    None
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// Resolve a proposed build plan.
///
/// Never fails: every input, however malformed, yields a resolution and a
/// report. The result satisfies:
/// - X/Z centres are grid-aligned for their rotated footprint.
/// - Y is a non-negative whole number of `vertical_unit`s.
/// - No two bricks interpenetrate.
/// - Every brick above the ground rests on one whose top equals its bottom,
///   overlapping by at least `min_support_area`.
/// - `stepId`s run 1.. in acceptance order.
///
/// O(n^2) in `placements.len()`.
#[instrument(skip_all, fields(input = placements.len()))]
pub fn resolve<H: HeightLookup + ?Sized>(
    placements: &[Placement],
    heights: &H,
    config: &ResolverConfig,
) -> Resolution {
    let config = config.sanitized();
    let unit = config.vertical_unit;

    let mut warnings = Vec::new();
    let mut grid: Vec<GridPlacement> = placements
        .iter()
        .enumerate()
        .map(|(i, p)| normalize_placement(i, p, heights, &config, &mut warnings))
        .collect();
    // Stable: ties keep input order.
    grid.sort_by_key(|g| g.level);

    let mut placed = PlacedSet::new(grid.len(), config.min_support_area);
    let mut output = Vec::with_capacity(grid.len());
    let mut corrections = Vec::new();

    for g in grid {
        let source = &placements[g.input_index];
        let declared = g.bounding_box();
        let mut pending: SmallVec<[CorrectionEntry; 2]> = SmallVec::new();

        // Gravity.
        let support = placed.support(&declared);
        let rested = declared.at_level(support.level);
        let gravity_snapped = rested.bottom() != declared.bottom();
        if gravity_snapped {
            pending.push(correction(
                source,
                CorrectionAction::GravitySnapped,
                gravity_reason(declared.bottom(), &support, unit),
            ));
        }

        // Collision.
        let blockers = placed.collisions(&rested);
        let (final_box, offset) = if blockers.is_empty() {
            (rested, (0, 0))
        } else if let Some(nudged) = try_nudge(&rested, &placed) {
            let mut reason = format!(
                "overlapped {}; nudged one stud along {}",
                step_list(&blockers),
                nudged.direction
            );
            let fell = nudged.settled.bottom() != rested.bottom();
            if fell {
                reason.push_str(&format!(
                    " and settled to Y={}",
                    fmt_studs(level_to_studs(nudged.settled.bottom(), unit))
                ));
            }
            pending.push(correction(source, CorrectionAction::Nudged, reason));
            if fell && !gravity_snapped {
                pending.push(correction(
                    source,
                    CorrectionAction::GravitySnapped,
                    gravity_reason(rested.bottom(), &nudged.support, unit),
                ));
            }
            (nudged.settled, nudged.direction.to_offset())
        } else {
            let entry = correction(
                source,
                CorrectionAction::Dropped,
                format!(
                    "overlaps {}; could not nudge clear along +X, -X, +Z or -Z",
                    step_list(&blockers)
                ),
            );
            debug!(
                step_id = source.step_id,
                part = %entry.part_name,
                reason = %entry.reason,
                "dropped placement"
            );
            corrections.push(entry);
            continue;
        };

        let step_id = placed.accept(final_box);
        let resolved = GridPlacement {
            center_x2: g.center_x2 + offset.0,
            center_z2: g.center_z2 + offset.1,
            level: final_box.bottom(),
            ..g
        };
        output.push(resolved.to_placement(source, step_id, unit));

        for mut entry in pending {
            entry.resolved_step_id = Some(step_id);
            debug!(
                step_id = source.step_id,
                resolved_step_id = step_id,
                action = %entry.action,
                reason = %entry.reason,
                "corrected placement"
            );
            corrections.push(entry);
        }
    }

    debug_assert_eq!(placed.len(), output.len());
    let report = ValidationReport::new(placements.len(), output.len(), corrections, warnings);
    info!(
        output = report.output_count,
        dropped = report.dropped_count,
        gravity_snapped = report.gravity_snapped_count,
        nudged = report.nudged_count,
        warnings = report.warning_count,
        "resolved build plan"
    );

    Resolution {
        placements: output,
        report,
    }
}

/// Resolve independent plans in parallel. Each result is identical to a
/// sequential `resolve` call on the same plan.
pub fn resolve_batch<H: HeightLookup + Sync + ?Sized>(
    plans: &[Vec<Placement>],
    heights: &H,
    config: &ResolverConfig,
) -> Vec<Resolution> {
    plans
        .par_iter()
        .map(|plan| resolve(plan, heights, config))
        .collect()
}

fn correction(source: &Placement, action: CorrectionAction, reason: String) -> CorrectionEntry {
    CorrectionEntry {
        step_id: source.step_id,
        resolved_step_id: None,
        part_name: source.display_name(),
        original_position: source.position,
        size: source.size,
        action,
        reason,
    }
}

fn gravity_reason(from_level: i64, support: &Support, unit: f64) -> String {
    let from = fmt_studs(level_to_studs(from_level, unit));
    let to = fmt_studs(level_to_studs(support.level, unit));
    match support.resting_on {
        Some(step) => format!("declared at Y={from}; resting on step {step} at Y={to}"),
        None => format!("declared at Y={from}; nothing beneath, dropped to the ground at Y={to}"),
    }
}

fn step_list(steps: &[u32]) -> String {
    let ids: Vec<String> = steps.iter().map(|s| s.to_string()).collect();
    if steps.len() == 1 {
        format!("step {}", ids[0])
    } else {
        format!("steps {}", ids.join(", "))
    }
}
