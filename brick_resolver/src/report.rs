// Validation report: what the resolver changed and why.
//
// Two record kinds:
// - `CorrectionEntry`: a physics correction: the placement was dropped,
//   gravity-snapped onto its support, or nudged sideways out of a collision.
//   These are what the generation loop's retry decision is built on.
// - `ClampWarning`: a normalizer adjustment (rotation snap, dimension
//   clamp, height override, off-grid position, non-finite value). Bad data
//   from the generator, as opposed to bad geometry.
//
// `ValidationReport` aggregates both with the counts the caller needs
// (`droppedCount`, `droppedPercentage`, ...). The JSON schema is camelCase
// and append-only: existing fields keep their names and meanings.
//
// See also: `resolver.rs`, which builds the report, and `retry.rs`, which
// consumes it.

use crate::types::{BrickSize, Vec3};
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Corrections
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrectionAction {
    /// Removed from the output: no nudge escaped its collision.
    Dropped,
    /// Y replaced by the top of its support surface (or the ground).
    GravitySnapped,
    /// Shifted one stud along X or Z to escape a collision.
    Nudged,
}

impl fmt::Display for CorrectionAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CorrectionAction::Dropped => "dropped",
            CorrectionAction::GravitySnapped => "gravity_snapped",
            CorrectionAction::Nudged => "nudged",
        };
        f.pad(s)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorrectionEntry {
    /// The placement's `stepId` as proposed.
    pub step_id: u32,
    /// The placement's `stepId` in the output, absent for drops.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_step_id: Option<u32>,
    pub part_name: String,
    /// Position as proposed, before any normalization.
    pub original_position: Vec3,
    /// Size as proposed.
    pub size: BrickSize,
    pub action: CorrectionAction,
    pub reason: String,
}

// ---------------------------------------------------------------------------
// Clamp warnings
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClampKind {
    RotationSnapped,
    TiltDiscarded,
    DimensionClamped,
    HeightOverridden,
    PositionSnapped,
    NonFiniteValue,
    CoordinateClamped,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClampWarning {
    pub step_id: u32,
    pub part_name: String,
    pub kind: ClampKind,
    pub detail: String,
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub input_count: usize,
    pub output_count: usize,
    pub dropped_count: usize,
    pub gravity_snapped_count: usize,
    pub nudged_count: usize,
    /// `dropped_count / input_count * 100`, or 0 for an empty input.
    pub dropped_percentage: f64,
    pub corrections: Vec<CorrectionEntry>,
    #[serde(default)]
    pub warning_count: usize,
    #[serde(default)]
    pub warnings: Vec<ClampWarning>,
}

impl ValidationReport {
    /// Assemble a report, deriving every count from the entry lists.
    pub fn new(
        input_count: usize,
        output_count: usize,
        corrections: Vec<CorrectionEntry>,
        warnings: Vec<ClampWarning>,
    ) -> Self {
        let count = |action: CorrectionAction| {
            corrections.iter().filter(|c| c.action == action).count()
        };
        let dropped_count = count(CorrectionAction::Dropped);
        let gravity_snapped_count = count(CorrectionAction::GravitySnapped);
        let nudged_count = count(CorrectionAction::Nudged);
        let dropped_percentage = if input_count == 0 {
            0.0
        } else {
            dropped_count as f64 / input_count as f64 * 100.0
        };

        Self {
            input_count,
            output_count,
            dropped_count,
            gravity_snapped_count,
            nudged_count,
            dropped_percentage,
            corrections,
            warning_count: warnings.len(),
            warnings,
        }
    }

    /// Total physics corrections of any kind.
    pub fn correction_count(&self) -> usize {
        self.corrections.len()
    }

    /// True when the resolver changed nothing at all, warnings included.
    pub fn is_clean(&self) -> bool {
        self.corrections.is_empty() && self.warnings.is_empty()
    }

    /// Entries for one action, in processing order.
    pub fn entries(&self, action: CorrectionAction) -> impl Iterator<Item = &CorrectionEntry> {
        self.corrections.iter().filter(move |c| c.action == action)
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} in, {} out: {} dropped ({:.1}%), {} gravity-snapped, {} nudged, {} warnings",
            self.input_count,
            self.output_count,
            self.dropped_count,
            self.dropped_percentage,
            self.gravity_snapped_count,
            self.nudged_count,
            self.warning_count,
        )
    }
}

/// Format a stud value for human-readable reasons: at most three decimals,
/// trailing zeros trimmed.
pub fn fmt_studs(value: f64) -> String {
    let s = format!("{value:.3}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" { "0".to_string() } else { s.to_string() }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(action: CorrectionAction) -> CorrectionEntry {
        CorrectionEntry {
            step_id: 1,
            resolved_step_id: None,
            part_name: "brick square 1x1".into(),
            original_position: Vec3::ZERO,
            size: BrickSize::new(1.0, 1.2, 1.0),
            action,
            reason: "test".into(),
        }
    }

    #[test]
    fn counts_are_derived_from_entries() {
        let report = ValidationReport::new(
            8,
            6,
            vec![
                entry(CorrectionAction::Dropped),
                entry(CorrectionAction::GravitySnapped),
                entry(CorrectionAction::Nudged),
                entry(CorrectionAction::GravitySnapped),
                entry(CorrectionAction::Dropped),
            ],
            Vec::new(),
        );
        assert_eq!(report.dropped_count, 2);
        assert_eq!(report.gravity_snapped_count, 2);
        assert_eq!(report.nudged_count, 1);
        assert_eq!(report.dropped_percentage, 25.0);
        assert_eq!(report.entries(CorrectionAction::Nudged).count(), 1);
        assert!(!report.is_clean());
    }

    #[test]
    fn empty_input_has_zero_percentage() {
        let report = ValidationReport::new(0, 0, Vec::new(), Vec::new());
        assert_eq!(report.dropped_percentage, 0.0);
        assert!(report.is_clean());
    }

    #[test]
    fn report_uses_camel_case_schema() {
        let dropped = vec![entry(CorrectionAction::Dropped)];
        let report = ValidationReport::new(1, 0, dropped, Vec::new());
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["inputCount"], 1);
        assert_eq!(json["droppedCount"], 1);
        assert_eq!(json["droppedPercentage"], 100.0);
        assert_eq!(json["corrections"][0]["action"], "dropped");
        assert_eq!(json["corrections"][0]["originalPosition"]["x"], 0.0);
        assert!(json["corrections"][0].get("resolvedStepId").is_none());
    }

    #[test]
    fn report_without_warnings_still_deserializes() {
        let json = r#"{
            "inputCount": 2, "outputCount": 2, "droppedCount": 0,
            "gravitySnappedCount": 0, "nudgedCount": 0,
            "droppedPercentage": 0.0, "corrections": []
        }"#;
        let report: ValidationReport = serde_json::from_str(json).unwrap();
        assert_eq!(report.output_count, 2);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn display_summarizes_counts() {
        let dropped = vec![entry(CorrectionAction::Dropped)];
        let report = ValidationReport::new(4, 3, dropped, Vec::new());
        assert_eq!(
            report.to_string(),
            "4 in, 3 out: 1 dropped (25.0%), 0 gravity-snapped, 0 nudged, 0 warnings"
        );
    }

    #[test]
    fn fmt_studs_trims() {
        assert_eq!(fmt_studs(1.2000000000000002), "1.2");
        assert_eq!(fmt_studs(0.0), "0");
        assert_eq!(fmt_studs(-0.0001), "0");
        assert_eq!(fmt_studs(1.5), "1.5");
        assert_eq!(fmt_studs(95.0), "95");
    }
}
