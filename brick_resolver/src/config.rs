// Data-driven resolver configuration.
//
// All tunable resolver parameters live in `ResolverConfig`; the height table
// and the caller-side retry thresholds sit alongside it in `PlanConfig`, which
// is what the CLI loads from JSON. Every struct is `#[serde(default)]`, so a
// config file only needs to mention the values it changes.
//
// The resolver itself never fails on a bad config: `ResolverConfig::sanitized`
// swaps out unusable values for defaults (with a warning). Loading from disk
// is the only fallible path and reports a `ConfigError`.
//
// See also: `heights.rs` for `HeightTable`, `retry.rs` for `RetryPolicy`,
// `resolver.rs` for where each parameter is consumed.

use crate::heights::HeightTable;
use crate::retry::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::warn;

// ---------------------------------------------------------------------------
// Resolver parameters
// ---------------------------------------------------------------------------

/// Bounds on the lattice-scale parameters. Within them every snapped
/// coordinate, level, and overlap product fits comfortably in an `i64`.
pub const VERTICAL_UNIT_RANGE: (f64, f64) = (1e-3, 1e3);
pub const MAX_DIMENSION_LIMIT: u32 = 4096;
pub const MAX_COORDINATE_LIMIT: f64 = 1e6;

fn vertical_unit_ok(v: f64) -> bool {
    (VERTICAL_UNIT_RANGE.0..=VERTICAL_UNIT_RANGE.1).contains(&v)
}

fn max_dimension_ok(v: u32) -> bool {
    (1..=MAX_DIMENSION_LIMIT).contains(&v)
}

fn max_coordinate_ok(v: f64) -> bool {
    v > 0.0 && v <= MAX_COORDINATE_LIMIT
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Minimum vertical step in stud units. Every resolved Y and every
    /// brick height is a whole multiple of this (a plate is one unit).
    pub vertical_unit: f64,
    /// Minimum XZ overlap, in square studs, for a placed brick to count as
    /// a support surface.
    pub min_support_area: f64,
    /// Width and length are clamped to `[1, max_dimension]` studs.
    pub max_dimension: u32,
    /// Horizontal and vertical coordinates are clamped to
    /// `[-max_coordinate, max_coordinate]` before snapping.
    pub max_coordinate: f64,
    /// How far a value may move during snapping before the normalizer
    /// reports it as a `ClampWarning`. Only affects reporting.
    pub snap_tolerance: f64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            vertical_unit: 0.4,
            min_support_area: 0.5,
            max_dimension: 64,
            max_coordinate: 10_000.0,
            snap_tolerance: 1e-6,
        }
    }
}

impl ResolverConfig {
    /// Check that every parameter is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !vertical_unit_ok(self.vertical_unit) {
            return Err(ConfigError::Invalid(format!(
                "vertical_unit must be in [{}, {}], got {}",
                VERTICAL_UNIT_RANGE.0, VERTICAL_UNIT_RANGE.1, self.vertical_unit
            )));
        }
        if !(self.min_support_area.is_finite() && self.min_support_area >= 0.0) {
            return Err(ConfigError::Invalid(format!(
                "min_support_area must be non-negative, got {}",
                self.min_support_area
            )));
        }
        if !max_dimension_ok(self.max_dimension) {
            return Err(ConfigError::Invalid(format!(
                "max_dimension must be in [1, {MAX_DIMENSION_LIMIT}], got {}",
                self.max_dimension
            )));
        }
        if !max_coordinate_ok(self.max_coordinate) {
            return Err(ConfigError::Invalid(format!(
                "max_coordinate must be in (0, {MAX_COORDINATE_LIMIT}], got {}",
                self.max_coordinate
            )));
        }
        if !(self.snap_tolerance.is_finite() && self.snap_tolerance >= 0.0) {
            return Err(ConfigError::Invalid(format!(
                "snap_tolerance must be non-negative, got {}",
                self.snap_tolerance
            )));
        }
        Ok(())
    }

    /// A copy with every unusable field replaced by its default. Used by
    /// `resolve()` so that a hand-built config can never make it fail.
    pub fn sanitized(&self) -> ResolverConfig {
        let defaults = ResolverConfig::default();
        let mut out = self.clone();

        if !vertical_unit_ok(out.vertical_unit) {
            warn!(value = out.vertical_unit, "invalid vertical_unit, using default");
            out.vertical_unit = defaults.vertical_unit;
        }
        if !(out.min_support_area.is_finite() && out.min_support_area >= 0.0) {
            warn!(value = out.min_support_area, "invalid min_support_area, using default");
            out.min_support_area = defaults.min_support_area;
        }
        if !max_dimension_ok(out.max_dimension) {
            warn!(value = out.max_dimension, "invalid max_dimension, using default");
            out.max_dimension = defaults.max_dimension;
        }
        if !max_coordinate_ok(out.max_coordinate) {
            warn!(value = out.max_coordinate, "invalid max_coordinate, using default");
            out.max_coordinate = defaults.max_coordinate;
        }
        if !(out.snap_tolerance.is_finite() && out.snap_tolerance >= 0.0) {
            warn!(value = out.snap_tolerance, "invalid snap_tolerance, using default");
            out.snap_tolerance = defaults.snap_tolerance;
        }
        out
    }
}

// ---------------------------------------------------------------------------
// Top-level plan config
// ---------------------------------------------------------------------------

/// Everything a resolver run needs besides the placements themselves.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanConfig {
    pub resolver: ResolverConfig,
    pub heights: HeightTable,
    pub retry: RetryPolicy,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

impl PlanConfig {
    /// Parse and validate a JSON config.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: PlanConfig = serde_json::from_str(json)?;
        config.resolver.validate()?;
        config.retry.validate()?;
        Ok(config)
    }

    /// Read, parse, and validate a JSON config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = PlanConfig::default();
        let json = serde_json::to_string_pretty(&config).unwrap();
        let restored = PlanConfig::from_json_str(&json).unwrap();
        assert_eq!(config, restored);
    }

    #[test]
    fn default_config_is_valid() {
        assert!(ResolverConfig::default().validate().is_ok());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = PlanConfig::from_json_str(
            r#"{
                "resolver": { "min_support_area": 1.0 },
                "retry": { "max_iterations": 5 }
            }"#,
        )
        .unwrap();
        assert_eq!(config.resolver.min_support_area, 1.0);
        assert_eq!(config.resolver.vertical_unit, 0.4);
        assert_eq!(config.retry.max_iterations, 5);
        assert_eq!(config.heights, HeightTable::default());
    }

    #[test]
    fn empty_object_is_default() {
        let config = PlanConfig::from_json_str("{}").unwrap();
        assert_eq!(config, PlanConfig::default());
    }

    #[test]
    fn rejects_non_positive_vertical_unit() {
        let err = PlanConfig::from_json_str(r#"{"resolver": {"vertical_unit": 0.0}}"#)
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
        assert!(err.to_string().contains("vertical_unit"));
    }

    #[test]
    fn rejects_out_of_range_lattice_limits() {
        for json in [
            r#"{"resolver": {"max_coordinate": 1e300}}"#,
            r#"{"resolver": {"vertical_unit": 1e-300}}"#,
            r#"{"resolver": {"max_dimension": 100000}}"#,
        ] {
            let err = PlanConfig::from_json_str(json).unwrap_err();
            assert!(matches!(err, ConfigError::Invalid(_)), "{json}");
        }
    }

    #[test]
    fn rejects_malformed_json() {
        let err = PlanConfig::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = PlanConfig::load(Path::new("/nonexistent/brick_resolver.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn sanitized_replaces_out_of_range_limits() {
        let config = ResolverConfig {
            vertical_unit: 1e-300,
            max_dimension: u32::MAX,
            max_coordinate: 1e300,
            ..ResolverConfig::default()
        };
        assert_eq!(config.sanitized(), ResolverConfig::default());
    }

    #[test]
    fn sanitized_replaces_only_bad_fields() {
        let config = ResolverConfig {
            vertical_unit: -1.0,
            min_support_area: f64::NAN,
            max_dimension: 0,
            max_coordinate: 50.0,
            snap_tolerance: 1e-3,
        };
        let clean = config.sanitized();
        let defaults = ResolverConfig::default();
        assert_eq!(clean.vertical_unit, defaults.vertical_unit);
        assert_eq!(clean.min_support_area, defaults.min_support_area);
        assert_eq!(clean.max_dimension, defaults.max_dimension);
        assert_eq!(clean.max_coordinate, 50.0);
        assert_eq!(clean.snap_tolerance, 1e-3);
        assert!(clean.validate().is_ok());
    }
}
