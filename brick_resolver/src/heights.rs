// Brick height lookup.
//
// The generator's declared `size.height` is never trusted: a brick's height
// is a fixed property of its shape and type. The resolver receives the lookup
// as an explicit argument (`HeightLookup`) rather than reading a global
// table, so `resolve()` stays a pure function of its inputs.
//
// Two implementations are provided:
// - `HeightTable`, a serde-loadable table (part of `PlanConfig`) keyed first
//   by optional `(shape, type)` overrides, then by type alone, then a
//   fallback height.
// - Any `Fn(&str, &str) -> f64` closure, handy in tests and for callers that
//   already own a catalog.
//
// Keys are matched case-insensitively after trimming.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Standard LEGO heights in stud units.
pub const BRICK_HEIGHT: f64 = 1.2;
pub const PLATE_HEIGHT: f64 = 0.4;

/// Source of truth for brick heights, keyed by shape and type tags.
pub trait HeightLookup {
    /// Height in stud units. The resolver clamps non-finite or non-positive
    /// results to one vertical unit, so implementations need not validate.
    fn height_of(&self, shape: &str, brick_type: &str) -> f64;
}

impl<F> HeightLookup for F
where
    F: Fn(&str, &str) -> f64,
{
    fn height_of(&self, shape: &str, brick_type: &str) -> f64 {
        self(shape, brick_type)
    }
}

/// Data-driven height table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeightTable {
    /// Height per type tag (`"brick"`, `"plate"`, ...).
    pub by_type: BTreeMap<String, f64>,
    /// Shape-specific exceptions: shape -> type -> height. Checked before
    /// `by_type`.
    pub overrides: BTreeMap<String, BTreeMap<String, f64>>,
    /// Used when neither map has an entry.
    pub fallback: f64,
}

impl Default for HeightTable {
    fn default() -> Self {
        let mut by_type = BTreeMap::new();
        by_type.insert("brick".to_string(), BRICK_HEIGHT);
        by_type.insert("plate".to_string(), PLATE_HEIGHT);
        by_type.insert("tile".to_string(), PLATE_HEIGHT);

        Self {
            by_type,
            overrides: BTreeMap::new(),
            fallback: BRICK_HEIGHT,
        }
    }
}

impl HeightTable {
    /// Add or replace a shape-specific override.
    pub fn with_override(mut self, shape: &str, brick_type: &str, height: f64) -> Self {
        self.overrides
            .entry(normalize_key(shape))
            .or_default()
            .insert(normalize_key(brick_type), height);
        self
    }
}

impl HeightLookup for HeightTable {
    fn height_of(&self, shape: &str, brick_type: &str) -> f64 {
        let shape = normalize_key(shape);
        let brick_type = normalize_key(brick_type);

        if let Some(h) = self
            .overrides
            .get(&shape)
            .and_then(|by_type| by_type.get(&brick_type))
        {
            return *h;
        }
        self.by_type
            .get(&brick_type)
            .copied()
            .unwrap_or(self.fallback)
    }
}

fn normalize_key(key: &str) -> String {
    key.trim().to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_table_covers_standard_types() {
        let table = HeightTable::default();
        assert_eq!(table.height_of("rectangle", "brick"), 1.2);
        assert_eq!(table.height_of("square", "plate"), 0.4);
        assert_eq!(table.height_of("square", "tile"), 0.4);
    }

    #[test]
    fn unknown_type_uses_fallback() {
        let table = HeightTable::default();
        assert_eq!(table.height_of("rectangle", "mystery"), table.fallback);
    }

    #[test]
    fn lookup_is_case_and_whitespace_insensitive() {
        let table = HeightTable::default();
        assert_eq!(table.height_of("Rectangle", " Plate "), 0.4);
    }

    #[test]
    fn shape_override_wins_over_type() {
        let table = HeightTable::default().with_override("Tall", "brick", 2.4);
        assert_eq!(table.height_of("tall", "brick"), 2.4);
        assert_eq!(table.height_of("rectangle", "brick"), 1.2);
        // Override is specific to the type as well.
        assert_eq!(table.height_of("tall", "plate"), 0.4);
    }

    #[test]
    fn closures_are_lookups() {
        let flat = |_: &str, _: &str| 0.4;
        assert_eq!(flat.height_of("anything", "at all"), 0.4);
    }

    #[test]
    fn table_loads_partial_json() {
        let table: HeightTable =
            serde_json::from_str(r#"{"overrides": {"slope": {"brick": 0.8}}}"#).unwrap();
        assert_eq!(table.height_of("slope", "brick"), 0.8);
        // Missing sections keep their defaults.
        assert_eq!(table.height_of("square", "plate"), 0.4);
    }
}
