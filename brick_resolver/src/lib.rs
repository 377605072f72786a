// brick_resolver: build-plan physics resolver.
//
// A generator (an LLM fed a photo) proposes a LEGO build plan: an ordered
// list of brick placements with positions, rotations, and sizes. Proposals
// are often physically impossible: bricks float, interpenetrate, sit off
// the stud grid, or are tilted. This crate repairs such a plan into one that
// can actually be built, and reports every change so the caller can decide
// whether to ask the generator to try again.
//
// Module overview:
// - `types.rs`:    Placement, Vec3, BrickSize, Yaw (the wire data model).
// - `heights.rs`:  HeightLookup trait + HeightTable (canonical brick heights).
// - `grid.rs`:     Normalization onto the stud lattice (rotation, position, size).
// - `geometry.rs`: BoundingBox in half-studs / levels; exact overlap predicates.
// - `resolver.rs`: resolve() / resolve_batch(): gravity, nudge, drop.
// - `report.rs`:   ValidationReport, CorrectionEntry, ClampWarning.
// - `config.rs`:   ResolverConfig + PlanConfig (JSON), ConfigError.
// - `retry.rs`:    RetryPolicy and the caller-side generation loop.
//
// The CLI wrapper lives in `brick_resolver_cli`.
//
// **Critical constraint: determinism.** `resolve` is a pure function of its
// input, the height lookup, and the config. No randomness, no `HashMap`
// iteration, no clock. Only the generation loop in `retry.rs` reads the
// clock, and only to enforce its time budget.

pub mod config;
pub mod geometry;
pub mod grid;
pub mod heights;
pub mod report;
pub mod resolver;
pub mod retry;
pub mod types;

pub use config::{ConfigError, PlanConfig, ResolverConfig};
pub use heights::{HeightLookup, HeightTable};
pub use report::{ClampKind, ClampWarning, CorrectionAction, CorrectionEntry, ValidationReport};
pub use resolver::{NudgeDirection, Resolution, resolve, resolve_batch};
pub use retry::{BestResolution, GenerationOutcome, RetryPolicy, run_generation_loop};
pub use types::{BrickSize, Placement, Vec3, Yaw};
