// Caller-side retry orchestration.
//
// The resolver itself never retries. The generation loop that calls it does:
// it asks the generator for a plan, resolves it, and if too much had to be
// dropped it asks again, feeding back the previous report. After a fixed
// number of attempts (or a time budget) it gives up and returns the BEST
// resolution seen, meaning the one with the most surviving bricks, not the
// latest.
//
// Everything here is built on the public `ValidationReport` fields only
// (`dropped_count`, `dropped_percentage`, `output_count`), so it doubles as
// a check that the report carries what an external consumer needs.
//
// See also: `resolver.rs` for `resolve()`, `config.rs` where `RetryPolicy`
// is loaded as part of `PlanConfig`.

use crate::config::{ConfigError, ResolverConfig};
use crate::heights::HeightLookup;
use crate::report::ValidationReport;
use crate::resolver::{Resolution, resolve};
use crate::types::Placement;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, info};

// ---------------------------------------------------------------------------
// Policy
// ---------------------------------------------------------------------------

/// When to ask the generator for another plan.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Retry when more than this percentage of the input was dropped.
    pub max_dropped_percentage: f64,
    /// Retry when more than this many placements were dropped.
    pub max_dropped_count: usize,
    /// Total generation attempts, including the first.
    pub max_iterations: u32,
    /// Stop starting new attempts once this much wall-clock time has passed.
    pub time_budget_ms: Option<u64>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_dropped_percentage: 20.0,
            max_dropped_count: 10,
            max_iterations: 3,
            time_budget_ms: None,
        }
    }
}

impl RetryPolicy {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.max_dropped_percentage.is_finite() && self.max_dropped_percentage >= 0.0) {
            return Err(ConfigError::Invalid(format!(
                "max_dropped_percentage must be non-negative, got {}",
                self.max_dropped_percentage
            )));
        }
        if self.max_iterations == 0 {
            return Err(ConfigError::Invalid(
                "max_iterations must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// True when the report exceeds either drop threshold.
    pub fn should_retry(&self, report: &ValidationReport) -> bool {
        report.dropped_percentage > self.max_dropped_percentage
            || report.dropped_count > self.max_dropped_count
    }
}

// ---------------------------------------------------------------------------
// Best tracking
// ---------------------------------------------------------------------------

/// Keeps the resolution with the highest `output_count` seen so far.
/// Earlier attempts win ties.
#[derive(Debug, Default)]
pub struct BestResolution {
    best: Option<(u32, Resolution)>,
}

impl BestResolution {
    pub fn new() -> Self {
        Self::default()
    }

    /// Offer an attempt's result. Returns true if it became the new best.
    pub fn offer(&mut self, attempt: u32, resolution: Resolution) -> bool {
        let better = match &self.best {
            None => true,
            Some((_, current)) => resolution.report.output_count > current.report.output_count,
        };
        if better {
            self.best = Some((attempt, resolution));
        }
        better
    }

    /// Attempt number of the current best.
    pub fn attempt(&self) -> Option<u32> {
        self.best.as_ref().map(|(attempt, _)| *attempt)
    }

    pub fn report(&self) -> Option<&ValidationReport> {
        self.best.as_ref().map(|(_, r)| &r.report)
    }

    pub fn into_inner(self) -> Option<(u32, Resolution)> {
        self.best
    }
}

// ---------------------------------------------------------------------------
// Generation loop
// ---------------------------------------------------------------------------

/// Result of a generation loop.
#[derive(Clone, Debug)]
pub struct GenerationOutcome {
    /// The accepted resolution, or the best one seen if none was accepted.
    pub resolution: Resolution,
    /// Attempt number (1-based) that produced `resolution`.
    pub attempt: u32,
    /// Attempts actually made.
    pub attempts: u32,
    /// Whether `resolution` satisfied the policy.
    pub accepted: bool,
}

/// Drive `generate` until a plan resolves within the policy's thresholds or
/// the attempt / time budget runs out.
///
/// `generate` receives the 1-based attempt number and the previous
/// attempt's report (`None` on the first call). At least one attempt is
/// always made.
pub fn run_generation_loop<H, G>(
    policy: &RetryPolicy,
    heights: &H,
    config: &ResolverConfig,
    mut generate: G,
) -> GenerationOutcome
where
    H: HeightLookup + ?Sized,
    G: FnMut(u32, Option<&ValidationReport>) -> Vec<Placement>,
{
    let started = Instant::now();
    let budget = policy.time_budget_ms.map(Duration::from_millis);
    let max_iterations = policy.max_iterations.max(1);

    let mut best = BestResolution::new();
    let mut previous: Option<ValidationReport> = None;
    let mut attempts = 0;

    for attempt in 1..=max_iterations {
        if attempt > 1 && budget.is_some_and(|b| started.elapsed() >= b) {
            debug!(attempt, "time budget exhausted");
            break;
        }
        attempts = attempt;

        let plan = generate(attempt, previous.as_ref());
        let resolution = resolve(&plan, heights, config);
        let retry = policy.should_retry(&resolution.report);
        debug!(
            attempt,
            output = resolution.report.output_count,
            dropped = resolution.report.dropped_count,
            retry,
            "generation attempt resolved"
        );

        if !retry {
            info!(attempt, "plan accepted");
            return GenerationOutcome {
                resolution,
                attempt,
                attempts,
                accepted: true,
            };
        }

        previous = Some(resolution.report.clone());
        best.offer(attempt, resolution);
    }

    let (attempt, resolution) = best.into_inner().unwrap_or_default();
    info!(attempts, best_attempt = attempt, "giving up, returning best plan");
    GenerationOutcome {
        resolution,
        attempt,
        attempts,
        accepted: false,
    }
}
