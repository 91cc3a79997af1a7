//! Budget sweeps: one optimization per budget, spread over a rayon pool.

use std::sync::Arc;

use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use serde::Serialize;
use tracing::warn;

use crate::data::dataset::ScoredDataset;
use crate::optimizer::engine::RosterResult;
use crate::optimizer::request::OptimizationRequest;
use crate::optimizer::service::OptimizationService;

#[derive(Debug, Clone, Serialize)]
pub struct SweepEntry {
    pub budget: f64,
    pub result: Arc<RosterResult>,
}

/// Upper limit on the number of budgets a single sweep may visit.
pub const MAX_SWEEP_POINTS: usize = 10_000;

/// Inclusive range `from, from + step, ... <= to`. Rejects non-finite bounds, a non-positive
/// step, `from > to` and ranges longer than [MAX_SWEEP_POINTS].
pub fn budget_range(from: f64, to: f64, step: f64) -> Result<Vec<f64>, String> {
    if !(from.is_finite() && to.is_finite() && step.is_finite()) {
        return Err(format!("budget range must be finite: from={from}, to={to}, step={step}"));
    }
    if step <= 0.0 || from > to {
        return Err(format!("empty budget range: from={from}, to={to}, step={step}"));
    }
    let steps = ((to - from) / step + 1e-9).floor();
    if !steps.is_finite() || steps >= MAX_SWEEP_POINTS as f64 {
        return Err(format!(
            "budget range from={from} to={to} step={step} exceeds {MAX_SWEEP_POINTS} points"
        ));
    }
    Ok((0..=steps as usize).map(|i| from + step * i as f64).collect())
}

/// Runs `template` once per budget. Results are in input order; failures become
/// [RosterResult::failed] entries. `workers == 0` uses the global rayon pool.
pub fn sweep_budgets(
    service: &OptimizationService,
    dataset: &ScoredDataset,
    template: &OptimizationRequest,
    budgets: &[f64],
    workers: usize,
) -> Vec<SweepEntry> {
    let run = || -> Vec<SweepEntry> {
        budgets
            .par_iter()
            .map(|budget| {
                let request = OptimizationRequest {
                    budget: *budget,
                    ..template.clone()
                };
                let result = service.run(&request, dataset).unwrap_or_else(|err| {
                    Arc::new(RosterResult::failed(template.strategy, err.to_string()))
                });
                SweepEntry {
                    budget: *budget,
                    result,
                }
            })
            .collect()
    };

    if workers == 0 {
        return run();
    }
    match ThreadPoolBuilder::new().num_threads(workers).build() {
        Ok(pool) => pool.install(run),
        Err(err) => {
            warn!(workers, error = %err, "could not build sweep thread pool; using global pool");
            run()
        }
    }
}
