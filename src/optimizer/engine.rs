use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;
use tracing::{debug, info};

use crate::data::candidate::Candidate;
use crate::data::dataset::ScoredDataset;
use crate::error::{OptimizeError, OptimizeResult};
use crate::optimizer::model::{formulate, ZeroPricePolicy};
use crate::optimizer::request::{OptimizationRequest, Strategy};
use crate::optimizer::solver::{solve, SolveStatus, SolverConfig};
use crate::scoring::{team_stats, TeamStats};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RosterResult {
    /// Selected candidates in dataset row order.
    pub selected: Vec<Candidate>,
    pub total_cost: f64,
    pub total_score: f64,
    /// Objective value as reported by the solver. Equals `total_score` for `MAX_SCORE`,
    /// the efficiency sum for `MAX_SCORE_PER_COST`.
    pub objective: f64,
    pub strategy: Strategy,
    pub stats: TeamStats,
    pub success: bool,
    pub message: String,
}

impl RosterResult {
    pub fn failed(strategy: Strategy, message: impl Into<String>) -> Self {
        Self {
            selected: Vec::new(),
            total_cost: 0.0,
            total_score: 0.0,
            objective: 0.0,
            strategy,
            stats: TeamStats::default(),
            success: false,
            message: message.into(),
        }
    }
}

#[derive(Debug, Default)]
pub struct OptimizationEngine {
    solver: SolverConfig,
    zero_price: ZeroPricePolicy,
    solves: AtomicU64,
}

impl OptimizationEngine {
    pub fn new(solver: SolverConfig, zero_price: ZeroPricePolicy) -> Self {
        Self {
            solver,
            zero_price,
            solves: AtomicU64::new(0),
        }
    }

    /// Number of solver invocations since construction.
    pub fn solve_count(&self) -> u64 {
        self.solves.load(Ordering::Relaxed)
    }

    pub fn solver_config(&self) -> &SolverConfig {
        &self.solver
    }

    pub fn zero_price_policy(&self) -> ZeroPricePolicy {
        self.zero_price
    }

    /// Solves the request exactly. Anything short of a proven optimum is an error.
    pub fn optimize(
        &self,
        request: &OptimizationRequest,
        dataset: &ScoredDataset,
    ) -> OptimizeResult<RosterResult> {
        let Some(formulation) = formulate(request, dataset, self.zero_price) else {
            return Err(OptimizeError::Optimization {
                status: SolveStatus::Infeasible.label().to_string(),
            });
        };

        self.solves.fetch_add(1, Ordering::Relaxed);
        let solution = solve(&formulation.program, &self.solver);
        debug!(
            status = %solution.status,
            nodes = solution.nodes,
            variables = formulation.program.items.len(),
            "solver returned"
        );
        if solution.status != SolveStatus::Optimal {
            return Err(OptimizeError::Optimization {
                status: solution.status.label().to_string(),
            });
        }

        let selected: Vec<Candidate> = solution
            .selected
            .iter()
            .map(|item| dataset.candidates()[formulation.candidate_rows[*item]].clone())
            .collect();
        if selected.len() != request.team_size as usize {
            return Err(OptimizeError::Unexpected(format!(
                "solver selected {} candidates for a team of {}",
                selected.len(),
                request.team_size
            )));
        }

        let total_cost: f64 = selected.iter().map(|candidate| candidate.price).sum();
        let total_score: f64 = selected.iter().map(|candidate| candidate.score).sum();
        info!(
            strategy = %request.strategy,
            budget = request.budget,
            total_cost,
            total_score,
            "optimization successful"
        );

        Ok(RosterResult {
            stats: team_stats(&selected),
            selected,
            total_cost,
            total_score,
            objective: solution.objective,
            strategy: request.strategy,
            success: true,
            message: "Optimization successful".to_string(),
        })
    }
}
