//! Roster optimization: feasibility pre-check, program formulation, exact solve and result
//! caching. The active path is `OptimizationService::run` → `feasibility::validate` →
//! `OptimizationEngine::optimize` → `solver::solve`.

pub mod cache;
pub mod engine;
pub mod feasibility;
pub mod model;
pub mod request;
pub mod service;
pub mod solver;
pub mod sweep;

pub use cache::{CacheKey, ResultCache};
pub use engine::{OptimizationEngine, RosterResult};
pub use model::ZeroPricePolicy;
pub use request::{OptimizationRequest, OptimizeParams, RoleQuota, Strategy};
pub use service::OptimizationService;
pub use solver::{SolveStatus, SolverConfig};
pub use sweep::{budget_range, sweep_budgets, SweepEntry, MAX_SWEEP_POINTS};
