//! Pre-solve feasibility checks. These are necessary conditions only: passing them does not
//! guarantee the full program has a solution, failing them proves it has none.

use std::collections::{BTreeMap, HashMap};

use tracing::debug;

use crate::data::candidate::{Candidate, Role};
use crate::data::dataset::ScoredDataset;
use crate::error::{InfeasibleReason, OptimizeError, OptimizeResult};
use crate::optimizer::request::{OptimizationRequest, RoleQuota};

/// Absolute slack when comparing a budget with summed prices.
pub const BUDGET_TOLERANCE: f64 = 1e-9;

pub fn validate(request: &OptimizationRequest, dataset: &ScoredDataset) -> OptimizeResult<()> {
    if !request.budget.is_finite() || request.budget <= 0.0 {
        return Err(OptimizeError::bad_request(
            "budget",
            format!("must be positive. Provided budget: {}", request.budget),
        ));
    }

    check_required_fields(dataset.candidates())?;

    let pool: Vec<&Candidate> = dataset
        .candidates()
        .iter()
        .filter(|candidate| !request.excluded_ids.contains(&candidate.id))
        .collect();

    let availability = availability_by_role(&pool);
    for (role, required) in request.role_quota.iter() {
        let available = availability.get(&role).copied().unwrap_or(0);
        if available < required {
            return Err(OptimizeError::Infeasible(InfeasibleReason::RoleShortage {
                role,
                required,
                available,
                availability,
            }));
        }
    }

    let lower_bound = lower_bound_cost(&request.role_quota, &pool);
    debug!(budget = request.budget, lower_bound, "feasibility lower bound computed");
    if request.budget + BUDGET_TOLERANCE < lower_bound {
        return Err(OptimizeError::Infeasible(InfeasibleReason::BudgetBelowLowerBound {
            budget: request.budget,
            lower_bound,
            shortfall: lower_bound - request.budget,
            quota: request.role_quota.as_map().clone(),
        }));
    }

    Ok(())
}

/// Sum over quota roles of the `count` cheapest prices of that role. Roles partition the
/// pool, so the per-role minima never compete for the same candidate.
pub fn lower_bound_cost(quota: &RoleQuota, pool: &[&Candidate]) -> f64 {
    quota
        .iter()
        .map(|(role, count)| {
            let mut prices: Vec<f64> = pool
                .iter()
                .filter(|candidate| candidate.role == role)
                .map(|candidate| candidate.price)
                .collect();
            prices.sort_by(f64::total_cmp);
            prices.iter().take(count as usize).sum::<f64>()
        })
        .sum()
}

pub fn availability_by_role(pool: &[&Candidate]) -> BTreeMap<Role, u32> {
    let mut counts = BTreeMap::new();
    for candidate in pool {
        *counts.entry(candidate.role).or_insert(0) += 1;
    }
    counts
}

fn check_required_fields(candidates: &[Candidate]) -> OptimizeResult<()> {
    let mut issues = Vec::new();
    let mut first_seen: HashMap<&str, usize> = HashMap::new();
    for (row, candidate) in candidates.iter().enumerate() {
        let id = candidate.id.trim();
        if !id.is_empty() {
            if let Some(first) = first_seen.get(id) {
                issues.push(format!(
                    "row[{row}] '{id}': duplicate id (first seen at row[{first}])"
                ));
            } else {
                first_seen.insert(id, row);
            }
        }
        let mut missing = Vec::new();
        if candidate.id.trim().is_empty() {
            missing.push("id");
        }
        if !candidate.price.is_finite() {
            missing.push("price");
        }
        if !candidate.score.is_finite() {
            missing.push("score");
        }
        if !missing.is_empty() {
            issues.push(format!("row[{row}] missing required fields: {}", missing.join(", ")));
        }
    }
    if issues.is_empty() {
        Ok(())
    } else {
        Err(OptimizeError::DataIntegrity(issues))
    }
}
