//! Formulates a roster request as a [SelectionProgram]: one binary variable per candidate that
//! is not excluded, the budget row, the exact team size and the per-role quota rows.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::data::candidate::Role;
use crate::data::dataset::ScoredDataset;
use crate::optimizer::request::{OptimizationRequest, Strategy};
use crate::optimizer::solver::{SelectionItem, SelectionProgram};

/// Default multiplier for zero-price candidates under [ZeroPricePolicy::ScaledScore].
pub const DEFAULT_ZERO_PRICE_FACTOR: f64 = 1000.0;

/// How `MAX_SCORE_PER_COST` values a candidate whose price is zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ZeroPricePolicy {
    /// `score * factor` for positive scores, 0 otherwise.
    ScaledScore { factor: f64 },
    /// Zero-price candidates contribute nothing to the objective.
    Ignore,
}

impl Default for ZeroPricePolicy {
    fn default() -> Self {
        Self::ScaledScore {
            factor: DEFAULT_ZERO_PRICE_FACTOR,
        }
    }
}

pub fn efficiency(score: f64, price: f64, policy: ZeroPricePolicy) -> f64 {
    if price > 0.0 {
        return score / price;
    }
    match policy {
        ZeroPricePolicy::ScaledScore { factor } if score > 0.0 => score * factor,
        _ => 0.0,
    }
}

pub fn objective_coefficient(
    strategy: Strategy,
    score: f64,
    price: f64,
    policy: ZeroPricePolicy,
) -> f64 {
    match strategy {
        Strategy::MaxScore => score,
        Strategy::MaxScorePerCost => efficiency(score, price, policy),
    }
}

#[derive(Debug, Clone)]
pub struct Formulation {
    pub program: SelectionProgram,
    /// `candidate_rows[i]` is the dataset row behind program item `i`.
    pub candidate_rows: Vec<usize>,
    /// Required ids that matched no selectable candidate.
    pub unmatched_required: Vec<String>,
}

/// Builds the program. Returns `None` when the quota alone already exceeds the team size,
/// which no assignment can satisfy.
pub fn formulate(
    request: &OptimizationRequest,
    dataset: &ScoredDataset,
    zero_price: ZeroPricePolicy,
) -> Option<Formulation> {
    let quota_roles: Vec<Role> = request.role_quota.iter().map(|(role, _)| role).collect();
    let quota_total = request.role_quota.total();
    if quota_total > request.team_size {
        return None;
    }

    // One group per quota role, then a pooled group for every role without a quota.
    let mut group_needs: Vec<u32> = request.role_quota.iter().map(|(_, count)| count).collect();
    let pooled_group = group_needs.len();
    group_needs.push(request.team_size - quota_total);

    let mut items = Vec::new();
    let mut candidate_rows = Vec::new();
    for (row, candidate) in dataset.candidates().iter().enumerate() {
        if request.excluded_ids.contains(&candidate.id) {
            continue;
        }
        let group = quota_roles
            .iter()
            .position(|role| *role == candidate.role)
            .unwrap_or(pooled_group);
        items.push(SelectionItem {
            value: objective_coefficient(
                request.strategy,
                candidate.score,
                candidate.price,
                zero_price,
            ),
            cost: candidate.price,
            group,
            forced: request.required_ids.contains(&candidate.id),
        });
        candidate_rows.push(row);
    }

    let unmatched_required: Vec<String> = request
        .required_ids
        .iter()
        .filter(|id| {
            !candidate_rows
                .iter()
                .any(|row| dataset.candidates()[*row].id == **id)
        })
        .cloned()
        .collect();
    if !unmatched_required.is_empty() {
        warn!(ids = ?unmatched_required, "required ids not among selectable candidates; ignoring");
    }

    Some(Formulation {
        program: SelectionProgram {
            items,
            group_needs,
            capacity: request.budget,
        },
        candidate_rows,
        unmatched_required,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::candidate::{Attributes, Candidate};
    use crate::optimizer::request::RoleQuota;

    fn candidate(id: &str, role: Role, price: f64, score: f64) -> Candidate {
        Candidate {
            id: id.to_string(),
            role,
            price,
            attributes: Attributes::default(),
            score,
        }
    }

    #[test]
    fn efficiency_divides_by_positive_price() {
        assert_eq!(efficiency(60.0, 5.0, ZeroPricePolicy::default()), 12.0);
    }

    #[test]
    fn zero_price_policy_is_explicit() {
        assert_eq!(efficiency(5.0, 0.0, ZeroPricePolicy::default()), 5000.0);
        assert_eq!(efficiency(5.0, 0.0, ZeroPricePolicy::ScaledScore { factor: 10.0 }), 50.0);
        assert_eq!(efficiency(0.0, 0.0, ZeroPricePolicy::default()), 0.0);
        assert_eq!(efficiency(-3.0, 0.0, ZeroPricePolicy::default()), 0.0);
        assert_eq!(efficiency(5.0, 0.0, ZeroPricePolicy::Ignore), 0.0);
    }

    #[test]
    fn excluded_candidates_get_no_variable() {
        let dataset = ScoredDataset::new(vec![
            candidate("a", Role::Bat, 5.0, 10.0),
            candidate("b", Role::Bat, 5.0, 20.0),
            candidate("c", Role::Wk, 5.0, 30.0),
        ]);
        let request = OptimizationRequest::new(50.0, 2, Strategy::MaxScore)
            .with_quota(RoleQuota::from_labels([("BAT", 1)]).unwrap())
            .excluding(["b"])
            .requiring(["c", "ghost"]);
        let formulation = formulate(&request, &dataset, ZeroPricePolicy::default()).unwrap();

        assert_eq!(formulation.candidate_rows, vec![0, 2]);
        assert_eq!(formulation.program.group_needs, vec![1, 1]);
        assert_eq!(formulation.program.items[0].group, 0);
        assert_eq!(formulation.program.items[1].group, 1);
        assert!(formulation.program.items[1].forced);
        assert_eq!(formulation.unmatched_required, vec!["ghost".to_string()]);
    }

    #[test]
    fn quota_larger_than_team_cannot_be_formulated() {
        let dataset = ScoredDataset::new(vec![candidate("a", Role::Bat, 5.0, 10.0)]);
        let request = OptimizationRequest::new(50.0, 3, Strategy::MaxScore);
        assert!(formulate(&request, &dataset, ZeroPricePolicy::default()).is_none());
    }
}
