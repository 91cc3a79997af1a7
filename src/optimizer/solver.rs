//! Exact 0/1 solver for grouped-cardinality knapsacks:
//!
//! ```text
//! maximize   Σ value_i · x_i
//! subject to Σ cost_i · x_i <= capacity
//!            Σ_{i in g} x_i  = need_g      for every group g
//!            x_i = 1                        for every forced item
//!            x_i ∈ {0, 1}
//! ```
//!
//! Depth-first branch-and-bound. Items are visited group by group, best value first, and the
//! include branch is explored before the exclude branch. Nodes are pruned when the cheapest
//! completion exceeds the remaining capacity, or when a Lagrangian bound on the budget row
//! cannot beat the incumbent. The search order is fixed, so the same program always yields
//! the same solution; among equal-objective solutions the first one found is kept.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

const TERNARY_ITERATIONS: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectionItem {
    pub value: f64,
    pub cost: f64,
    pub group: usize,
    pub forced: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectionProgram {
    pub items: Vec<SelectionItem>,
    /// Exact number of items to pick from each group.
    pub group_needs: Vec<u32>,
    pub capacity: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SolveStatus {
    Optimal,
    Infeasible,
    /// The node cap was reached before optimality was proven.
    NodeLimit,
}

impl SolveStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Optimal => "Optimal",
            Self::Infeasible => "Infeasible",
            Self::NodeLimit => "NodeLimit",
        }
    }
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolverConfig {
    /// Abort after this many search nodes. `None` searches to completion.
    pub max_nodes: Option<u64>,
    /// Emit search diagnostics at debug level.
    pub verbose: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    pub status: SolveStatus,
    /// Indices into [SelectionProgram::items], ascending. Empty unless optimal.
    pub selected: Vec<usize>,
    pub objective: f64,
    pub nodes: u64,
}

impl Solution {
    fn without_solution(status: SolveStatus, nodes: u64) -> Self {
        Self {
            status,
            selected: Vec::new(),
            objective: 0.0,
            nodes,
        }
    }
}

pub fn solve(program: &SelectionProgram, config: &SolverConfig) -> Solution {
    let group_count = program.group_needs.len();
    let mut needs: Vec<i64> = program.group_needs.iter().map(|n| i64::from(*n)).collect();
    let mut capacity = program.capacity;
    let mut base_objective = 0.0;
    let mut forced = Vec::new();
    let mut groups: Vec<Vec<usize>> = vec![Vec::new(); group_count];

    for (index, item) in program.items.iter().enumerate() {
        if item.group >= group_count {
            // Items outside every group can never be part of an exact-count selection.
            if item.forced {
                return Solution::without_solution(SolveStatus::Infeasible, 0);
            }
            continue;
        }
        if item.forced {
            needs[item.group] -= 1;
            capacity -= item.cost;
            base_objective += item.value;
            forced.push(index);
        } else {
            groups[item.group].push(index);
        }
    }

    let tolerance = tolerance_for(program.capacity);
    if needs.iter().any(|need| *need < 0) || capacity < -tolerance {
        return Solution::without_solution(SolveStatus::Infeasible, 0);
    }
    let needs: Vec<usize> = needs.into_iter().map(|need| need as usize).collect();
    if groups.iter().zip(&needs).any(|(members, need)| members.len() < *need) {
        return Solution::without_solution(SolveStatus::Infeasible, 0);
    }

    for members in &mut groups {
        members.sort_by(|a, b| {
            let (left, right) = (&program.items[*a], &program.items[*b]);
            right
                .value
                .total_cmp(&left.value)
                .then_with(|| left.cost.total_cmp(&right.cost))
                .then_with(|| a.cmp(b))
        });
    }

    let lambda = root_multiplier(&program.items, &groups, &needs, capacity);
    let lambdas = if lambda > 0.0 { vec![0.0, lambda] } else { vec![0.0] };
    let suffix_bounds: Vec<Vec<f64>> = lambdas
        .iter()
        .map(|lambda| {
            suffix_sums(&groups, |g| {
                best_adjusted(&program.items, &groups[g], needs[g], *lambda)
            })
        })
        .collect();
    let suffix_min_cost =
        suffix_sums(&groups, |g| cheapest_cost(&program.items, &groups[g], needs[g]));

    let mut search = Search {
        items: &program.items,
        groups: &groups,
        needs: &needs,
        lambdas,
        suffix_bounds,
        suffix_min_cost,
        tolerance,
        config,
        nodes: 0,
        aborted: false,
        chosen: Vec::new(),
        best: None,
    };
    search.descend(0, 0, needs.first().copied().unwrap_or(0), capacity, 0.0);

    let nodes = search.nodes;
    let aborted = search.aborted;
    let best = search.best.take();
    if config.verbose {
        debug!(nodes, aborted, lambda, found = best.is_some(), "branch-and-bound finished");
    }

    if aborted {
        return Solution::without_solution(SolveStatus::NodeLimit, nodes);
    }
    match best {
        Some((objective, chosen)) => {
            let mut selected = forced;
            selected.extend(chosen);
            selected.sort_unstable();
            Solution {
                status: SolveStatus::Optimal,
                selected,
                objective: base_objective + objective,
                nodes,
            }
        }
        None => Solution::without_solution(SolveStatus::Infeasible, nodes),
    }
}

struct Search<'a> {
    items: &'a [SelectionItem],
    groups: &'a [Vec<usize>],
    needs: &'a [usize],
    lambdas: Vec<f64>,
    /// `suffix_bounds[l][g]`: Lagrangian bound at `lambdas[l]` for groups `g..`, budget term
    /// excluded.
    suffix_bounds: Vec<Vec<f64>>,
    suffix_min_cost: Vec<f64>,
    tolerance: f64,
    config: &'a SolverConfig,
    nodes: u64,
    aborted: bool,
    chosen: Vec<usize>,
    best: Option<(f64, Vec<usize>)>,
}

impl Search<'_> {
    fn descend(
        &mut self,
        group: usize,
        position: usize,
        need: usize,
        capacity: f64,
        objective: f64,
    ) {
        if self.aborted {
            return;
        }
        self.nodes += 1;
        if let Some(max_nodes) = self.config.max_nodes {
            if self.nodes > max_nodes {
                self.aborted = true;
                return;
            }
        }

        if group == self.groups.len() {
            self.offer(objective);
            return;
        }
        if need == 0 {
            let next_need = self.needs.get(group + 1).copied().unwrap_or(0);
            self.descend(group + 1, 0, next_need, capacity, objective);
            return;
        }

        let remaining = &self.groups[group][position..];
        if remaining.len() < need {
            return;
        }
        let min_cost = cheapest_cost(self.items, remaining, need) + self.suffix_min_cost[group + 1];
        if min_cost > capacity + self.tolerance {
            return;
        }
        if let Some((best, _)) = &self.best {
            let bound = objective + self.bound(group, remaining, need, capacity);
            if bound <= *best + objective_tolerance(*best) {
                return;
            }
        }

        let index = remaining[0];
        let item = self.items[index];
        if item.cost <= capacity + self.tolerance {
            self.chosen.push(index);
            self.descend(
                group,
                position + 1,
                need - 1,
                capacity - item.cost,
                objective + item.value,
            );
            self.chosen.pop();
        }
        self.descend(group, position + 1, need, capacity, objective);
    }

    fn bound(&self, group: usize, remaining: &[usize], need: usize, capacity: f64) -> f64 {
        self.lambdas
            .iter()
            .zip(&self.suffix_bounds)
            .map(|(lambda, suffix)| {
                lambda * capacity.max(0.0)
                    + best_adjusted(self.items, remaining, need, *lambda)
                    + suffix[group + 1]
            })
            .fold(f64::INFINITY, f64::min)
    }

    fn offer(&mut self, objective: f64) {
        let improves = match &self.best {
            None => true,
            Some((best, _)) => objective > *best + objective_tolerance(*best),
        };
        if improves {
            if self.config.verbose {
                trace!(objective, nodes = self.nodes, "new incumbent");
            }
            self.best = Some((objective, self.chosen.clone()));
        }
    }
}

/// Minimizes the root Lagrangian bound over the budget multiplier. The bound is convex in
/// the multiplier, so a ternary search converges.
fn root_multiplier(
    items: &[SelectionItem],
    groups: &[Vec<usize>],
    needs: &[usize],
    capacity: f64,
) -> f64 {
    let upper = groups
        .iter()
        .flatten()
        .map(|index| &items[*index])
        .filter(|item| item.cost > 0.0)
        .map(|item| item.value / item.cost)
        .fold(0.0_f64, f64::max);
    if upper <= 0.0 {
        return 0.0;
    }

    let root_bound = |lambda: f64| {
        lambda * capacity.max(0.0)
            + groups
                .iter()
                .zip(needs)
                .map(|(members, need)| best_adjusted(items, members, *need, lambda))
                .sum::<f64>()
    };

    let (mut low, mut high) = (0.0, upper);
    for _ in 0..TERNARY_ITERATIONS {
        let left = low + (high - low) / 3.0;
        let right = high - (high - low) / 3.0;
        if root_bound(left) <= root_bound(right) {
            high = right;
        } else {
            low = left;
        }
    }
    (low + high) / 2.0
}

/// Sum of the `need` largest `value - lambda * cost` among `members`.
fn best_adjusted(items: &[SelectionItem], members: &[usize], need: usize, lambda: f64) -> f64 {
    if need == 0 {
        return 0.0;
    }
    let mut adjusted: Vec<f64> = members
        .iter()
        .map(|index| items[*index].value - lambda * items[*index].cost)
        .collect();
    adjusted.sort_by(|a, b| b.total_cmp(a));
    adjusted.iter().take(need).sum()
}

fn cheapest_cost(items: &[SelectionItem], members: &[usize], need: usize) -> f64 {
    if need == 0 {
        return 0.0;
    }
    let mut costs: Vec<f64> = members.iter().map(|index| items[*index].cost).collect();
    costs.sort_by(f64::total_cmp);
    costs.iter().take(need).sum()
}

/// `out[g] = Σ_{h >= g} per_group(h)`, with a trailing zero.
fn suffix_sums(groups: &[Vec<usize>], per_group: impl Fn(usize) -> f64) -> Vec<f64> {
    let mut sums = vec![0.0; groups.len() + 1];
    for group in (0..groups.len()).rev() {
        sums[group] = sums[group + 1] + per_group(group);
    }
    sums
}

fn tolerance_for(capacity: f64) -> f64 {
    1e-9 * (1.0 + capacity.abs())
}

fn objective_tolerance(best: f64) -> f64 {
    1e-9 * (1.0 + best.abs())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(value: f64, cost: f64, group: usize) -> SelectionItem {
        SelectionItem {
            value,
            cost,
            group,
            forced: false,
        }
    }

    fn brute_force(program: &SelectionProgram) -> Option<f64> {
        let n = program.items.len();
        let mut best: Option<f64> = None;
        for mask in 0u32..(1 << n) {
            let mut counts = vec![0u32; program.group_needs.len()];
            let (mut cost, mut value, mut valid) = (0.0, 0.0, true);
            for (i, item) in program.items.iter().enumerate() {
                let picked = mask & (1 << i) != 0;
                if item.forced && !picked {
                    valid = false;
                }
                if picked {
                    counts[item.group] += 1;
                    cost += item.cost;
                    value += item.value;
                }
            }
            if valid && counts == program.group_needs && cost <= program.capacity + 1e-9 {
                best = Some(best.map_or(value, |b: f64| b.max(value)));
            }
        }
        best
    }

    #[test]
    fn picks_best_value_within_capacity() {
        let program = SelectionProgram {
            items: vec![item(100.0, 10.0, 0), item(60.0, 5.0, 0), item(60.0, 5.0, 0)],
            group_needs: vec![2],
            capacity: 20.0,
        };
        let solution = solve(&program, &SolverConfig::default());
        assert_eq!(solution.status, SolveStatus::Optimal);
        assert_eq!(solution.objective, 160.0);
        assert!(solution.selected.contains(&0));
        assert_eq!(solution.selected.len(), 2);
    }

    #[test]
    fn capacity_forces_cheaper_choice() {
        let program = SelectionProgram {
            items: vec![item(100.0, 10.0, 0), item(60.0, 5.0, 0), item(55.0, 5.0, 0)],
            group_needs: vec![2],
            capacity: 10.0,
        };
        let solution = solve(&program, &SolverConfig::default());
        assert_eq!(solution.selected, vec![1, 2]);
        assert_eq!(solution.objective, 115.0);
    }

    #[test]
    fn forced_items_are_always_selected() {
        let program = SelectionProgram {
            items: vec![
                item(100.0, 10.0, 0),
                SelectionItem {
                    forced: true,
                    ..item(1.0, 1.0, 0)
                },
                item(50.0, 5.0, 0),
            ],
            group_needs: vec![2],
            capacity: 20.0,
        };
        let solution = solve(&program, &SolverConfig::default());
        assert_eq!(solution.selected, vec![0, 1]);
        assert_eq!(solution.objective, 101.0);
    }

    #[test]
    fn infeasible_programs_report_status() {
        let too_few = SelectionProgram {
            items: vec![item(1.0, 1.0, 0)],
            group_needs: vec![2],
            capacity: 10.0,
        };
        assert_eq!(solve(&too_few, &SolverConfig::default()).status, SolveStatus::Infeasible);

        let too_expensive = SelectionProgram {
            items: vec![item(1.0, 6.0, 0), item(1.0, 6.0, 0)],
            group_needs: vec![2],
            capacity: 11.0,
        };
        let solution = solve(&too_expensive, &SolverConfig::default());
        assert_eq!(solution.status, SolveStatus::Infeasible);
        assert!(solution.selected.is_empty());
    }

    #[test]
    fn node_limit_is_not_optimal() {
        let program = SelectionProgram {
            items: (0..12).map(|i| item(10.0 + i as f64, 3.0 + (i % 4) as f64, i % 3)).collect(),
            group_needs: vec![2, 2, 2],
            capacity: 25.0,
        };
        let config = SolverConfig {
            max_nodes: Some(3),
            verbose: false,
        };
        assert_eq!(solve(&program, &config).status, SolveStatus::NodeLimit);
    }

    #[test]
    fn matches_brute_force_on_mixed_groups() {
        let values = [31.0, 18.0, 44.0, 27.0, 12.0, 39.0, 25.0, 33.0, 20.0, 41.0, 15.0, 29.0];
        let costs = [7.0, 3.5, 9.0, 6.0, 2.0, 8.5, 5.0, 7.5, 4.0, 9.5, 3.0, 6.5];
        for capacity in [18.0, 24.0, 30.0, 36.0, 60.0] {
            let program = SelectionProgram {
                items: values
                    .iter()
                    .zip(costs)
                    .enumerate()
                    .map(|(i, (value, cost))| item(*value, cost, i % 3))
                    .collect(),
                group_needs: vec![1, 2, 1],
                capacity,
            };
            let expected = brute_force(&program);
            let solution = solve(&program, &SolverConfig::default());
            match expected {
                Some(best) => {
                    assert_eq!(solution.status, SolveStatus::Optimal, "capacity {capacity}");
                    assert!((solution.objective - best).abs() < 1e-9, "capacity {capacity}");
                }
                None => assert_eq!(solution.status, SolveStatus::Infeasible),
            }
        }
    }

    #[test]
    fn same_program_same_solution() {
        let program = SelectionProgram {
            items: (0..10).map(|i| item(50.0, 5.0 + (i % 2) as f64, i % 2)).collect(),
            group_needs: vec![2, 3],
            capacity: 40.0,
        };
        let first = solve(&program, &SolverConfig::default());
        let second = solve(&program, &SolverConfig::default());
        assert_eq!(first, second);
    }
}
