//! Candidate scoring: a pure weighted sum over raw attributes.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::data::candidate::{Attributes, Candidate, RawCandidate};
use crate::data::dataset::ScoredDataset;

pub trait Scorer: Sync {
    fn score(&self, attributes: &Attributes) -> f64;
}

/// `score = primary * runs + secondary * wickets + tertiary * strike_rate`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringFormula {
    pub primary_weight: f64,
    pub secondary_weight: f64,
    pub tertiary_weight: f64,
}

impl Default for ScoringFormula {
    fn default() -> Self {
        Self {
            primary_weight: 0.5,
            secondary_weight: 20.0,
            tertiary_weight: 0.3,
        }
    }
}

impl Scorer for ScoringFormula {
    fn score(&self, attributes: &Attributes) -> f64 {
        attributes.runs * self.primary_weight
            + attributes.wickets * self.secondary_weight
            + attributes.strike_rate * self.tertiary_weight
    }
}

pub fn score_candidate(raw: &RawCandidate, scorer: &impl Scorer) -> Candidate {
    Candidate {
        id: raw.id.clone(),
        role: raw.role,
        price: raw.price,
        attributes: raw.attributes,
        score: scorer.score(&raw.attributes),
    }
}

impl ScoredDataset {
    /// Scores every row into a fresh snapshot. Row order is preserved.
    pub fn score(raw: &[RawCandidate], scorer: &impl Scorer) -> Self {
        let candidates: Vec<Candidate> = raw
            .par_iter()
            .map(|candidate| score_candidate(candidate, scorer))
            .collect();
        Self::new(candidates)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct TeamStats {
    pub total_runs: f64,
    pub total_wickets: f64,
    pub avg_strike_rate: f64,
}

pub fn team_stats(selected: &[Candidate]) -> TeamStats {
    if selected.is_empty() {
        return TeamStats::default();
    }
    let total_runs = selected.iter().map(|c| c.attributes.runs).sum();
    let total_wickets = selected.iter().map(|c| c.attributes.wickets).sum();
    let strike_rate_sum: f64 = selected.iter().map(|c| c.attributes.strike_rate).sum();
    TeamStats {
        total_runs,
        total_wickets,
        avg_strike_rate: strike_rate_sum / selected.len() as f64,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::candidate::Role;

    fn raw() -> RawCandidate {
        RawCandidate {
            id: "Jadeja".to_string(),
            role: Role::All,
            price: 11.0,
            attributes: Attributes {
                runs: 300.0,
                wickets: 15.0,
                strike_rate: 130.0,
            },
        }
    }

    #[test]
    fn default_formula_weights() {
        let score = ScoringFormula::default().score(&raw().attributes);
        assert!((score - (150.0 + 300.0 + 39.0)).abs() < 1e-9);
    }

    #[test]
    fn scoring_is_deterministic_and_leaves_input_untouched() {
        let input = raw();
        let before = input.clone();
        let first = score_candidate(&input, &ScoringFormula::default());
        let second = score_candidate(&input, &ScoringFormula::default());
        assert_eq!(first, second);
        assert_eq!(input, before);
        assert_eq!(first.id, "Jadeja");
    }

    #[test]
    fn custom_weights_are_pluggable() {
        let runs_only = ScoringFormula {
            primary_weight: 1.0,
            secondary_weight: 0.0,
            tertiary_weight: 0.0,
        };
        assert_eq!(score_candidate(&raw(), &runs_only).score, 300.0);
    }

    #[test]
    fn dataset_scoring_preserves_row_order() {
        let mut second = raw();
        second.id = "Pandya".to_string();
        let dataset = ScoredDataset::score(&[raw(), second], &ScoringFormula::default());
        let ids: Vec<&str> = dataset.candidates().iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["Jadeja", "Pandya"]);
    }

    #[test]
    fn team_stats_of_empty_roster_are_zero() {
        assert_eq!(team_stats(&[]), TeamStats::default());
        let stats = team_stats(&[score_candidate(&raw(), &ScoringFormula::default())]);
        assert_eq!(stats.total_wickets, 15.0);
        assert_eq!(stats.avg_strike_rate, 130.0);
    }
}
