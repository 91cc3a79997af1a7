//! Immutable scored snapshot plus its content fingerprint.

use std::collections::BTreeMap;

use sha2::{Digest, Sha256};

use crate::data::candidate::{Candidate, Role};

#[derive(Debug, Clone)]
pub struct ScoredDataset {
    candidates: Vec<Candidate>,
    fingerprint: String,
}

impl ScoredDataset {
    pub fn new(candidates: Vec<Candidate>) -> Self {
        let fingerprint = fingerprint_candidates(&candidates);
        Self {
            candidates,
            fingerprint,
        }
    }

    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Candidate> {
        self.candidates.iter().find(|candidate| candidate.id == id)
    }

    /// Number of candidates per role; roles with no candidates are absent.
    pub fn role_counts(&self) -> BTreeMap<Role, u32> {
        let mut counts = BTreeMap::new();
        for candidate in &self.candidates {
            *counts.entry(candidate.role).or_insert(0) += 1;
        }
        counts
    }
}

/// SHA-256 over every field of every row, in row order.
pub fn fingerprint_candidates(candidates: &[Candidate]) -> String {
    let mut hasher = Sha256::new();
    hasher.update((candidates.len() as u64).to_le_bytes());
    for candidate in candidates {
        hasher.update((candidate.id.len() as u64).to_le_bytes());
        hasher.update(candidate.id.as_bytes());
        hasher.update(candidate.role.as_str().as_bytes());
        hasher.update(candidate.price.to_bits().to_le_bytes());
        hasher.update(candidate.score.to_bits().to_le_bytes());
        hasher.update(candidate.attributes.runs.to_bits().to_le_bytes());
        hasher.update(candidate.attributes.wickets.to_bits().to_le_bytes());
        hasher.update(candidate.attributes.strike_rate.to_bits().to_le_bytes());
    }
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::candidate::Attributes;

    fn candidate(id: &str, price: f64, score: f64) -> Candidate {
        Candidate {
            id: id.to_string(),
            role: Role::Bat,
            price,
            attributes: Attributes::default(),
            score,
        }
    }

    #[test]
    fn fingerprint_is_stable_for_identical_content() {
        let a = ScoredDataset::new(vec![candidate("a", 5.0, 10.0), candidate("b", 6.0, 11.0)]);
        let b = ScoredDataset::new(vec![candidate("a", 5.0, 10.0), candidate("b", 6.0, 11.0)]);
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.fingerprint().len(), 64);
    }

    #[test]
    fn fingerprint_tracks_values_and_row_order() {
        let base =
            ScoredDataset::new(vec![candidate("a", 5.0, 10.0), candidate("b", 6.0, 11.0)]);
        let reordered =
            ScoredDataset::new(vec![candidate("b", 6.0, 11.0), candidate("a", 5.0, 10.0)]);
        let repriced =
            ScoredDataset::new(vec![candidate("a", 5.5, 10.0), candidate("b", 6.0, 11.0)]);
        assert_ne!(base.fingerprint(), reordered.fingerprint());
        assert_ne!(base.fingerprint(), repriced.fingerprint());
    }

    #[test]
    fn role_counts_only_lists_present_roles() {
        let dataset =
            ScoredDataset::new(vec![candidate("a", 5.0, 10.0), candidate("b", 6.0, 11.0)]);
        let counts = dataset.role_counts();
        assert_eq!(counts.get(&Role::Bat), Some(&2));
        assert!(!counts.contains_key(&Role::Wk));
    }
}
