//! Memoized optimization results. Unbounded, no expiry; lives as long as its owner.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use sha2::{Digest, Sha256};
use tracing::warn;

use crate::data::dataset::ScoredDataset;
use crate::optimizer::engine::RosterResult;
use crate::optimizer::request::{OptimizationRequest, Strategy};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    budget_bits: u64,
    team_size: u32,
    strategy: Strategy,
    dataset_fingerprint: String,
    /// Digest of quota and id constraints; identical for requests that share them.
    constraints: String,
}

impl CacheKey {
    pub fn new(request: &OptimizationRequest, dataset: &ScoredDataset) -> Self {
        Self {
            budget_bits: request.budget.to_bits(),
            team_size: request.team_size,
            strategy: request.strategy,
            dataset_fingerprint: dataset.fingerprint().to_string(),
            constraints: constraints_digest(request),
        }
    }

    pub fn dataset_fingerprint(&self) -> &str {
        &self.dataset_fingerprint
    }
}

fn constraints_digest(request: &OptimizationRequest) -> String {
    let mut hasher = Sha256::new();
    for (role, count) in request.role_quota.iter() {
        hasher.update(role.as_str().as_bytes());
        hasher.update(count.to_le_bytes());
    }
    hasher.update(b"|excluded");
    for id in &request.excluded_ids {
        hasher.update((id.len() as u64).to_le_bytes());
        hasher.update(id.as_bytes());
    }
    hasher.update(b"|required");
    for id in &request.required_ids {
        hasher.update((id.len() as u64).to_le_bytes());
        hasher.update(id.as_bytes());
    }
    hex::encode(hasher.finalize())
}

#[derive(Debug)]
pub struct ResultCache {
    enabled: bool,
    entries: Mutex<HashMap<CacheKey, Arc<RosterResult>>>,
}

impl Default for ResultCache {
    fn default() -> Self {
        Self::new(true)
    }
}

impl ResultCache {
    /// A disabled cache never stores anything, so every lookup misses.
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// A poisoned lock is treated as a miss.
    pub fn get(&self, key: &CacheKey) -> Option<Arc<RosterResult>> {
        if !self.enabled {
            return None;
        }
        match self.entries.lock() {
            Ok(entries) => entries.get(key).cloned(),
            Err(_) => {
                warn!("result cache lock poisoned; treating lookup as a miss");
                None
            }
        }
    }

    /// Last write wins. Failures are logged and dropped.
    pub fn set(&self, key: CacheKey, result: Arc<RosterResult>) {
        if !self.enabled {
            return;
        }
        match self.entries.lock() {
            Ok(mut entries) => {
                entries.insert(key, result);
            }
            Err(_) => warn!("result cache lock poisoned; result not cached"),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every entry. Returns how many were removed.
    pub fn clear(&self) -> usize {
        match self.entries.lock() {
            Ok(mut entries) => {
                let removed = entries.len();
                entries.clear();
                removed
            }
            Err(_) => 0,
        }
    }
}
