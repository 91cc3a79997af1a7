use std::sync::Arc;

use tracing::info;

use crate::data::dataset::ScoredDataset;
use crate::error::OptimizeResult;
use crate::optimizer::cache::{CacheKey, ResultCache};
use crate::optimizer::engine::{OptimizationEngine, RosterResult};
use crate::optimizer::feasibility;
use crate::optimizer::request::OptimizationRequest;

/// Request pipeline: cache lookup, then on a miss feasibility validation, solve and cache write.
#[derive(Debug)]
pub struct OptimizationService {
    engine: OptimizationEngine,
    cache: Arc<ResultCache>,
}

impl OptimizationService {
    pub fn new(engine: OptimizationEngine, cache: Arc<ResultCache>) -> Self {
        Self { engine, cache }
    }

    pub fn engine(&self) -> &OptimizationEngine {
        &self.engine
    }

    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }

    pub fn run(
        &self,
        request: &OptimizationRequest,
        dataset: &ScoredDataset,
    ) -> OptimizeResult<Arc<RosterResult>> {
        let key = CacheKey::new(request, dataset);
        if let Some(cached) = self.cache.get(&key) {
            info!(
                budget = request.budget,
                team_size = request.team_size,
                strategy = %request.strategy,
                "returning cached optimization result"
            );
            return Ok(cached);
        }

        feasibility::validate(request, dataset)?;
        let result = Arc::new(self.engine.optimize(request, dataset)?);
        self.cache.set(key, Arc::clone(&result));
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::candidate::{Attributes, Candidate, Role};
    use crate::error::OptimizeError;
    use crate::optimizer::request::{RoleQuota, Strategy};

    fn dataset() -> ScoredDataset {
        ScoredDataset::new(
            (0..4)
                .map(|i| Candidate {
                    id: format!("c{i}"),
                    role: Role::Bowl,
                    price: 4.0 + i as f64,
                    attributes: Attributes::default(),
                    score: 40.0 + 3.0 * i as f64,
                })
                .collect(),
        )
    }

    fn request(budget: f64) -> OptimizationRequest {
        OptimizationRequest::new(budget, 2, Strategy::MaxScore)
            .with_quota(RoleQuota::from_labels([("BOWL", 2)]).unwrap())
    }

    #[test]
    fn second_identical_call_is_served_from_cache() {
        let service = OptimizationService::new(
            OptimizationEngine::default(),
            Arc::new(ResultCache::default()),
        );
        let first = service.run(&request(30.0), &dataset()).unwrap();
        let second = service.run(&request(30.0), &dataset()).unwrap();
        assert_eq!(first, second);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(service.engine().solve_count(), 1);
    }

    #[test]
    fn disabled_cache_solves_every_time() {
        let service = OptimizationService::new(
            OptimizationEngine::default(),
            Arc::new(ResultCache::new(false)),
        );
        service.run(&request(30.0), &dataset()).unwrap();
        service.run(&request(30.0), &dataset()).unwrap();
        assert_eq!(service.engine().solve_count(), 2);
    }

    #[test]
    fn infeasible_budget_fails_before_solving() {
        let service = OptimizationService::new(
            OptimizationEngine::default(),
            Arc::new(ResultCache::default()),
        );
        let err = service.run(&request(8.0), &dataset()).unwrap_err();
        assert!(matches!(err, OptimizeError::Infeasible(_)));
        assert_eq!(service.engine().solve_count(), 0);
        assert!(service.cache().is_empty());
    }
}
