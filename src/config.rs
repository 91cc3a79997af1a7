//! Runtime settings, read once from `ROSTER_*` environment variables.

use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::warn;

use crate::data::loader::DEFAULT_PLAYERS_CSV_PATH;
use crate::data::store::DEFAULT_STORE_PATH;
use crate::optimizer::request::DEFAULT_MAX_TEAM_SIZE;
use crate::optimizer::solver::SolverConfig;
use crate::optimizer::{OptimizationEngine, OptimizationService, ResultCache, ZeroPricePolicy};

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8000";

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub bind_addr: String,
    pub players_csv: PathBuf,
    pub store_path: PathBuf,
    pub cache_enabled: bool,
    pub auto_sync: bool,
    pub max_team_size: u32,
    pub solver: SolverConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            players_csv: PathBuf::from(DEFAULT_PLAYERS_CSV_PATH),
            store_path: PathBuf::from(DEFAULT_STORE_PATH),
            cache_enabled: true,
            auto_sync: true,
            max_team_size: DEFAULT_MAX_TEAM_SIZE,
            solver: SolverConfig::default(),
        }
    }
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds settings from an arbitrary key lookup; unset keys keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            bind_addr: lookup("ROSTER_BIND").unwrap_or(defaults.bind_addr),
            players_csv: lookup("ROSTER_PLAYERS_CSV")
                .map(PathBuf::from)
                .unwrap_or(defaults.players_csv),
            store_path: lookup("ROSTER_STORE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.store_path),
            cache_enabled: parse_bool(lookup("ROSTER_CACHE_ENABLED"), defaults.cache_enabled),
            auto_sync: parse_bool(lookup("ROSTER_AUTO_SYNC"), defaults.auto_sync),
            max_team_size: parse_number(
                "ROSTER_MAX_TEAM_SIZE",
                lookup("ROSTER_MAX_TEAM_SIZE"),
                defaults.max_team_size,
            ),
            solver: SolverConfig {
                max_nodes: lookup("ROSTER_SOLVER_MAX_NODES")
                    .and_then(|raw| match raw.trim().parse::<u64>() {
                        Ok(value) => Some(value),
                        Err(_) => {
                            warn!(
                                value = %raw,
                                "invalid ROSTER_SOLVER_MAX_NODES; searching without a node cap"
                            );
                            None
                        }
                    }),
                verbose: parse_bool(lookup("ROSTER_SOLVER_VERBOSE"), false),
            },
        }
    }

    /// Fresh engine and cache wired to these settings.
    pub fn optimization_service(&self) -> OptimizationService {
        OptimizationService::new(
            OptimizationEngine::new(self.solver, ZeroPricePolicy::default()),
            Arc::new(ResultCache::new(self.cache_enabled)),
        )
    }
}

fn parse_bool(raw: Option<String>, default: bool) -> bool {
    match raw {
        Some(value) => matches!(
            value.trim().to_ascii_lowercase().as_str(),
            "true" | "1" | "t" | "yes"
        ),
        None => default,
    }
}

fn parse_number<T: std::str::FromStr + Copy + std::fmt::Display>(
    name: &str,
    raw: Option<String>,
    default: T,
) -> T {
    raw.and_then(|value| value.trim().parse::<T>().ok().or_else(|| {
        warn!(variable = name, value = %value, "invalid number, defaulting to {default}");
        None
    }))
    .unwrap_or(default)
}
