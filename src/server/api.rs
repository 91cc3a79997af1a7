use std::time::Instant;

use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::data::candidate::{Candidate, Role};
use crate::error::{FieldIssue, OptimizeError};
use crate::optimizer::{OptimizeParams, RosterResult};
use crate::server::AppState;

#[derive(Debug, Clone, Serialize)]
pub struct ValidationErrorResponse {
    pub status: &'static str,
    pub message: &'static str,
    pub errors: Vec<FieldIssue>,
}

impl ValidationErrorResponse {
    pub fn new(errors: Vec<FieldIssue>) -> Self {
        Self {
            status: "error",
            message: "Validation failed",
            errors,
        }
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid request body: {0}")]
    Parse(serde_json::Error),
    #[error("failed to encode response: {0}")]
    Encode(serde_json::Error),
    #[error(transparent)]
    Optimize(#[from] OptimizeError),
}

#[derive(Debug, Serialize)]
struct OptimizeResponse<'a> {
    #[serde(flatten)]
    result: &'a RosterResult,
    data_source: &'static str,
    dataset_fingerprint: &'a str,
    duration_ms: u128,
}

#[derive(Debug, Serialize)]
struct PlayersResponse<'a> {
    count: usize,
    data_source: &'static str,
    players: Vec<&'a Candidate>,
}

fn to_json<T: Serialize>(value: &T) -> Result<String, ApiError> {
    serde_json::to_string_pretty(value).map_err(ApiError::Encode)
}

pub fn service_info_payload(state: &AppState) -> Result<String, ApiError> {
    let dataset = state.dataset();
    to_json(&serde_json::json!({
        "service": "roster-optimizer",
        "version": env!("CARGO_PKG_VERSION"),
        "data_source": state.source_name(),
        "candidates": dataset.len(),
        "dataset_fingerprint": dataset.fingerprint(),
        "cache_enabled": state.service().cache().is_enabled(),
        "endpoints": [
            "GET /api/health",
            "GET /api/players",
            "POST /api/optimize",
            "POST /api/players/reload",
            "DELETE /api/cache"
        ]
    }))
}

pub fn health_payload(state: &AppState) -> Result<String, ApiError> {
    to_json(&serde_json::json!({
        "status": "ok",
        "candidates": state.dataset().len(),
        "cache_entries": state.service().cache().len(),
        "solves": state.service().engine().solve_count()
    }))
}

/// `GET /api/players[?role=BAT]`
pub fn players_payload(state: &AppState, query: &str) -> Result<String, ApiError> {
    let role = match query_param(query, "role") {
        Some(raw) => Some(
            raw.parse::<Role>()
                .map_err(|err| OptimizeError::bad_request("role", err.to_string()))?,
        ),
        None => None,
    };
    let dataset = state.dataset();
    let players: Vec<&Candidate> = dataset
        .candidates()
        .iter()
        .filter(|candidate| role.map_or(true, |role| candidate.role == role))
        .collect();
    to_json(&PlayersResponse {
        count: players.len(),
        data_source: state.source_name(),
        players,
    })
}

pub fn optimize_payload(state: &AppState, body: &str) -> Result<String, ApiError> {
    let params: OptimizeParams = serde_json::from_str(body).map_err(ApiError::Parse)?;
    let request = params.into_request(state.settings().max_team_size)?;
    let dataset = state.dataset();

    let started = Instant::now();
    let result = state.service().run(&request, &dataset)?;
    let duration_ms = started.elapsed().as_millis();
    info!(
        budget = request.budget,
        team_size = request.team_size,
        strategy = %request.strategy,
        total_cost = result.total_cost,
        total_score = result.total_score,
        duration_ms,
        "optimize request served"
    );

    to_json(&OptimizeResponse {
        result: &result,
        data_source: state.source_name(),
        dataset_fingerprint: dataset.fingerprint(),
        duration_ms,
    })
}

pub fn reload_payload(state: &AppState) -> Result<String, ApiError> {
    let count = state.reload().map_err(OptimizeError::from)?;
    to_json(&serde_json::json!({
        "status": "ok",
        "data_source": state.source_name(),
        "candidates": count,
        "dataset_fingerprint": state.dataset().fingerprint()
    }))
}

pub fn clear_cache_payload(state: &AppState) -> Result<String, ApiError> {
    let cleared = state.service().cache().clear();
    info!(cleared, "result cache cleared");
    to_json(&serde_json::json!({ "status": "ok", "cleared": cleared }))
}

fn query_param<'a>(query: &'a str, name: &str) -> Option<&'a str> {
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| key.trim() == name)
        .map(|(_, value)| value.trim())
        .filter(|value| !value.is_empty())
}
