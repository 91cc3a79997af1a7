use serde::Serialize;

use crate::error::OptimizeError;
use crate::server::api::{self, ApiError, ValidationErrorResponse};
use crate::server::AppState;

pub struct HttpResponse {
    pub status_code: u16,
    pub status_text: &'static str,
    pub content_type: &'static str,
    pub body: String,
}

impl HttpResponse {
    fn ok(body: String) -> Self {
        Self {
            status_code: 200,
            status_text: "OK",
            content_type: "application/json",
            body,
        }
    }

    pub fn internal_error(message: &str) -> Self {
        error_response(500, "Internal Server Error", "unexpected", message)
    }
}

/// Dispatches one request. `path` may carry a query string.
pub fn route_request(state: &AppState, method: &str, path: &str, body: &str) -> HttpResponse {
    let (route, query) = path.split_once('?').unwrap_or((path, ""));
    let outcome = match (method, route) {
        ("GET", "/") => api::service_info_payload(state),
        ("GET", "/api/health") => api::health_payload(state),
        ("GET", "/api/players") => api::players_payload(state, query),
        ("POST", "/api/optimize") => api::optimize_payload(state, body),
        ("POST", "/api/players/reload") => api::reload_payload(state),
        ("DELETE", "/api/cache") => api::clear_cache_payload(state),
        _ => return error_response(404, "Not Found", "not_found", "Route not found"),
    };

    match outcome {
        Ok(payload) => HttpResponse::ok(payload),
        Err(ApiError::Parse(err)) => error_response(
            400,
            "Bad Request",
            "bad_request",
            &format!("Invalid request body: {err}"),
        ),
        Err(ApiError::Encode(err)) => HttpResponse::internal_error(&err.to_string()),
        Err(ApiError::Optimize(err)) => optimize_error_response(err),
    }
}

/// Transport mapping for pipeline failures: caller mistakes and unsatisfiable requests are
/// 400, broken data and internal faults are 500.
fn optimize_error_response(err: OptimizeError) -> HttpResponse {
    match err {
        OptimizeError::BadRequest(issues) => {
            json_response(400, "Bad Request", &ValidationErrorResponse::new(issues))
        }
        OptimizeError::Infeasible(_) | OptimizeError::Optimization { .. } => {
            error_response(400, "Bad Request", err.kind(), &err.to_string())
        }
        OptimizeError::DataIntegrity(_) | OptimizeError::Unexpected(_) => {
            error_response(500, "Internal Server Error", err.kind(), &err.to_string())
        }
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    status: &'static str,
    kind: &'a str,
    message: &'a str,
}

fn error_response(
    status_code: u16,
    status_text: &'static str,
    kind: &str,
    message: &str,
) -> HttpResponse {
    json_response(
        status_code,
        status_text,
        &ErrorBody {
            status: "error",
            kind,
            message,
        },
    )
}

fn json_response<T: Serialize>(
    status_code: u16,
    status_text: &'static str,
    payload: &T,
) -> HttpResponse {
    let fallback = "{\n  \"status\": \"error\",\n  \"message\": \"Unknown error\"\n}".to_string();
    HttpResponse {
        status_code,
        status_text,
        content_type: "application/json",
        body: serde_json::to_string_pretty(payload).unwrap_or(fallback),
    }
}
