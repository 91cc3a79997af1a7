use std::sync::{Arc, PoisonError, RwLock};

use axum::body::Body;
use axum::extract::State;
use axum::http::{header, HeaderName, Method, StatusCode, Uri};
use axum::response::Response;
use axum::Router;
use thiserror::Error;
use tower_http::cors::CorsLayer;
use tracing::{error, info, info_span, Instrument};
use uuid::Uuid;

use crate::config::Settings;
use crate::data::loader::LoadError;
use crate::data::source::{load_dataset, select_source, CandidateSource};
use crate::data::ScoredDataset;
use crate::optimizer::OptimizationService;
use crate::scoring::ScoringFormula;

pub mod api;
pub mod routes;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to load candidate data: {0}")]
    Load(#[from] LoadError),
    #[error("server i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// Everything a request handler needs. The dataset snapshot is swapped whole on reload.
pub struct AppState {
    settings: Settings,
    source: Box<dyn CandidateSource>,
    dataset: RwLock<Arc<ScoredDataset>>,
    service: OptimizationService,
}

impl AppState {
    pub fn load(settings: Settings) -> Result<Self, LoadError> {
        let source = select_source(&settings.players_csv, &settings.store_path, settings.auto_sync);
        Self::with_source(settings, source)
    }

    pub fn with_source(
        settings: Settings,
        source: Box<dyn CandidateSource>,
    ) -> Result<Self, LoadError> {
        let dataset = load_dataset(source.as_ref(), &ScoringFormula::default())?;
        let service = settings.optimization_service();
        Ok(Self {
            settings,
            source,
            dataset: RwLock::new(Arc::new(dataset)),
            service,
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn source_name(&self) -> &'static str {
        self.source.name()
    }

    pub fn service(&self) -> &OptimizationService {
        &self.service
    }

    pub fn dataset(&self) -> Arc<ScoredDataset> {
        Arc::clone(&self.dataset.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Re-reads the source and swaps in a new snapshot. The current snapshot stays in
    /// place when loading fails. Returns the new candidate count.
    pub fn reload(&self) -> Result<usize, LoadError> {
        let fresh = load_dataset(self.source.as_ref(), &ScoringFormula::default())?;
        let count = fresh.len();
        *self.dataset.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(fresh);
        let cleared = self.service.cache().clear();
        info!(candidates = count, cleared, "candidate data reloaded");
        Ok(count)
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .fallback(dispatch)
        .with_state(state)
        .layer(CorsLayer::permissive())
}

/// Blocks the calling thread on a fresh tokio runtime until ctrl-c.
pub fn run_server(settings: Settings) -> Result<(), ServerError> {
    let bind_addr = settings.bind_addr.clone();
    let state = Arc::new(AppState::load(settings)?);
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(serve(state, &bind_addr))?;
    Ok(())
}

async fn serve(state: Arc<AppState>, bind_addr: &str) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    info!(
        addr = %bind_addr,
        source = state.source_name(),
        "roster optimizer listening"
    );
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "failed to listen for shutdown signal");
    }
    info!("shutting down");
}

async fn dispatch(
    State(state): State<Arc<AppState>>,
    method: Method,
    uri: Uri,
    body: String,
) -> Response {
    let request_id = Uuid::new_v4();
    let path = uri
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| "/".to_string());
    let span = info_span!("request", %request_id, method = %method, path = %uri.path());

    let worker_span = span.clone();
    let method_label = method.as_str().to_string();
    let outcome = tokio::task::spawn_blocking(move || {
        let _entered = worker_span.enter();
        routes::route_request(&state, &method_label, &path, &body)
    })
    .instrument(span.clone())
    .await;

    let response = match outcome {
        Ok(response) => response,
        Err(err) => {
            span.in_scope(|| error!(error = %err, "request worker failed"));
            routes::HttpResponse::internal_error("request worker failed")
        }
    };
    span.in_scope(|| info!(status = response.status_code, "request complete"));
    into_axum(response, request_id)
}

fn into_axum(response: routes::HttpResponse, request_id: Uuid) -> Response {
    let status =
        StatusCode::from_u16(response.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let mut built = Response::new(Body::from(response.body));
    *built.status_mut() = status;
    let headers = built.headers_mut();
    headers.insert(header::CONTENT_TYPE, header::HeaderValue::from_static(response.content_type));
    if let Ok(value) = header::HeaderValue::from_str(&request_id.to_string()) {
        headers.insert(HeaderName::from_static("x-request-id"), value);
    }
    built
}
