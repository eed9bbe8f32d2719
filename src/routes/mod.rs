use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use axum::{
    Json, Router,
    extract::{MatchedPath, State},
    http::HeaderValue,
    middleware,
    routing::get,
};
use serde::Serialize;
use tower_http::{
    cors::CorsLayer,
    trace::{MakeSpan, OnRequest, OnResponse, TraceLayer},
};
use tracing::{Span, field, instrument};

use crate::{
    api::{self, ApiResult},
    catalog::CatalogSnapshot,
    config::AppConfig,
    search::SearchCore,
};

/// Shared application state cloned into each request handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub core: Arc<SearchCore>,
    pub catalog: Arc<CatalogSnapshot>,
    pub boot_instant: Instant,
}

impl AppState {
    pub fn new(
        config: Arc<AppConfig>,
        core: Arc<SearchCore>,
        catalog: Arc<CatalogSnapshot>,
    ) -> Self {
        Self {
            config,
            core,
            catalog,
            boot_instant: Instant::now(),
        }
    }
}

/// Build the Axum router with shared layers and routes.
pub fn router(state: AppState) -> Router {
    let cors = cors_layer(&state.config);

    let mut router = Router::new()
        .route("/healthz", get(healthz))
        .route("/v1/images", get(api::search::image_search))
        .route("/v1/recommendations", get(api::recommendations::related_images))
        .with_state(state)
        .fallback(api::fallback_handler)
        .layer(middleware::from_fn(api::ensure_error_envelope))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(HttpMakeSpan)
                .on_request(LogOnRequest)
                .on_response(LogOnResponse),
        );

    if let Some(cors) = cors {
        router = router.layer(cors);
    }

    router
}

fn cors_layer(config: &AppConfig) -> Option<CorsLayer> {
    if config.cors_allowed_origins.is_empty() {
        return None;
    }

    let origins: Vec<HeaderValue> = config
        .cors_allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();
    Some(CorsLayer::new().allow_origin(origins))
}

/// JSON payload returned by `/healthz`.
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    catalog_path: String,
    uptime_seconds: f64,
    catalog_works: usize,
    catalog_generated_at: String,
}

#[instrument(skip(state))]
async fn healthz(State(state): State<AppState>) -> ApiResult<HealthResponse> {
    Ok(Json(HealthResponse {
        status: "ok",
        catalog_path: state.config.catalog_path.display().to_string(),
        uptime_seconds: state.boot_instant.elapsed().as_secs_f64(),
        catalog_works: state.catalog.works.len(),
        catalog_generated_at: state.catalog.generated_at.to_rfc3339(),
    }))
}

#[derive(Clone)]
struct HttpMakeSpan;

impl<B> MakeSpan<B> for HttpMakeSpan {
    fn make_span(&mut self, request: &axum::http::Request<B>) -> Span {
        let method = request.method().clone();
        let matched_path = request
            .extensions()
            .get::<MatchedPath>()
            .map(|path| path.as_str())
            .unwrap_or_else(|| request.uri().path());

        let span = tracing::info_span!(
            "http_request",
            http.request.method = %method,
            http.route = %matched_path,
            url.path = request.uri().path(),
            url.query = field::Empty,
            http.response.status_code = field::Empty,
            http.latency_ms = field::Empty
        );

        if let Some(query) = request.uri().query() {
            span.record("url.query", &field::display(query));
        }

        span
    }
}

#[derive(Clone)]
struct LogOnRequest;

impl<B> OnRequest<B> for LogOnRequest {
    fn on_request(&mut self, request: &axum::http::Request<B>, span: &Span) {
        tracing::info!(
            parent: span,
            "HTTP request received: {} {}",
            request.method(),
            request.uri().path()
        );
    }
}

#[derive(Clone)]
struct LogOnResponse;

impl<B> OnResponse<B> for LogOnResponse {
    fn on_response(self, response: &axum::http::Response<B>, latency: Duration, span: &Span) {
        let status_code = response.status().as_u16();

        span.record("http.response.status_code", &field::display(status_code));
        span.record("http.latency_ms", &field::display(latency.as_millis()));

        tracing::info!(
            parent: span,
            "HTTP request completed with status {} in {} ms",
            status_code,
            latency.as_millis()
        );
    }
}
