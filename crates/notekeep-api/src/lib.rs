//! # notekeep-api
//!
//! HTTP API for notes and their tags.
//!
//! The binary in `main.rs` wires configuration, logging and the PostgreSQL
//! store into [`build_router`]. Tests build the same router over the
//! in-memory store.

pub mod config;
pub mod error;
pub mod handlers;
pub mod services;
pub mod telemetry;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::{header, HeaderValue, Method, Request},
    routing::{get, patch, put},
    Router,
};
use notekeep_core::Store;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    trace::{MakeSpan, TraceLayer},
};
use tracing::Span;
use uuid::Uuid;

pub use config::ApiConfig;
pub use error::ApiError;
pub use services::NoteService;

/// Largest accepted request body.
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub notes: NoteService,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            notes: NoteService::new(store),
        }
    }
}

/// Request ids are UUIDv7 so they sort by arrival time.
#[derive(Clone, Copy, Default)]
struct MakeRequestUuidV7;

impl MakeRequestId for MakeRequestUuidV7 {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        let id = Uuid::now_v7().to_string().parse().ok()?;
        Some(RequestId::new(id))
    }
}

/// Span for one HTTP request, tagged with the id set by `SetRequestIdLayer`.
#[derive(Clone, Copy, Default)]
struct RequestSpan;

impl<B> MakeSpan<B> for RequestSpan {
    fn make_span(&mut self, request: &Request<B>) -> Span {
        let request_id = request
            .headers()
            .get("x-request-id")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("-");
        tracing::info_span!(
            "request",
            method = %request.method(),
            uri = %request.uri(),
            request_id = %request_id
        )
    }
}

fn cors_layer(allowed_origins: Vec<HeaderValue>) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed_origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600))
}

/// Build the application router.
pub fn build_router(state: AppState, allowed_origins: Vec<HeaderValue>) -> Router {
    use handlers::{health, notes, tags};

    Router::new()
        .route("/", get(health::root))
        .route("/health", get(health::health_check))
        .route("/notes", get(notes::list_notes).post(notes::create_note))
        .route(
            "/notes/:id",
            get(notes::get_note)
                .put(notes::update_note)
                .delete(notes::delete_note),
        )
        .route("/notes/:id/tags", put(notes::set_note_tags))
        .route("/tags", get(tags::list_tags).post(tags::resolve_tag))
        .route("/tags/suggestions", get(tags::suggest_tags))
        .route("/tags/:id", patch(tags::update_tag))
        .layer(TraceLayer::new_for_http().make_span_with(RequestSpan))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7))
        .layer(cors_layer(allowed_origins))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .with_state(state)
}
