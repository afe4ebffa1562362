//! Public REST API server.
//!
//! Axum HTTP server, wire-compatible with the paths the scoring frontend
//! calls. CORS is wide open (the frontend is served from a different
//! origin) and preflight OPTIONS requests are answered by the CORS layer.
//!
//! Endpoints:
//!   GET/POST/PUT/DELETE  /api/admins
//!   GET/POST/PUT/DELETE  /api/scorers
//!   POST /api/login
//!   GET  /api/setup
//!   POST /api/setup
//!   GET  /api/me
//!   GET  /api/health

pub mod routes;

use anyhow::Result;
use axum::{
    http::{header, Method, StatusCode},
    routing::{get, post},
    Extension, Json, Router,
};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

use crate::records::StoreError;
use crate::storage::StorageError;
use crate::AppContext;

use routes::roster::Roster;

pub async fn start_rest_server(ctx: Arc<AppContext>) -> Result<()> {
    let bind = format!("{}:{}", ctx.config.bind_address, ctx.config.port);
    let addr: SocketAddr = bind.parse()?;

    let router = build_router(ctx);

    info!("REST API listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;
    Ok(())
}

pub fn build_router(ctx: Arc<AppContext>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    Router::new()
        // Record lists — same handler set, parameterized by roster
        .route(
            "/api/admins",
            routes::roster::method_router().layer(Extension(Roster::Admins)),
        )
        .route(
            "/api/scorers",
            routes::roster::method_router().layer(Extension(Roster::Scorers)),
        )
        // Login & first-run password setup
        .route("/api/login", post(routes::login::login))
        .route(
            "/api/setup",
            get(routes::setup::needs_setup).post(routes::setup::set_password),
        )
        // Token introspection for the frontend (no record access)
        .route("/api/me", get(routes::identity::me))
        // Health (no auth)
        .route("/api/health", get(routes::health::health))
        .layer(cors)
        .with_state(ctx)
}

// ─── Error mapping ────────────────────────────────────────────────────────────

pub(crate) type ApiError = (StatusCode, Json<Value>);

pub(crate) fn reject(status: StatusCode, message: &str) -> ApiError {
    (status, Json(json!({ "error": message })))
}

/// Map a store failure to the wire taxonomy: validation → 400, unknown
/// record → 404, password already set → 403, storage unconfigured → 503,
/// anything else → logged 500.
pub(crate) fn store_error(err: StoreError, not_found: &str) -> ApiError {
    match err {
        StoreError::Validation(msg) => reject(StatusCode::BAD_REQUEST, &msg),
        StoreError::NotFound => reject(StatusCode::NOT_FOUND, not_found),
        StoreError::PasswordAlreadySet => reject(
            StatusCode::FORBIDDEN,
            "Password already set. Use login page instead.",
        ),
        StoreError::Storage(StorageError::NotConfigured) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "error": "Storage not configured",
                "message": "Set BLOB_READ_WRITE_TOKEN and create a blob store, \
                            or set storage_backend = \"local\" in config.toml.",
            })),
        ),
        StoreError::Storage(e) => {
            error!(err = %e, "record storage failure");
            reject(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
        }
    }
}
