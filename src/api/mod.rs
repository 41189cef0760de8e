//! HTTP boundary - axum router over the core operations.
//!
//! | Route | Auth |
//! |---|---|
//! | `GET /health` | none |
//! | `POST /websms` | API key |
//! | `/websms/unmatched/...` | session |
//! | `/admin/...` | admin session |

pub mod admin;
pub mod error;
pub mod extract;
pub mod review;
pub mod websms;

use crate::core::{credentials::CredentialResolver, parser::Parser};
use axum::{
    Json, Router,
    routing::{get, post},
};
use sea_orm::DatabaseConnection;
use serde_json::{Value, json};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// State shared by every handler
#[derive(Debug, Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    /// Parsing strategy of this deployment
    pub parser: Parser,
    pub resolver: Arc<CredentialResolver>,
}

async fn health() -> Json<Value> {
    Json(json!({ "ok": true }))
}

/// Builds the application router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/websms", post(websms::receive))
        .route("/websms/unmatched", get(review::list_unmatched))
        .route("/websms/unmatched/:id/ignore", post(review::ignore))
        .route("/websms/unmatched/:id/resolve", post(review::resolve))
        .route(
            "/websms/unmatched/:id/resolve-new-asset",
            post(review::resolve_new_asset),
        )
        .route("/admin/websms-logs", get(admin::list_logs))
        .route(
            "/admin/websms-keys",
            get(admin::list_keys).post(admin::create_key),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
