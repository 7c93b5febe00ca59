pub mod analytics;
pub mod discovery;
pub mod entrypoints;
pub mod frankfurter_client;


pub use frankfurter_client::{FrankfurterClient, RatesClientTrait, DEFAULT_BASE_URL};

use axum::{routing::get, Json, Router};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppContext;

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub fn router(ctx: Arc<AppContext>) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(discovery::routes())
        .merge(entrypoints::routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(ctx)
}
