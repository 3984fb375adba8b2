//! # HTTP Routes
//!
//! Route table for the JSON API. Handlers decode DTOs, delegate to
//! pdv-core/pdv-db and map errors; no business rule lives here.
//!
//! ## Surface
//! ```text
//! GET    /api/health                   liveness probe
//! GET    /api/caixa/status             drawer status + session totals
//! POST   /api/caixa/abrir              open a session with a counted float
//! POST   /api/caixa/movimentacao       manual SANGRIA / SUPRIMENTO
//! POST   /api/caixa/fechar             close against a blind count
//! POST   /api/vendas                   finalize a sale atomically
//! GET    /api/vendas/{id}              sale with items and payments
//! PATCH  /api/vendas/{id}/cancelar     reverse a finalized sale
//! ```
//!
//! ## Wire Format
//! Monetary values cross the wire as decimal reais (two fraction digits);
//! the boundary converts to integer centavos immediately and converts back
//! on the way out. Enum tags are SCREAMING_SNAKE_CASE business vocabulary.

pub mod caixa;
pub mod vendas;

use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};

use crate::state::AppState;

/// Builds the full application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .merge(caixa::router())
        .merge(vendas::router())
        .with_state(state)
}

/// Liveness probe.
async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Centavos → decimal reais for the wire.
pub(crate) fn to_reais(centavos: i64) -> f64 {
    centavos as f64 / 100.0
}
