//! API route handlers

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::server::AppState;
use crate::service::Forecaster;

#[derive(Debug, Deserialize)]
pub struct PredictQuery {
    pub item_name: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct ReloadResponse {
    pub status: &'static str,
    pub rows_read: usize,
    pub rows_used: usize,
    pub rows_skipped: usize,
    pub items: usize,
}

/// `GET /predict?item_name=...`
///
/// The response key carries the year: `predicted_quantity_<year>`. The item
/// name is echoed back as it was queried.
pub async fn predict(State(state): State<AppState>, Query(query): Query<PredictQuery>) -> Response {
    let forecaster = Forecaster::new(state.snapshot.current(), state.config.negative_policy);

    match forecaster.lookup(&query.item_name, state.config.target_year) {
        Ok(prediction) => {
            let mut body = Map::new();
            body.insert("item_name".to_string(), json!(query.item_name));
            body.insert(
                format!("predicted_quantity_{}", prediction.target_year),
                json!(prediction.predicted_quantity),
            );
            (StatusCode::OK, Json(Value::Object(body))).into_response()
        }
        Err(not_found) => {
            tracing::debug!(item = %query.item_name, "item not found");
            (
                StatusCode::NOT_FOUND,
                Json(ErrorResponse {
                    error: not_found.to_string(),
                }),
            )
                .into_response()
        }
    }
}

/// `GET /health`
pub async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "alive",
        "version": env!("CARGO_PKG_VERSION"),
        "items": state.snapshot.current().item_count(),
    }))
}

/// `POST /reload`
///
/// A failed reload leaves the current snapshot in service.
pub async fn reload(State(state): State<AppState>) -> Response {
    let config = state.config.clone();
    let loaded = tokio::task::spawn_blocking(move || crate::app::pipeline::load_snapshot(&config)).await;

    let error = match loaded {
        Ok(Ok(snapshot)) => {
            let report = snapshot.load_report();
            let body = ReloadResponse {
                status: "reloaded",
                rows_read: report.rows_read,
                rows_used: report.rows_used,
                rows_skipped: report.rows_skipped(),
                items: snapshot.item_count(),
            };
            state.snapshot.replace(snapshot);
            tracing::info!(items = body.items, "snapshot replaced");
            return (StatusCode::OK, Json(body)).into_response();
        }
        Ok(Err(e)) => e.to_string(),
        Err(e) => format!("Reload task failed: {e}"),
    };

    tracing::error!("reload failed, keeping current data: {error}");
    (StatusCode::INTERNAL_SERVER_ERROR, Json(ErrorResponse { error })).into_response()
}
