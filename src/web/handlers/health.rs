// GET /health: liveness check. The scorer is loaded before the server
// starts, so reaching this handler means the model is ready.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use crate::web::AppState;

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "status": "ok",
            "model": state.classifier.model_name(),
        })),
    )
}
