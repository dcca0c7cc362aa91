// Web server: Axum-based HTTP boundary for the classifier.
//
// One JSON endpoint does the work (POST /extract_keywords). The boundary
// parses requests, hands them to the Classifier, and maps ClassifyError
// onto 400/500 responses. No business logic lives here.

use std::any::Any;

use anyhow::Result;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::classify::pipeline::Classifier;

pub mod handlers;

/// Shared application state threaded through all Axum handlers.
#[derive(Clone)]
pub struct AppState {
    pub classifier: Classifier,
}

/// Start the Axum web server and block until it exits.
pub async fn run_server(classifier: Classifier, bind: &str, port: u16) -> Result<()> {
    let state = AppState { classifier };
    let app = build_router(state);

    let addr = format!("{bind}:{port}");
    info!("topicsift listening on http://{addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/extract_keywords",
            post(handlers::classify::extract_keywords),
        )
        .route("/health", get(handlers::health::health))
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(
            CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods([
                    axum::http::Method::GET,
                    axum::http::Method::POST,
                    axum::http::Method::OPTIONS,
                ])
                .allow_headers([header::CONTENT_TYPE]),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Typed JSON error response helper.
pub fn api_error(status: StatusCode, message: &str) -> Response {
    (status, axum::Json(serde_json::json!({ "error": message }))).into_response()
}

/// 500 response carrying the failure's text.
pub fn internal_error(details: &str) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        axum::Json(serde_json::json!({
            "error": "Internal server error",
            "details": details,
        })),
    )
        .into_response()
}

/// Last resort: a panic outside the classification task (which the
/// handler catches itself) still gets the standard 500 body.
fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let details = panic_message(err.as_ref());
    error!(details = %details, "Handler panicked");
    internal_error(&details)
}

/// Text of a panic payload, when it carries any.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "handler panicked".to_string()
    }
}
