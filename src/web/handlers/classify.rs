// POST /extract_keywords: classify text against candidate topic labels.
//
// Body: {"text": string, "labels"?: [string]}
// 200: {"topics": [{"topic", "confidence_score"}], "status": "success"}
// 400: {"error": string} for bad bodies, blank text or bad label sets
// 500: {"error": "Internal server error", "details": string}

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::Value;
use tokio::task::JoinError;
use tracing::{error, warn};

use crate::classify::error::ClassifyError;
use crate::classify::models::ClassificationRequest;
use crate::web::{api_error, internal_error, panic_message, AppState};

pub async fn extract_keywords(State(state): State<AppState>, body: Bytes) -> Response {
    let request = match parse_request(&body) {
        Ok(request) => request,
        Err(e) => return error_response(e),
    };

    // Run on its own task so a panic anywhere in the pipeline comes back as
    // a JoinError we can classify, instead of unwinding through the handler
    let classifier = state.classifier.clone();
    let outcome = tokio::spawn(async move { classifier.classify(request).await })
        .await
        .unwrap_or_else(|e| Err(ClassifyError::Unclassified(join_failure(e))));

    match outcome {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => error_response(e),
    }
}

fn join_failure(err: JoinError) -> anyhow::Error {
    if err.is_panic() {
        let payload = err.into_panic();
        anyhow::anyhow!(
            "Classification panicked: {}",
            panic_message(payload.as_ref())
        )
    } else {
        anyhow::anyhow!("Classification task was cancelled")
    }
}

/// Parse the raw body. The body is read as bytes so that missing and
/// malformed JSON get our error shape instead of axum's rejection text.
pub fn parse_request(body: &[u8]) -> Result<ClassificationRequest, ClassifyError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(ClassifyError::missing_body());
    }

    let value: Value =
        serde_json::from_slice(body).map_err(|e| ClassifyError::invalid_body(e.to_string()))?;

    match &value {
        // Falsy JSON counts as no data at all
        Value::Null | Value::Bool(false) => return Err(ClassifyError::missing_body()),
        Value::Object(map) if map.is_empty() => return Err(ClassifyError::missing_body()),
        Value::Array(items) if items.is_empty() => return Err(ClassifyError::missing_body()),
        Value::String(text) if text.is_empty() => return Err(ClassifyError::missing_body()),
        Value::Number(n) if n.as_f64() == Some(0.0) => return Err(ClassifyError::missing_body()),
        Value::Object(_) => {}
        _ => return Err(ClassifyError::invalid_body("expected a JSON object")),
    }

    serde_json::from_value(value).map_err(|e| ClassifyError::invalid_body(e.to_string()))
}

fn error_response(err: ClassifyError) -> Response {
    match &err {
        ClassifyError::MalformedRequest { message, reason } => {
            warn!(reason = %reason, "Rejected malformed request");
            api_error(StatusCode::BAD_REQUEST, message)
        }
        ClassifyError::Validation(validation) => {
            warn!(error = %validation, "Rejected invalid input");
            api_error(StatusCode::BAD_REQUEST, &validation.to_string())
        }
        ClassifyError::ScoringUnavailable(_) => {
            let details = format!("{err:#}");
            error!(error = %details, "Error processing request");
            internal_error(&details)
        }
        ClassifyError::Unclassified(cause) => {
            let details = format!("{cause:#}");
            error!(error = ?cause, "Unexpected error processing request");
            internal_error(&details)
        }
    }
}
