//! Route handlers
//!
//! Image and PDF routes are thin: they read the form, hand it to the batch executor and
//! shape the outcome into the route's JSON response.

pub mod convert;
pub mod health;
pub mod image;
pub mod pdf;

use crate::error::HttpAppError;
use crate::multipart::read_transform_request;
use crate::state::AppState;
use axum::extract::Multipart;
use axum::Json;
use filepick_processing::{BatchOutcome, OperationKind};
use serde_json::{json, Map, Value};

/// Run a batch route end to end.
pub(crate) async fn run_batch(
    state: &AppState,
    kind: OperationKind,
    multipart: Multipart,
) -> Result<Json<Value>, HttpAppError> {
    let request = read_transform_request(kind, multipart).await?;
    let outcome = state.executor.run(request).await?;
    Ok(Json(batch_response(
        kind,
        outcome,
        state.config.processing().report_skipped_items,
    )))
}

/// Shape an outcome as `{result_key: ...}`, plus `skipped` when requested.
pub(crate) fn batch_response(
    kind: OperationKind,
    outcome: BatchOutcome,
    report_skipped: bool,
) -> Value {
    let key = kind.result_key().to_string();
    let mut body = Map::new();

    match outcome {
        BatchOutcome::Text(text) => {
            body.insert(key, Value::String(text));
        }
        BatchOutcome::Uploaded(report) => {
            let urls = report.urls();
            let value = if kind.is_single_artifact() {
                urls.into_iter().next().map(Value::String).unwrap_or(Value::Null)
            } else {
                json!(urls)
            };
            body.insert(key, value);

            if report_skipped {
                body.insert("skipped".to_string(), json!(report.skipped));
            }
        }
    }

    Value::Object(body)
}
