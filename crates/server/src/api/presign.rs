//! Presigned URL issuance.

use axum::{body::Bytes, extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};

use stemsplit_core::{PresignError, PresignRequest};

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct PresignResponse {
    pub presigned_url: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// `POST /presign` with `{bucket, key, action}`.
///
/// A body that is not JSON is treated as empty, so it is reported as a
/// missing `bucket`.
pub async fn presign(State(state): State<Arc<AppState>>, body: Bytes) -> impl IntoResponse {
    let value: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);

    let result = PresignRequest::from_json(&value).and_then(|request| {
        let expires = Duration::from_secs(state.config().storage.presign_expiry_secs);
        state
            .presigner()
            .presign(&request.location, request.action, expires)
            .map(|url| (request, url))
    });

    match result {
        Ok((request, presigned_url)) => {
            debug!(
                object = %request.location,
                action = %request.action,
                "Issued presigned URL"
            );
            (StatusCode::OK, Json(PresignResponse { presigned_url })).into_response()
        }
        Err(e) => {
            let status = status_for(&e);
            if status.is_client_error() {
                warn!(error = %e, "Rejected presign request");
            } else {
                error!(error = %e, "Failed to presign URL");
            }
            (
                status,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            )
                .into_response()
        }
    }
}

fn status_for(error: &PresignError) -> StatusCode {
    if error.is_client_error() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}
