//! Workflow file download.

use std::io;

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde_json::json;

use crate::http::server::AppState;
use crate::observability::metrics;
use crate::security::filename;

/// `GET /api/workflows/{filename}/download`
///
/// The name is checked before the filesystem is touched. Only names that
/// pass [`filename::validate`] are joined onto the workflows directory.
pub async fn download_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Response {
    if let Some(violation) = filename::first_violation(&name) {
        tracing::warn!(filename = ?name, reason = %violation, "Rejected workflow filename");
        metrics::record_rejected_filename(violation);
        return error_response(StatusCode::BAD_REQUEST, "Invalid filename".to_string());
    }

    let path = state.workflows_dir.join(&name);
    match tokio::fs::read(&path).await {
        Ok(bytes) => {
            tracing::debug!(filename = %name, bytes = bytes.len(), "Serving workflow file");
            (
                [
                    (header::CONTENT_TYPE, "application/json".to_string()),
                    (
                        header::CONTENT_DISPOSITION,
                        format!("attachment; filename=\"{name}\""),
                    ),
                ],
                bytes,
            )
                .into_response()
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => error_response(
            StatusCode::NOT_FOUND,
            format!("Workflow file '{name}' not found"),
        ),
        Err(e) => {
            tracing::error!(filename = %name, error = %e, "Failed to read workflow file");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Error reading workflow file".to_string(),
            )
        }
    }
}

fn error_response(status: StatusCode, message: String) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}
