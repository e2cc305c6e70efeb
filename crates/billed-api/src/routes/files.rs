//! Uploaded proof download

use crate::error::ApiError;
use crate::AppState;
use axum::extract::Path;
use axum::http::header;
use axum::response::{IntoResponse, Response};

/// Serve an uploaded proof by key
pub async fn api_file_content(
    state: axum::extract::State<AppState>,
    Path((key, _name)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    let file = state.store.file(&key).ok_or_else(|| ApiError::NotFound {
        resource: format!("file {}", key),
    })?;
    let content_type = file
        .content_type
        .unwrap_or_else(|| "application/octet-stream".to_string());
    Ok(([(header::CONTENT_TYPE, content_type)], file.content).into_response())
}
