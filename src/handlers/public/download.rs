use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};

use crate::db::AppState;
use crate::error::{AppError, Result};

/// GET /api/download
///
/// Serves the installer binary as a forced download. The file lives on
/// disk next to the service; there is exactly one installer.
pub async fn download_installer(State(state): State<AppState>) -> Result<Response> {
    let path = state.downloads_dir.join(&state.installer_name);

    let bytes = tokio::fs::read(&path).await.map_err(|e| {
        tracing::error!(path = %path.display(), error = %e, "installer not readable");
        AppError::NotFound("File not found".into())
    })?;

    let headers = [
        (header::CONTENT_TYPE, "application/octet-stream".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", state.installer_name),
        ),
    ];

    Ok((StatusCode::OK, headers, bytes).into_response())
}
