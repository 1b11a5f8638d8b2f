use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, State},
    routing::post,
};
use tracing::{error, info};

use crate::{
    AppState,
    error::{AnalysisError, ApiError},
    pipeline::{AnalysisRecord, extractor::looks_like_pdf},
};

/// Room for multipart framing around the file itself.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

pub fn analysis_routes(max_upload_bytes: usize) -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/analyze", post(analyze_document))
        .layer(DefaultBodyLimit::max(
            max_upload_bytes.saturating_add(MULTIPART_OVERHEAD_BYTES),
        ))
}

async fn analyze_document(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<AnalysisRecord>, ApiError> {
    let mut upload = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| ApiError::new(err.status(), "input", err.body_text()))?
    {
        if field.name() == Some("file") {
            let filename = field.file_name().map(str::to_string);
            let data = field
                .bytes()
                .await
                .map_err(|err| ApiError::new(err.status(), "input", err.body_text()))?;
            upload = Some((filename, data));
            break;
        }
    }

    let (filename, bytes) =
        upload.ok_or_else(|| AnalysisError::Input("No file provided".to_string()))?;
    validate_upload(&bytes, state.config.analysis.max_upload_bytes)?;

    info!(file = filename.as_deref().unwrap_or("<unnamed>"), bytes = bytes.len(), "analyzing upload");
    let record = state.analyzer.analyze(&bytes).await.map_err(|err| {
        error!(error = %err, kind = err.kind(), "document analysis failed");
        err
    })?;
    Ok(Json(record))
}

fn validate_upload(bytes: &[u8], max_bytes: usize) -> Result<(), AnalysisError> {
    if bytes.is_empty() {
        return Err(AnalysisError::Input("Uploaded file is empty".to_string()));
    }
    if bytes.len() > max_bytes {
        return Err(AnalysisError::Input(format!(
            "Uploaded file exceeds the {max_bytes} byte limit"
        )));
    }
    if !looks_like_pdf(bytes) {
        return Err(AnalysisError::Input("Please upload a valid PDF file".to_string()));
    }
    Ok(())
}
