use async_trait::async_trait;
use tracing::debug;

use crate::error::AnalysisError;

const PDF_MAGIC: &[u8] = b"%PDF";

/// Turns raw document bytes into plain text.
#[async_trait]
pub trait DocumentExtractor: Send + Sync {
    async fn extract(&self, bytes: &[u8]) -> Result<String, AnalysisError>;
}

pub fn looks_like_pdf(bytes: &[u8]) -> bool {
    bytes.starts_with(PDF_MAGIC)
}

/// Digital PDFs with an embedded text layer, decoded by `pdf-extract`.
#[derive(Debug, Default, Clone)]
pub struct PdfTextExtractor;

#[async_trait]
impl DocumentExtractor for PdfTextExtractor {
    async fn extract(&self, bytes: &[u8]) -> Result<String, AnalysisError> {
        if !looks_like_pdf(bytes) {
            return Err(AnalysisError::Extraction(
                "payload is not a PDF document".to_string(),
            ));
        }

        // pdf-extract is CPU bound and may panic on hostile input
        let owned = bytes.to_vec();
        let text = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&owned))
            .await
            .map_err(|err| AnalysisError::Extraction(format!("pdf decoder aborted: {err}")))?
            .map_err(|err| AnalysisError::Extraction(err.to_string()))?;

        debug!(chars = text.len(), "pdf text extracted");
        Ok(text)
    }
}
