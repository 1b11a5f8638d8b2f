use std::sync::Arc;

use tracing::{Instrument, info, info_span, warn};
use uuid::Uuid;

use crate::error::AnalysisError;

use super::{
    charts, entities,
    extractor::{DocumentExtractor, PdfTextExtractor},
    insights,
    types::{AnalysisRecord, ChartBundle, ExtractedEntitySet},
    utils::{document_digest, unique_mentions},
};

#[derive(Debug, Clone, Default)]
pub struct AnalyzerConfig {
    pub dedup_mentions: bool,
}

/// Drives text extraction, entity extraction, insight generation and chart
/// aggregation for one document. Holds no per-request state.
pub struct Analyzer {
    extractor: Arc<dyn DocumentExtractor>,
    config: AnalyzerConfig,
}

impl Analyzer {
    pub fn new(config: AnalyzerConfig) -> Self {
        Self::with_dependencies(Arc::new(PdfTextExtractor), config)
    }

    pub fn with_dependencies(extractor: Arc<dyn DocumentExtractor>, config: AnalyzerConfig) -> Self {
        Self { extractor, config }
    }

    pub async fn analyze(&self, bytes: &[u8]) -> Result<AnalysisRecord, AnalysisError> {
        if bytes.is_empty() {
            return Err(AnalysisError::Input("uploaded document is empty".to_string()));
        }

        let span = info_span!(
            "analyze",
            request_id = %Uuid::new_v4(),
            doc = %document_digest(bytes),
            bytes = bytes.len()
        );

        async {
            let text = self.extractor.extract(bytes).await?;
            let record = self.analyze_text(&text);
            match &record {
                Ok(record) => info!(
                    text_len = text.len(),
                    medications = record.medications.len(),
                    diagnoses = record.diagnoses.len(),
                    dates = record.dates.len(),
                    "document analyzed"
                ),
                Err(err) => warn!(error = %err, "document produced no analysis"),
            }
            record
        }
        .instrument(span)
        .await
    }

    pub fn analyze_text(&self, text: &str) -> Result<AnalysisRecord, AnalysisError> {
        if text.trim().is_empty() {
            return Err(AnalysisError::EmptyDocument);
        }
        let mentions = entities::extract(text);
        Ok(build_record(&mentions, self.config.dedup_mentions))
    }
}

/// `mentions` always carries every match; with `dedup` the record lists and
/// chart labels collapse repeats while chart values still count all of them.
pub fn build_record(mentions: &ExtractedEntitySet, dedup: bool) -> AnalysisRecord {
    let view = if dedup {
        ExtractedEntitySet {
            medications: unique_mentions(&mentions.medications),
            diagnoses: unique_mentions(&mentions.diagnoses),
            dates: unique_mentions(&mentions.dates),
        }
    } else {
        mentions.clone()
    };

    let insight_lines = insights::insights(&view.medications, &view.diagnoses, &view.dates);
    let summary = insights::summarize(&view.medications, &view.diagnoses);
    let chart_data = ChartBundle {
        medications: charts::series(&view.medications, &mentions.medications),
        diagnoses: charts::series(&view.diagnoses, &mentions.diagnoses),
        timeline: charts::series(&view.dates, &mentions.dates),
    };

    AnalysisRecord {
        summary,
        insights: insight_lines,
        keywords: insights::keywords(&view),
        findings: insights::findings(mentions),
        recommendations: insights::recommendations(mentions),
        concerns: insights::concerns(mentions),
        chart_data,
        medications: view.medications,
        diagnoses: view.diagnoses,
        dates: view.dates,
    }
}
