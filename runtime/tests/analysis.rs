use std::sync::Arc;

use async_trait::async_trait;
use clinalyze::{
    error::AnalysisError,
    pipeline::{Analyzer, AnalyzerConfig, DocumentExtractor},
};

/// Returns canned text regardless of the bytes it is given.
struct FixedText(&'static str);

#[async_trait]
impl DocumentExtractor for FixedText {
    async fn extract(&self, _bytes: &[u8]) -> Result<String, AnalysisError> {
        Ok(self.0.to_string())
    }
}

struct Unreachable;

#[async_trait]
impl DocumentExtractor for Unreachable {
    async fn extract(&self, _bytes: &[u8]) -> Result<String, AnalysisError> {
        Err(AnalysisError::UpstreamUnavailable("ocr service down".to_string()))
    }
}

fn analyzer_with(extractor: impl DocumentExtractor + 'static, dedup: bool) -> Analyzer {
    Analyzer::with_dependencies(
        Arc::new(extractor),
        AnalyzerConfig {
            dedup_mentions: dedup,
        },
    )
}

/// Single-page PDF with one line of Helvetica text.
fn make_pdf(text: &str) -> Vec<u8> {
    use lopdf::{Document, Object, Stream, dictionary};

    let mut doc = Document::with_version("1.4");
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let content = format!("BT /F1 12 Tf 72 700 Td ({text}) Tj ET");
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        "Contents" => content_id,
        "Resources" => dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        },
    });
    let pages_id = doc.add_object(dictionary! {
        "Type" => "Pages",
        "Kids" => vec![page_id.into()],
        "Count" => 1,
    });
    if let Ok(Object::Dictionary(page)) = doc.get_object_mut(page_id) {
        page.set("Parent", pages_id);
    }
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buf = Vec::new();
    doc.save_to(&mut buf).expect("serialize test pdf");
    buf
}

#[tokio::test]
async fn clinical_note_produces_full_record() -> anyhow::Result<()> {
    let analyzer = analyzer_with(
        FixedText("Patient prescribed Ibuprofen 200mg on 5/1/2023. Diagnosed with hypertension."),
        false,
    );
    let record = analyzer.analyze(b"%PDF-stub").await?;

    assert!(record.medications.iter().any(|m| m.contains("Ibuprofen 200mg")));
    assert!(record.diagnoses.iter().any(|d| d.contains("hypertension")));
    assert_eq!(record.dates, vec!["5/1/2023"]);
    assert_eq!(record.insights.len(), 3);
    assert!(record.insights[0].starts_with("Prescribed medications: "));
    assert!(record.insights[1].starts_with("Diagnosed conditions: "));
    assert_eq!(record.insights[2], "Key dates found: 5/1/2023");
    assert!(record.summary.contains("1 conditions"));
    assert!(record.summary.contains("1 medications"));
    assert_eq!(record.chart_data.timeline.labels, record.dates);
    assert_eq!(record.chart_data.timeline.data.len(), 1);
    assert!(!record.recommendations.is_empty());
    assert!(record.concerns.is_empty());
    Ok(())
}

#[tokio::test]
async fn record_serializes_with_camel_case_chart_key() -> anyhow::Result<()> {
    let analyzer = analyzer_with(FixedText("take Aspirin"), false);
    let value = serde_json::to_value(analyzer.analyze(b"%PDF").await?)?;

    assert!(value.get("chartData").is_some());
    assert_eq!(value["chartData"]["medications"]["labels"][0], "Aspirin");
    assert_eq!(value["chartData"]["medications"]["data"][0], 1.0);
    Ok(())
}

#[tokio::test]
async fn text_without_entities_is_still_a_record() -> anyhow::Result<()> {
    let analyzer = analyzer_with(FixedText("Routine visit. All vitals normal."), false);
    let record = analyzer.analyze(b"%PDF").await?;

    assert!(record.medications.is_empty());
    assert!(record.insights.is_empty());
    assert!(record.summary.contains("0 conditions and 0 medications"));
    assert!(record.chart_data.medications.labels.is_empty());
    Ok(())
}

#[tokio::test]
async fn whitespace_only_text_is_an_empty_document() {
    let analyzer = analyzer_with(FixedText(" \n \t"), false);
    let err = analyzer.analyze(b"%PDF").await.unwrap_err();
    assert!(matches!(err, AnalysisError::EmptyDocument));
}

#[tokio::test]
async fn extractor_failures_pass_through() {
    let err = analyzer_with(Unreachable, false)
        .analyze(b"%PDF")
        .await
        .unwrap_err();
    assert!(matches!(err, AnalysisError::UpstreamUnavailable(_)));
    assert_eq!(err.status_code().as_u16(), 503);
}

#[tokio::test]
async fn dedup_setting_collapses_repeated_mentions() -> anyhow::Result<()> {
    let text = "take Aspirin daily. Also take Aspirin daily. take Warfarin";
    let full = analyzer_with(FixedText(text), false).analyze(b"%PDF").await?;
    let dedup = analyzer_with(FixedText(text), true).analyze(b"%PDF").await?;

    assert_eq!(full.medications.len(), 3);
    assert_eq!(dedup.medications.len(), 2);
    assert!(dedup.chart_data.medications.data[0] > dedup.chart_data.medications.data[1]);
    Ok(())
}

#[tokio::test]
async fn real_pdf_text_layer_is_analyzed() -> anyhow::Result<()> {
    let pdf = make_pdf("Patient prescribed Ibuprofen 200mg on 5/1/2023");
    let record = Analyzer::new(AnalyzerConfig::default()).analyze(&pdf).await?;

    assert!(
        record.medications.iter().any(|m| m.contains("Ibuprofen")),
        "expected the medication from the pdf text layer, got {record:?}"
    );
    assert!(
        record.dates.iter().any(|d| d == "5/1/2023"),
        "expected the date from the pdf text layer, got {record:?}"
    );
    Ok(())
}

#[tokio::test]
async fn corrupt_pdf_is_an_extraction_error() {
    let mut pdf = make_pdf("take Aspirin");
    pdf.truncate(40);
    let err = Analyzer::new(AnalyzerConfig::default())
        .analyze(&pdf)
        .await
        .unwrap_err();
    assert!(matches!(err, AnalysisError::Extraction(_)));
}
