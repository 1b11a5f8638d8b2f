pub mod analyzer;
pub mod charts;
pub mod entities;
pub mod extractor;
pub mod insights;
pub mod types;

pub mod utils;

pub use analyzer::{Analyzer, AnalyzerConfig, build_record};
pub use charts::to_chart_bundle;
pub use entities::extract;
pub use extractor::{DocumentExtractor, PdfTextExtractor};
pub use insights::{insights, summarize};
pub use types::{AnalysisRecord, ChartBundle, ChartSeries, ExtractedEntitySet};
