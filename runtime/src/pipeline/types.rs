use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Candidate entity strings in order of first appearance. Repeated mentions
/// are kept because they feed chart magnitudes.
#[derive(Default, Clone, Debug, PartialEq, Eq, Deserialize, Serialize, TS)]
#[ts(export)]
pub struct ExtractedEntitySet {
    pub medications: Vec<String>,
    pub diagnoses: Vec<String>,
    pub dates: Vec<String>,
}

impl ExtractedEntitySet {
    pub fn is_empty(&self) -> bool {
        self.medications.is_empty() && self.diagnoses.is_empty() && self.dates.is_empty()
    }
}

#[derive(Default, Clone, Debug, PartialEq, Deserialize, Serialize, TS)]
#[ts(export)]
pub struct ChartSeries {
    pub labels: Vec<String>,
    pub data: Vec<f64>,
}

#[derive(Default, Clone, Debug, PartialEq, Deserialize, Serialize, TS)]
#[ts(export)]
pub struct ChartBundle {
    pub medications: ChartSeries,
    pub diagnoses: ChartSeries,
    pub timeline: ChartSeries,
}

#[derive(Default, Clone, Debug, PartialEq, Deserialize, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct AnalysisRecord {
    pub summary: String,
    pub insights: Vec<String>,
    pub keywords: Vec<String>,
    pub findings: Vec<String>,
    pub recommendations: Vec<String>,
    pub concerns: Vec<String>,
    pub chart_data: ChartBundle,
    pub medications: Vec<String>,
    pub diagnoses: Vec<String>,
    pub dates: Vec<String>,
}
