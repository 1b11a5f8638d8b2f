use std::sync::LazyLock;

use regex::Regex;

use super::{
    types::ExtractedEntitySet,
    utils::{mention_frequencies, unique_mentions},
};

const MEDICATIONS_LABEL: &str = "Prescribed medications";
const DIAGNOSES_LABEL: &str = "Diagnosed conditions";
const DATES_LABEL: &str = "Key dates found";

static DOSAGE_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\d+mg$").expect("dosage pattern is valid"));

/// One sentence per non-empty list, always medications, diagnoses, dates.
pub fn insights(medications: &[String], diagnoses: &[String], dates: &[String]) -> Vec<String> {
    [
        (MEDICATIONS_LABEL, medications),
        (DIAGNOSES_LABEL, diagnoses),
        (DATES_LABEL, dates),
    ]
    .into_iter()
    .filter(|(_, items)| !items.is_empty())
    .map(|(label, items)| format!("{label}: {}", items.join(", ")))
    .collect()
}

/// Reports counts only; richer summaries belong to the language model.
pub fn summarize(medications: &[String], diagnoses: &[String]) -> String {
    format!(
        "This medical document contains information about {} conditions and {} medications. \
         The document appears to be a medical report or prescription.",
        diagnoses.len(),
        medications.len()
    )
}

pub fn keywords(entities: &ExtractedEntitySet) -> Vec<String> {
    unique_mentions(entities.medications.iter().chain(entities.diagnoses.iter()))
}

pub fn findings(entities: &ExtractedEntitySet) -> Vec<String> {
    [
        ("medication", &entities.medications),
        ("diagnosis", &entities.diagnoses),
        ("date", &entities.dates),
    ]
    .into_iter()
    .filter(|(_, items)| !items.is_empty())
    .map(|(kind, items)| {
        let distinct = mention_frequencies(items).len();
        let noun = if items.len() == 1 { "mention" } else { "mentions" };
        format!("{} {kind} {noun} ({distinct} distinct)", items.len())
    })
    .collect()
}

pub fn recommendations(entities: &ExtractedEntitySet) -> Vec<String> {
    let mut out = Vec::new();
    if !entities.medications.is_empty() {
        out.push(
            "Review the listed medications and dosages with the prescribing clinician.".to_string(),
        );
    }
    if !entities.diagnoses.is_empty() {
        out.push("Confirm the recorded conditions against the latest clinical notes.".to_string());
    }
    if !entities.is_empty() {
        out.push(
            "Consult a healthcare professional before acting on any extracted information."
                .to_string(),
        );
    }
    out
}

pub fn concerns(entities: &ExtractedEntitySet) -> Vec<String> {
    let mut out: Vec<String> = unique_mentions(&entities.medications)
        .into_iter()
        .filter(|medication| !DOSAGE_SUFFIX.is_match(medication))
        .map(|medication| format!("No dosage stated for {medication}"))
        .collect();

    if !entities.diagnoses.is_empty() && entities.dates.is_empty() {
        out.push("Conditions are listed without any dates.".to_string());
    }
    out
}
