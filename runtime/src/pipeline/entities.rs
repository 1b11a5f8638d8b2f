//! Syntactic entity extraction. Each pass is a single case-insensitive regex
//! scan; nothing is checked against a medical vocabulary.

use std::sync::LazyLock;

use regex::Regex;

use super::types::ExtractedEntitySet;

static MEDICATION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:prescribed|recommended|take|using)\s+([A-Za-z\s]+(?:\d+mg)?)")
        .expect("medication pattern is valid")
});

static DIAGNOSIS_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:diagnosed|diagnosis|condition|suffering from)\s+([A-Za-z\s]+)")
        .expect("diagnosis pattern is valid")
});

static DATE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\d{1,2}[-/]\d{1,2}[-/]\d{2,4}").expect("date pattern is valid")
});

pub fn extract(text: &str) -> ExtractedEntitySet {
    ExtractedEntitySet {
        medications: extract_medications(text),
        diagnoses: extract_diagnoses(text),
        dates: extract_dates(text),
    }
}

pub fn extract_medications(text: &str) -> Vec<String> {
    cue_captures(&MEDICATION_PATTERN, text)
}

pub fn extract_diagnoses(text: &str) -> Vec<String> {
    cue_captures(&DIAGNOSIS_PATTERN, text)
}

pub fn extract_dates(text: &str) -> Vec<String> {
    DATE_PATTERN
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// The cue word sits outside group 1, so taking the capture strips it.
fn cue_captures(pattern: &Regex, text: &str) -> Vec<String> {
    pattern
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOTE: &str =
        "The patient was prescribed Ibuprofen 200mg and diagnosed hypertension on 5/1/2023.";

    #[test]
    fn extracts_all_three_kinds_from_a_clinical_sentence() {
        let set = extract(NOTE);

        assert!(set.medications.iter().any(|m| m.contains("Ibuprofen 200mg")));
        assert!(set.diagnoses.iter().any(|d| d.contains("hypertension")));
        assert_eq!(set.dates, vec!["5/1/2023".to_string()]);
    }

    #[test]
    fn text_without_cues_yields_nothing() {
        let set = extract("Routine follow-up. Vitals stable. No changes.");
        assert!(set.is_empty());
    }

    #[test]
    fn cue_matching_ignores_case() {
        let meds = extract_medications("PRESCRIBED Metformin 500mg daily");
        assert_eq!(meds, vec!["Metformin 500mg".to_string()]);
    }

    #[test]
    fn entries_are_trimmed_substrings_of_the_source() {
        let text = "Currently using   Lisinopril  \nand suffering from  chronic migraine \n";
        let set = extract(text);

        for entry in set.medications.iter().chain(set.diagnoses.iter()) {
            assert!(!entry.is_empty());
            assert_eq!(entry, entry.trim());
            assert!(text.contains(entry.as_str()));
        }
        assert!(set.diagnoses.iter().any(|d| d.starts_with("chronic migraine")));
    }

    #[test]
    fn repeated_mentions_are_preserved_in_order() {
        let text = "take Aspirin. Later: take Aspirin. Then take Warfarin.";
        let meds = extract_medications(text);
        assert_eq!(meds, vec!["Aspirin", "Aspirin", "Warfarin"]);
    }

    #[test]
    fn chained_cues_swallow_the_second_cue() {
        let meds = extract_medications("Patient was prescribed and recommended Aspirin daily.");
        assert_eq!(meds, vec!["and recommended Aspirin daily"]);
    }

    #[test]
    fn cue_must_start_a_word() {
        assert!(extract_medications("daily intake of water").is_empty());
    }

    #[test]
    fn cue_followed_only_by_digits_is_skipped() {
        assert!(extract_medications("take 20 minutes").is_empty());
    }

    #[test]
    fn date_shapes_accept_dashes_and_short_years() {
        let dates = extract_dates("Seen 12-03-24, again 1/7/2025.");
        assert_eq!(dates, vec!["12-03-24", "1/7/2025"]);
    }
}
