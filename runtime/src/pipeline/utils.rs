use std::collections::{HashMap, HashSet};

use sha2::{Digest, Sha256};

/// Short hex digest used to correlate log lines for one uploaded document.
pub fn document_digest(bytes: &[u8]) -> String {
    let hash = Sha256::digest(bytes);
    hash.iter().take(8).map(|b| format!("{b:02x}")).collect()
}

pub fn mention_key(mention: &str) -> String {
    mention.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

/// Mention counts keyed by [`mention_key`].
pub fn mention_frequencies(mentions: &[String]) -> HashMap<String, usize> {
    let mut counts = HashMap::new();
    for mention in mentions {
        *counts.entry(mention_key(mention)).or_insert(0) += 1;
    }
    counts
}

/// First spelling wins; comparison ignores case and inner whitespace runs.
pub fn unique_mentions<'a, I>(mentions: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a String>,
{
    let mut seen = HashSet::new();
    mentions
        .into_iter()
        .filter(|mention| seen.insert(mention_key(mention)))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owned(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn digest_is_stable_and_short() {
        let a = document_digest(b"%PDF-1.4 sample");
        assert_eq!(a, document_digest(b"%PDF-1.4 sample"));
        assert_eq!(a.len(), 16);
        assert_ne!(a, document_digest(b"%PDF-1.4 other"));
    }

    #[test]
    fn frequencies_fold_case_and_spacing() {
        let counts = mention_frequencies(&owned(&["Aspirin", "aspirin", "Aspirin  81mg"]));
        assert_eq!(counts["aspirin"], 2);
        assert_eq!(counts["aspirin 81mg"], 1);
    }

    #[test]
    fn unique_mentions_keeps_first_spelling() {
        let mentions = owned(&["Asthma", "asthma", "Eczema", "ASTHMA"]);
        assert_eq!(unique_mentions(&mentions), owned(&["Asthma", "Eczema"]));
    }
}
