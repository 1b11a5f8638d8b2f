use super::{
    types::{ChartBundle, ChartSeries},
    utils::{mention_frequencies, mention_key},
};

/// Builds one series per entity kind. Each value is the number of times its
/// label is mentioned in `counted`, so the magnitude is reproducible.
pub fn series(labels: &[String], counted: &[String]) -> ChartSeries {
    let counts = mention_frequencies(counted);
    let data = labels
        .iter()
        .map(|label| counts.get(&mention_key(label)).copied().unwrap_or(0) as f64)
        .collect();

    ChartSeries {
        labels: labels.to_vec(),
        data,
    }
}

pub fn to_chart_bundle(medications: &[String], diagnoses: &[String], dates: &[String]) -> ChartBundle {
    ChartBundle {
        medications: series(medications, medications),
        diagnoses: series(diagnoses, diagnoses),
        timeline: series(dates, dates),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owned(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn labels_and_data_stay_aligned() {
        let meds = owned(&["Aspirin", "Warfarin", "Aspirin"]);
        let bundle = to_chart_bundle(&meds, &[], &owned(&["5/1/2023"]));

        for s in [&bundle.medications, &bundle.diagnoses, &bundle.timeline] {
            assert_eq!(s.labels.len(), s.data.len());
        }
        assert_eq!(bundle.medications.labels, meds);
        assert!(bundle.diagnoses.labels.is_empty());
    }

    #[test]
    fn magnitudes_are_deterministic() {
        let dx = owned(&["asthma", "Asthma", "eczema"]);
        assert_eq!(
            to_chart_bundle(&[], &dx, &[]),
            to_chart_bundle(&[], &dx, &[])
        );
    }

    #[test]
    fn deduplicated_labels_still_count_every_mention() {
        let all = owned(&["Asthma", "asthma", "Eczema"]);
        let labels = owned(&["Asthma", "Eczema"]);
        let s = series(&labels, &all);
        assert_eq!(s.labels, labels);
        assert_eq!(s.data.len(), 2);
        assert!(s.data[0] > s.data[1]);
    }
}
