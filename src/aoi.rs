//! Area-of-interest enumeration
//!
//! AOI lists keep first-seen order. Table columns and chart axes are laid out
//! in this order, so it must be stable across runs.

use crate::types::EventLog;

/// Distinct AOI labels of a log in first-seen order
pub fn areas_of_interest(log: &EventLog) -> Vec<String> {
    first_seen(log.labels())
}

/// Union of AOI labels across logs, in participant order then first-seen order
pub fn areas_of_interest_across<'a, I>(logs: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a EventLog>,
{
    first_seen(logs.into_iter().flat_map(|log| log.labels()))
}

/// Order-preserving union of already-extracted AOI lists
pub fn union_of<'a, I>(lists: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a [String]>,
{
    first_seen(
        lists
            .into_iter()
            .flat_map(|list| list.iter().map(String::as_str)),
    )
}

// Linear membership check; AOI sets are a handful of labels.
fn first_seen<'a>(labels: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut aois: Vec<String> = Vec::new();
    for label in labels {
        if !aois.iter().any(|a| a == label) {
            aois.push(label.to_string());
        }
    }
    aois
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Fixation;
    use proptest::prelude::*;

    fn log_of(labels: &[&str]) -> EventLog {
        let fixations = labels
            .iter()
            .enumerate()
            .map(|(i, label)| Fixation::new(*label, i as f64, i as f64 + 0.5))
            .collect();
        EventLog::new("Participant 1", fixations)
    }

    #[test]
    fn test_first_seen_order_not_alphabetical() {
        let log = log_of(&["Screen", "Button", "Screen", "Alarm", "Button"]);
        assert_eq!(areas_of_interest(&log), vec!["Screen", "Button", "Alarm"]);
    }

    #[test]
    fn test_empty_log_has_no_aois() {
        let log = log_of(&[]);
        assert!(areas_of_interest(&log).is_empty());
    }

    #[test]
    fn test_order_follows_appearance() {
        let forward = log_of(&["A", "B", "C"]);
        let reversed = log_of(&["C", "B", "A"]);
        assert_eq!(areas_of_interest(&forward), vec!["A", "B", "C"]);
        assert_eq!(areas_of_interest(&reversed), vec!["C", "B", "A"]);
    }

    #[test]
    fn test_union_across_participants() {
        let first = log_of(&["Screen", "Knob"]);
        let second = log_of(&["Display", "Screen", "Cable"]);
        assert_eq!(
            areas_of_interest_across([&first, &second]),
            vec!["Screen", "Knob", "Display", "Cable"]
        );
    }

    #[test]
    fn test_union_of_lists() {
        let a = vec!["X".to_string(), "Y".to_string()];
        let b = vec!["Z".to_string(), "X".to_string()];
        assert_eq!(union_of([a.as_slice(), b.as_slice()]), vec!["X", "Y", "Z"]);
    }

    proptest! {
        #[test]
        fn prop_aois_are_distinct_and_first_seen(labels in proptest::collection::vec("[A-E]", 0..40)) {
            let refs: Vec<&str> = labels.iter().map(String::as_str).collect();
            let log = log_of(&refs);
            let aois = areas_of_interest(&log);

            for (i, aoi) in aois.iter().enumerate() {
                prop_assert!(!aois[i + 1..].contains(aoi));
            }
            let mut previous_index = None;
            for aoi in &aois {
                let index = labels.iter().position(|l| l == aoi).unwrap();
                if let Some(prev) = previous_index {
                    prop_assert!(index > prev);
                }
                previous_index = Some(index);
            }
            prop_assert_eq!(areas_of_interest(&log), aois);
        }
    }
}
