use tracing::info;

use crate::config::FilterSettings;
use crate::models::MutationRecord;

/// A record stays if either its score or its density clears the threshold.
/// Undefined density never clears.
pub fn keep(record: &MutationRecord, filters: &FilterSettings) -> bool {
    record.cosmic_score as f64 > filters.cosmic_min
        || record
            .cosmic_density
            .is_some_and(|d| d > filters.cosmic_density_min)
}

/// Returns the kept records and the number removed.
pub fn filter_cosmic(
    records: Vec<MutationRecord>,
    filters: &FilterSettings,
) -> (Vec<MutationRecord>, usize) {
    let before = records.len();
    let kept: Vec<MutationRecord> = records.into_iter().filter(|r| keep(r, filters)).collect();
    let removed = before - kept.len();
    info!("Filtered out {} mutations [{} --> {}]", removed, before, kept.len());
    (kept, removed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filters() -> FilterSettings {
        FilterSettings {
            cosmic_rolling_min: 0.0,
            rolling_window_size: 3,
            cosmic_min: 10.0,
            cosmic_density_min: 1.0,
            padding: 100,
            annotation: None,
        }
    }

    fn rec(score: i64, density: Option<f64>) -> MutationRecord {
        let mut r = MutationRecord::new("chr1", 1, 1, "A", "T").with_score(score);
        r.cosmic_density = density;
        r
    }

    #[test]
    fn either_threshold_retains() {
        let f = filters();
        assert!(keep(&rec(11, Some(0.5)), &f));
        assert!(keep(&rec(2, Some(1.5)), &f));
        assert!(!keep(&rec(10, Some(1.0)), &f));
        assert!(!keep(&rec(3, None), &f));
    }

    #[test]
    fn removed_count_is_reported() {
        let rows = vec![rec(11, None), rec(1, Some(0.1)), rec(1, Some(2.0))];
        let (kept, removed) = filter_cosmic(rows, &filters());
        assert_eq!(kept.len(), 2);
        assert_eq!(removed, 1);

        let (kept, removed) = filter_cosmic(vec![rec(0, None)], &filters());
        assert!(kept.is_empty());
        assert_eq!(removed, 1);
    }
}
