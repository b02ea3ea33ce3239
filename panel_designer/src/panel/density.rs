//! Sliding-window mutation density along each chromosome.
//!
//! For the window of `W` records ending at record `i` (records ordered by
//! start), `density_i = sum(score) / (max(end) - min(start))`. The first
//! `W - 1` records of a chromosome have no full window and stay undefined.

use rayon::ThreadPool;
use tracing::{debug, info};

use crate::config::FilterSettings;
use crate::error::Result;
use crate::models::MutationRecord;
use crate::panel::{map_partitions, sort_records};

/// Round to one decimal place, halves to even.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round_ties_even() / 10.0
}

/// Window statistics for one chromosome. Spans of zero (all records on the
/// same single base) are clamped to 1 bp, so density falls back to the raw
/// window score.
pub fn roll(mut records: Vec<MutationRecord>, window: usize) -> Vec<MutationRecord> {
    records.sort_by(|a, b| a.start.cmp(&b.start).then(a.end.cmp(&b.end)));
    let window = window.max(1);

    let mut last_defined: Option<f64> = None;
    for i in 0..records.len() {
        let density = if i + 1 >= window {
            let members = &records[i + 1 - window..=i];
            let score: i64 = members.iter().map(|r| r.cosmic_score).sum();
            let min_start = members.iter().map(|r| r.start).min().unwrap_or(0);
            let max_end = members.iter().map(|r| r.end).max().unwrap_or(0);
            let span = max_end - min_start;
            if span <= 0 {
                debug!(
                    "Zero-length window at {}:{}, using raw window score",
                    records[i].chrom, records[i].start
                );
            }
            Some(round1(score as f64 / span.max(1) as f64))
        } else {
            None
        };
        last_defined = density.or(last_defined);
        records[i].cosmic_density = last_defined;
    }
    records
}

/// Drop background mutations and compute density per chromosome.
pub fn compute_density(
    records: Vec<MutationRecord>,
    filters: &FilterSettings,
    pool: &ThreadPool,
) -> Result<Vec<MutationRecord>> {
    info!("Computing mutation density");
    let before = records.len();
    let working: Vec<MutationRecord> = records
        .into_iter()
        .filter(|r| r.cosmic_score as f64 >= filters.cosmic_rolling_min)
        .collect();
    info!(
        "Removed {} background mutations below score {}",
        before - working.len(),
        filters.cosmic_rolling_min
    );

    let window = filters.rolling_window_size;
    let mut out = map_partitions(working, pool, |chrom, part| {
        debug!("Rolling on chromosome {} ({} mutations)", chrom, part.len());
        Ok(roll(part, window))
    })?;
    sort_records(&mut out);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::helper_functions::build_pool;

    fn at(start: i64, end: i64, score: i64) -> MutationRecord {
        MutationRecord::new("chr1", start, end, "A", "T").with_score(score)
    }

    fn filters(rolling_min: f64, window: usize) -> FilterSettings {
        FilterSettings {
            cosmic_rolling_min: rolling_min,
            rolling_window_size: window,
            cosmic_min: 0.0,
            cosmic_density_min: 0.0,
            padding: 0,
            annotation: None,
        }
    }

    #[test]
    fn window_density_and_leading_gap() {
        let rows = vec![at(100, 100, 10), at(110, 110, 20), at(130, 130, 30)];
        let out = roll(rows, 2);
        assert_eq!(out[0].cosmic_density, None);
        // (10 + 20) / (110 - 100)
        assert_eq!(out[1].cosmic_density, Some(3.0));
        // (20 + 30) / (130 - 110)
        assert_eq!(out[2].cosmic_density, Some(2.5));
    }

    #[test]
    fn density_is_rounded_to_one_decimal() {
        let out = roll(vec![at(0, 0, 1), at(3, 3, 0)], 2);
        assert_eq!(out[1].cosmic_density, Some(0.3));
    }

    #[test]
    fn halves_round_to_even() {
        let out = roll(vec![at(0, 0, 1), at(4, 4, 0)], 2);
        assert_eq!(out[1].cosmic_density, Some(0.2));
        let out = roll(vec![at(0, 0, 3), at(4, 4, 0)], 2);
        assert_eq!(out[1].cosmic_density, Some(0.8));
        assert_eq!(round1(0.25), 0.2);
    }

    #[test]
    fn zero_span_uses_raw_score() {
        let out = roll(vec![at(50, 50, 4), at(50, 50, 6)], 2);
        assert_eq!(out[1].cosmic_density, Some(10.0));
        let single = roll(vec![at(7, 7, 5)], 1);
        assert_eq!(single[0].cosmic_density, Some(5.0));
    }

    #[test]
    fn input_order_does_not_matter() {
        let out = roll(vec![at(130, 130, 30), at(100, 100, 10), at(110, 110, 20)], 2);
        let starts: Vec<i64> = out.iter().map(|r| r.start).collect();
        assert_eq!(starts, vec![100, 110, 130]);
        assert_eq!(out[2].cosmic_density, Some(2.5));
    }

    #[test]
    fn background_is_excluded_before_windowing() {
        let rows = vec![
            at(100, 100, 10),
            at(105, 105, 1),
            at(110, 110, 20),
            MutationRecord::new("chr2", 5, 5, "A", "T").with_score(8),
        ];
        let pool = build_pool(2).unwrap();
        let out = compute_density(rows, &filters(5.0, 2), &pool).unwrap();
        assert_eq!(out.len(), 3);
        assert!(out.iter().all(|r| r.start != 105));
        assert_eq!(out[1].cosmic_density, Some(3.0));
        assert_eq!(out[2].chrom, "chr2");
        assert_eq!(out[2].cosmic_density, None);
    }

    #[test]
    fn empty_input_is_valid() {
        let pool = build_pool(1).unwrap();
        assert!(compute_density(Vec::new(), &filters(0.0, 3), &pool).unwrap().is_empty());
    }
}
