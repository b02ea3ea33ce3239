//! Scoring, density and interval-collapsing stages of panel design.
//!
//! Every stage that groups rows works on one chromosome at a time, so
//! chromosome partitions can be handed to separate workers and the results
//! concatenated afterwards.

pub mod bed;
pub mod collapse;
pub mod condense;
pub mod density;
pub mod score;
pub mod select;

use std::collections::HashMap;

use rayon::prelude::*;
use rayon::ThreadPool;

use crate::error::Result;
use crate::helper_functions::chrom_order;
use crate::models::MutationRecord;

/// Split records by chromosome, keeping row order inside each partition.
/// Partitions come back in natural chromosome order.
pub fn partition_by_chrom(records: Vec<MutationRecord>) -> Vec<(String, Vec<MutationRecord>)> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut partitions: Vec<(String, Vec<MutationRecord>)> = Vec::new();
    for record in records {
        let slot = *index.entry(record.chrom.clone()).or_insert_with(|| {
            partitions.push((record.chrom.clone(), Vec::new()));
            partitions.len() - 1
        });
        partitions[slot].1.push(record);
    }
    partitions.sort_by(|a, b| chrom_order(&a.0, &b.0));
    partitions
}

/// Run `stage` on every chromosome partition in `pool` and concatenate.
/// A failing partition fails the whole batch.
pub fn map_partitions<T, F>(
    records: Vec<MutationRecord>,
    pool: &ThreadPool,
    stage: F,
) -> Result<Vec<T>>
where
    T: Send,
    F: Fn(&str, Vec<MutationRecord>) -> Result<Vec<T>> + Sync,
{
    let partitions = partition_by_chrom(records);
    let results: Vec<Vec<T>> = pool.install(|| {
        partitions
            .into_par_iter()
            .map(|(chrom, part)| stage(&chrom, part))
            .collect::<Result<Vec<_>>>()
    })?;
    Ok(results.into_iter().flatten().collect())
}

/// Sort by the positional part of the natural key.
pub fn sort_records(records: &mut [MutationRecord]) {
    records.sort_by(|a, b| {
        chrom_order(&a.chrom, &b.chrom)
            .then(a.start.cmp(&b.start))
            .then(a.end.cmp(&b.end))
    });
}
