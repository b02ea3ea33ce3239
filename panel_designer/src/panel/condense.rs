//! Reduction of co-located mutations.

use std::collections::{HashMap, HashSet};

use rayon::ThreadPool;
use tracing::info;

use crate::error::Result;
use crate::models::MutationRecord;
use crate::panel::{map_partitions, sort_records};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CondensePolicy {
    /// One row per `(chrom, start, end)` with alleles and types joined and
    /// scores summed.
    FullMerge,
    /// Highest-scoring row per `(chrom, start)`; the rest are dropped.
    PositionCollapse,
}

fn push_distinct(values: &mut Vec<String>, value: &str) {
    if !values.iter().any(|v| v == value) {
        values.push(value.to_string());
    }
}

struct MergeGroup {
    first: MutationRecord,
    refs: Vec<String>,
    alts: Vec<String>,
    types: Vec<String>,
    score: i64,
}

/// Full merge of one partition. Exact duplicates on the five-column key are
/// dropped first; every other column keeps its first-seen value.
pub fn full_merge(records: Vec<MutationRecord>) -> Vec<MutationRecord> {
    let mut seen: HashSet<(String, i64, i64, String, String)> = HashSet::new();
    let mut slots: HashMap<(String, i64, i64), usize> = HashMap::new();
    let mut groups: Vec<MergeGroup> = Vec::new();

    for record in records {
        let (chrom, start, end, reference, alt) = record.key();
        if !seen.insert((chrom.to_string(), start, end, reference.to_string(), alt.to_string())) {
            continue;
        }

        let pos_key = (record.chrom.clone(), record.start, record.end);
        match slots.get(&pos_key) {
            Some(&slot) => {
                let group = &mut groups[slot];
                push_distinct(&mut group.refs, &record.reference);
                push_distinct(&mut group.alts, &record.alt);
                push_distinct(&mut group.types, &record.mut_type);
                group.score += record.cosmic_score;
            }
            None => {
                slots.insert(pos_key, groups.len());
                groups.push(MergeGroup {
                    refs: vec![record.reference.clone()],
                    alts: vec![record.alt.clone()],
                    types: vec![record.mut_type.clone()],
                    score: record.cosmic_score,
                    first: record,
                });
            }
        }
    }

    let mut merged: Vec<MutationRecord> = groups
        .into_iter()
        .map(|g| MutationRecord {
            reference: g.refs.join("/"),
            alt: g.alts.join("/"),
            mut_type: g.types.join("+"),
            cosmic_score: g.score,
            ..g.first
        })
        .collect();
    sort_records(&mut merged);
    merged
}

/// Keep only the top-scoring row per start position. Ties keep the row that
/// came first.
pub fn position_collapse(mut records: Vec<MutationRecord>) -> Vec<MutationRecord> {
    records.sort_by(|a, b| {
        a.start
            .cmp(&b.start)
            .then(b.cosmic_score.cmp(&a.cosmic_score))
    });
    let mut kept: Vec<MutationRecord> = Vec::with_capacity(records.len());
    for record in records {
        let duplicate = kept
            .last()
            .is_some_and(|prev| prev.chrom == record.chrom && prev.start == record.start);
        if !duplicate {
            kept.push(record);
        }
    }
    kept
}

/// Condense all chromosomes in parallel. Partitioning by chromosome keeps
/// every `(chrom, start[, end])` group inside one worker.
pub fn condense(
    records: Vec<MutationRecord>,
    policy: CondensePolicy,
    pool: &ThreadPool,
) -> Result<Vec<MutationRecord>> {
    let before = records.len();
    let mut out = map_partitions(records, pool, |_, part| {
        Ok(match policy {
            CondensePolicy::FullMerge => full_merge(part),
            CondensePolicy::PositionCollapse => position_collapse(part),
        })
    })?;
    sort_records(&mut out);
    info!("Condensed {} mutations to {} positions ({:?})", before, out.len(), policy);
    Ok(out)
}
