//! Padding and merging of mutation positions into panel regions.
//!
//! Every position is widened by `pad` on both sides. Padded intervals that
//! overlap (strictly, touching ends do not count) are chained into one
//! region. Region boundaries keep the padding since they describe bait
//! coverage; the per-mutation output keeps the original coordinates.

use rayon::ThreadPool;
use tracing::{debug, info};

use crate::error::Result;
use crate::helper_functions::chrom_order;
use crate::models::{MutationRecord, RegionRecord};
use crate::panel::map_partitions;

/// Group ids for intervals sorted by start.
///
/// Runs of overlapping intervals get ids `1, 2, ...` in order. An interval
/// that overlaps nothing gets `-(index + 1)`, so isolated intervals never
/// share an id with each other or with a run.
pub fn overlap_groups(spans: &[(i64, i64)]) -> Vec<i64> {
    let mut ids = vec![0; spans.len()];
    let mut run_id = 0;
    let mut i = 0;
    while i < spans.len() {
        let mut run_end = spans[i].1;
        let mut j = i + 1;
        while j < spans.len() && spans[j].0 < run_end {
            run_end = run_end.max(spans[j].1);
            j += 1;
        }
        if j - i == 1 {
            ids[i] = -(i as i64) - 1;
        } else {
            run_id += 1;
            ids[i..j].iter_mut().for_each(|id| *id = run_id);
        }
        i = j;
    }
    ids
}

/// Contiguous `(first, last_exclusive)` row ranges sharing a group id.
pub fn group_ranges(ids: &[i64]) -> Vec<(usize, usize)> {
    let mut ranges = Vec::new();
    let mut begin = 0;
    for i in 1..=ids.len() {
        if i == ids.len() || ids[i] != ids[begin] {
            if begin < ids.len() {
                ranges.push((begin, i));
            }
            begin = i;
        }
    }
    ranges
}

fn aggregate(members: &[MutationRecord], ovgroup: i64, pad: i64) -> RegionRecord {
    let first = &members[0];
    let last = &members[members.len() - 1];

    let start = members.iter().map(|r| r.start - pad).min().unwrap_or(first.start);
    let end = members.iter().map(|r| r.end + pad).max().unwrap_or(first.end);

    let gene_secondary = if first.gene == last.gene {
        String::new()
    } else {
        last.gene.clone()
    };

    let densities: Vec<f64> = members.iter().filter_map(|r| r.cosmic_density).collect();
    let cosmic_density =
        (!densities.is_empty()).then(|| densities.iter().sum::<f64>() / densities.len() as f64);

    RegionRecord {
        chrom: first.chrom.clone(),
        start,
        end,
        gene_primary: first.gene.clone(),
        gene_secondary,
        cytoband: members
            .iter()
            .map(|r| r.cytoband.as_str())
            .min()
            .unwrap_or_default()
            .to_string(),
        population_freq: members
            .iter()
            .map(|r| r.population_freq)
            .fold(f64::NEG_INFINITY, f64::max),
        cosmic_score: members.iter().map(|r| r.cosmic_score).sum(),
        cosmic_density,
        ovgroup,
        mut_count: members.len(),
        stretch: end - start,
    }
}

/// Collapse one chromosome. Returns the members tagged with their group id
/// and the region table, both ordered by start.
pub fn collapse(
    mut records: Vec<MutationRecord>,
    pad: i64,
) -> (Vec<MutationRecord>, Vec<RegionRecord>) {
    records.sort_by(|a, b| a.start.cmp(&b.start).then(a.end.cmp(&b.end)));

    let spans: Vec<(i64, i64)> = records.iter().map(|r| (r.start - pad, r.end + pad)).collect();
    let ids = overlap_groups(&spans);

    let mut regions = Vec::new();
    for (begin, end) in group_ranges(&ids) {
        regions.push(aggregate(&records[begin..end], ids[begin], pad));
    }
    for (record, id) in records.iter_mut().zip(&ids) {
        record.ovgroup = Some(*id);
    }
    (records, regions)
}

pub struct CollapseOutput {
    pub mutations: Vec<MutationRecord>,
    pub regions: Vec<RegionRecord>,
}

impl CollapseOutput {
    /// Total bp covered by the panel.
    pub fn footprint(&self) -> i64 {
        self.regions.iter().map(|r| r.stretch).sum()
    }
}

/// Collapse every chromosome and concatenate, regions sorted by position.
pub fn full_collapse(
    records: Vec<MutationRecord>,
    padding: i64,
    pool: &ThreadPool,
) -> Result<CollapseOutput> {
    info!("Collapsing adjacent mutations and including bait padding of {} bp", padding);
    let per_chrom = map_partitions(records, pool, |chrom, part| {
        debug!("Collapsing chromosome {}", chrom);
        Ok(vec![collapse(part, padding)])
    })?;

    let (mutations, regions): (Vec<Vec<MutationRecord>>, Vec<Vec<RegionRecord>>) =
        per_chrom.into_iter().unzip();
    let mutations: Vec<MutationRecord> = mutations.into_iter().flatten().collect();
    let mut regions: Vec<RegionRecord> = regions.into_iter().flatten().collect();
    regions.sort_by(|a, b| chrom_order(&a.chrom, &b.chrom).then(a.start.cmp(&b.start)));

    let output = CollapseOutput { mutations, regions };
    info!(
        "Collapsed {} mutations into {} regions covering {} bp",
        output.mutations.len(),
        output.regions.len(),
        output.footprint()
    );
    Ok(output)
}
