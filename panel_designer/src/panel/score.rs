//! Clinical score from the recurrence-encoding `type` field.
//!
//! The field holds zero or more `<count>x(<type>[@<location>])` entries.
//! Every entry contributes `count * (1 + type_weight * location_weight)`,
//! the contributions are summed and truncated to an integer, and a per-gene
//! multiplier is applied last.

use std::sync::OnceLock;

use rayon::prelude::*;
use rayon::ThreadPool;
use regex::Regex;
use tracing::{debug, info};

use crate::config::WeightTable;
use crate::helper_functions::chunk_size;
use crate::models::MutationRecord;

/// Suffix that breaks the entry pattern when left in place.
const TYPE_ARTIFACT: &str = "_(sclerosing_haemangioma)";

fn entry_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?P<count>[0-9]+)x\((?P<types>[^@)]+)(?:@(?P<location>[^0-9@)]+))?\)")
            .expect("valid recurrence regex")
    })
}

pub struct ScoreEngine<'a> {
    weights: &'a WeightTable,
}

impl<'a> ScoreEngine<'a> {
    pub fn new(weights: &'a WeightTable) -> Self {
        Self { weights }
    }

    /// Additive score of one `type` field, before any gene multiplier.
    pub fn score_type(&self, mut_type: &str) -> i64 {
        let cleaned = mut_type.replace(TYPE_ARTIFACT, "");
        let mut total = 0.0;
        let mut matched = false;

        for caps in entry_pattern().captures_iter(&cleaned) {
            let Ok(count) = caps["count"].parse::<u64>() else {
                continue;
            };
            let type_w = self.weights.type_weight(&caps["types"]);
            let loc_w = self
                .weights
                .location_weight(caps.name("location").map(|m| m.as_str()));
            total += count as f64 * (1.0 + type_w * loc_w);
            matched = true;
        }

        if !matched {
            if !mut_type.is_empty() {
                debug!("No recurrence entry in type field '{}'", mut_type);
            }
            return 0;
        }
        (total.trunc() as i64).max(0)
    }

    /// Multiplier for `gene`, if one is configured.
    pub fn gene_factor(&self, gene: &str) -> Option<f64> {
        self.weights
            .gene_multiplier
            .as_ref()
            .and_then(|genes| genes.get(gene))
            .copied()
    }

    pub fn score_record(&self, record: &mut MutationRecord) {
        let mut score = self.score_type(&record.mut_type);
        if let Some(factor) = self.gene_factor(&record.gene) {
            score = ((score as f64 * factor).trunc() as i64).max(0);
        }
        record.cosmic_score = score;
    }

    /// Score all records in near-equal row chunks, one per thread.
    pub fn score_records(&self, records: &mut [MutationRecord], pool: &ThreadPool) {
        let threads = pool.current_num_threads();
        info!("Computing cosmic score for {} mutations using {} threads", records.len(), threads);

        if let Some(genes) = &self.weights.gene_multiplier {
            let mut names: Vec<&str> = genes.keys().map(String::as_str).collect();
            names.sort_unstable();
            info!("Inflating gene-wise scores for the following genes: {}", names.join(","));
        }

        let size = chunk_size(records.len(), threads);
        pool.install(|| {
            records
                .par_chunks_mut(size)
                .for_each(|chunk| chunk.iter_mut().for_each(|r| self.score_record(r)));
        });
        info!("Cosmic score finished");
    }
}
