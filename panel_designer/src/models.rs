use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use polars::frame::DataFrame;
use regex::Regex;

use crate::error::{PanelError, Result};

/// Anything that can be read from disk into a table.
pub trait Dataset {
    fn load(&self) -> Result<DataFrame>;
}

/// One annotated point mutation.
///
/// Position and allele fields are never modified after loading; stages only
/// fill in `cosmic_score`, `cosmic_density` and `ovgroup`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MutationRecord {
    pub chrom: String,
    pub start: i64,
    pub end: i64,
    pub reference: String,
    pub alt: String,
    pub func: String,
    pub gene: String,
    pub exonic_func: String,
    pub aa_change: String,
    pub cytoband: String,
    pub population_freq: f64,
    pub mut_id: String,
    pub mut_type: String,
    pub cosmic_score: i64,
    pub cosmic_density: Option<f64>,
    pub ovgroup: Option<i64>,
}

impl MutationRecord {
    pub fn new(chrom: &str, start: i64, end: i64, reference: &str, alt: &str) -> Self {
        Self {
            chrom: chrom.to_string(),
            start,
            end,
            reference: reference.to_string(),
            alt: alt.to_string(),
            ..Default::default()
        }
    }

    /// Natural key used for exact-duplicate detection.
    pub fn key(&self) -> (&str, i64, i64, &str, &str) {
        (&self.chrom, self.start, self.end, &self.reference, &self.alt)
    }
}

#[cfg(test)]
impl MutationRecord {
    pub fn with_gene(mut self, gene: &str) -> Self {
        self.gene = normalize_gene(gene);
        self
    }

    pub fn with_type(mut self, mut_type: &str) -> Self {
        self.mut_type = mut_type.to_string();
        self
    }

    pub fn with_score(mut self, score: i64) -> Self {
        self.cosmic_score = score;
        self
    }

    pub fn with_density(mut self, density: f64) -> Self {
        self.cosmic_density = Some(density);
        self
    }
}

/// Collapse duplicated gene fields like `RB1;RB1` to `RB1`.
pub fn normalize_gene(gene: &str) -> String {
    let mut parts = gene.split(';').map(str::trim).filter(|p| !p.is_empty());
    match parts.next() {
        Some(first) if parts.all(|p| p == first) => first.to_string(),
        _ => gene.to_string(),
    }
}

/// Whether the caller supplies scores or the ScoreEngine computes them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreSource {
    /// Scores come from the `type` column via the weight table.
    FromType,
    /// The input table already carries a `cosmic_score` column.
    Precomputed,
}

/// A merged, padded panel region.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionRecord {
    pub chrom: String,
    pub start: i64,
    pub end: i64,
    pub gene_primary: String,
    pub gene_secondary: String,
    pub cytoband: String,
    pub population_freq: f64,
    pub cosmic_score: i64,
    pub cosmic_density: Option<f64>,
    pub ovgroup: i64,
    pub mut_count: usize,
    pub stretch: i64,
}

/// Plain interval used for footprint measurement of external interval files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BedRegion {
    pub chrom: String,
    pub start: i64,
    pub end: i64,
    pub stretch: i64,
}

/// `chr7:100-200` style coordinate.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Coord {
    pub chrom: String,
    pub start: i64,
    pub end: i64,
}

impl Coord {
    pub fn new(chrom: &str, start: i64, end: i64) -> Self {
        Self {
            chrom: chrom.to_string(),
            start,
            end,
        }
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}-{}", self.chrom, self.start, self.end)
    }
}

fn coord_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(chr(?:[0-9]+|X|Y|MT|M)):([0-9]+)-([0-9]+)$").expect("valid coordinate regex")
    })
}

impl FromStr for Coord {
    type Err = PanelError;

    fn from_str(s: &str) -> Result<Self> {
        let caps = coord_pattern()
            .captures(s.trim())
            .ok_or_else(|| PanelError::InvalidCoordinate(s.to_string()))?;
        let parse = |i: usize| {
            caps[i]
                .parse::<i64>()
                .map_err(|_| PanelError::InvalidCoordinate(s.to_string()))
        };
        Ok(Coord {
            chrom: caps[1].to_string(),
            start: parse(2)?,
            end: parse(3)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coord_string_round_trip() {
        let coord = Coord::new("chr7", 100, 200);
        let text = coord.to_string();
        assert_eq!(text, "chr7:100-200");
        assert_eq!(text.parse::<Coord>().unwrap(), coord);
    }

    #[test]
    fn coord_requires_chr_prefix() {
        assert!("7:100-200".parse::<Coord>().is_err());
        assert!("chr7:100".parse::<Coord>().is_err());
        assert!("chr7:a-200".parse::<Coord>().is_err());
        assert_eq!("chrX:5-9".parse::<Coord>().unwrap().chrom, "chrX");
    }

    #[test]
    fn duplicated_gene_is_collapsed() {
        assert_eq!(normalize_gene("RB1;RB1"), "RB1");
        assert_eq!(normalize_gene("TP53"), "TP53");
        assert_eq!(normalize_gene("KRAS;NRAS"), "KRAS;NRAS");
        assert_eq!(normalize_gene(""), "");
    }
}
