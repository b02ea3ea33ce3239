use std::cmp::Ordering;
use std::fs::File;
use std::path::Path;

use polars::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::debug;

use crate::error::{PanelError, Result};

/// Read a tab-separated table with every column kept as a string.
pub fn read_tsv(path: &Path) -> Result<DataFrame> {
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .map_parse_options(|o| {
            o.with_separator(b'\t')
                .with_quote_char(None)
                .with_truncate_ragged_lines(true)
        })
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;
    debug!("Read {} rows x {} cols from {}", df.height(), df.width(), path.display());
    Ok(df)
}

/// Write a tab-separated table. Fields are never quoted, matching `read_tsv`.
pub fn write_tsv(df: &mut DataFrame, path: &Path) -> Result<()> {
    let mut file = File::create(path)?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .with_separator(b'\t')
        .with_quote_style(QuoteStyle::Never)
        .finish(df)?;
    debug!("Wrote {} rows to {}", df.height(), path.display());
    Ok(())
}

pub fn require_columns(df: &DataFrame, columns: &[&str], table: &str) -> Result<()> {
    let names = df.get_column_names();
    for column in columns {
        if !names.iter().any(|n| n.as_str() == *column) {
            return Err(PanelError::shape(column, table));
        }
    }
    Ok(())
}

pub fn has_column(df: &DataFrame, column: &str) -> bool {
    df.get_column_names().iter().any(|n| n.as_str() == column)
}

/// Column values as owned strings, nulls become empty.
pub fn string_values(df: &DataFrame, column: &str) -> Result<Vec<String>> {
    let casted = df.column(column)?.cast(&DataType::String)?;
    Ok(casted
        .str()?
        .into_iter()
        .map(|v| v.unwrap_or_default().trim().to_string())
        .collect())
}

/// String values for an optional column, or `height` empty strings if absent.
pub fn string_values_or_empty(df: &DataFrame, column: &str) -> Result<Vec<String>> {
    if has_column(df, column) {
        string_values(df, column)
    } else {
        Ok(vec![String::new(); df.height()])
    }
}

/// Parse a numeric cell the lenient way: `"12"`, `"12.0"`, `"."` and empty
/// all work; the last two map to `None`.
pub fn parse_number(value: &str) -> Option<f64> {
    if is_missing(value) {
        return None;
    }
    value.trim().parse::<f64>().ok()
}

/// Placeholder spellings annotation tools use for an absent value.
pub fn is_missing(value: &str) -> bool {
    matches!(value.trim(), "" | "." | "NA" | "nan")
}

/// Natural chromosome order: 1..22, X, Y, M, then anything else by name.
pub fn chrom_order(a: &str, b: &str) -> Ordering {
    chrom_rank(a).cmp(&chrom_rank(b))
}

fn chrom_rank(chrom: &str) -> (u8, u32, String) {
    let bare = chrom
        .strip_prefix("chr")
        .or_else(|| chrom.strip_prefix("Chr"))
        .unwrap_or(chrom);
    if let Ok(n) = bare.parse::<u32>() {
        return (0, n, String::new());
    }
    match bare {
        "X" => (1, 0, String::new()),
        "Y" => (1, 1, String::new()),
        "M" | "MT" => (1, 2, String::new()),
        other => (2, 0, other.to_string()),
    }
}

pub fn build_pool(threads: usize) -> Result<ThreadPool> {
    Ok(ThreadPoolBuilder::new().num_threads(threads.max(1)).build()?)
}

/// Row count per chunk so that `len` rows split into `parts` near-equal chunks.
pub fn chunk_size(len: usize, parts: usize) -> usize {
    let parts = parts.max(1);
    ((len + parts - 1) / parts).max(1)
}
