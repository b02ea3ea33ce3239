//! Reference gene list used to annotate the region report.
//!
//! First column is the gene symbol, second a free-text note. Accepts an
//! `.xlsx` workbook (first sheet) or a tab-separated file with a header row.

use std::collections::HashMap;
use std::path::PathBuf;

use polars::prelude::*;
use tracing::{debug, info};

use crate::error::{PanelError, Result};
use crate::helper_functions::{read_tsv, string_values};
use crate::models::{normalize_gene, Dataset, RegionRecord};

pub struct GeneList {
    pub path: PathBuf,
}

fn cell_to_string(cell: &calamine::DataType) -> String {
    use calamine::DataType as Ct;
    match cell {
        Ct::String(s) => s.clone(),
        Ct::Empty => String::new(),
        Ct::Bool(b) => b.to_string(),
        Ct::Error(e) => format!("ERR({e:?})"),
        Ct::Float(n) | Ct::Duration(n) => n.to_string(),
        Ct::Int(i) => i.to_string(),
        Ct::DateTime(f) => f.to_string(),
        Ct::DateTimeIso(s) | Ct::DurationIso(s) => s.clone(),
    }
}

/// First sheet of a workbook as a two-column string table.
fn read_excel(path: &PathBuf) -> Result<DataFrame> {
    use calamine::{open_workbook_auto, Reader};

    let spreadsheet_err = |e: String| PanelError::Spreadsheet(format!("{}: {e}", path.display()));

    let mut wb = open_workbook_auto(path).map_err(|e| spreadsheet_err(e.to_string()))?;
    let range = wb
        .worksheet_range_at(0)
        .ok_or_else(|| spreadsheet_err("worksheet missing".into()))?
        .map_err(|e| spreadsheet_err(e.to_string()))?;

    let mut rows = range.rows();
    let header = rows
        .next()
        .ok_or_else(|| spreadsheet_err("empty sheet".into()))?;
    debug!("Gene list header = {:?}", header.iter().map(cell_to_string).collect::<Vec<_>>());

    let mut genes = Vec::with_capacity(range.height());
    let mut notes = Vec::with_capacity(range.height());
    for row in rows {
        genes.push(row.first().map(cell_to_string).unwrap_or_default());
        notes.push(row.get(1).map(cell_to_string).unwrap_or_default());
    }

    Ok(DataFrame::new(vec![
        Column::from(Series::new("Gene".into(), genes)),
        Column::from(Series::new("annotation".into(), notes)),
    ])?)
}

/// First two columns of a tab-separated table, renamed to `Gene` and
/// `annotation`.
fn read_text(path: &PathBuf) -> Result<DataFrame> {
    let df = read_tsv(path)?;
    let names = df.get_column_names_owned();
    let gene_col = names
        .first()
        .ok_or_else(|| PanelError::shape("Gene", &path.display().to_string()))?;
    let genes = string_values(&df, gene_col)?;
    let notes = match names.get(1) {
        Some(col) => string_values(&df, col)?,
        None => vec![String::new(); df.height()],
    };
    Ok(DataFrame::new(vec![
        Column::from(Series::new("Gene".into(), genes)),
        Column::from(Series::new("annotation".into(), notes)),
    ])?)
}

impl Dataset for GeneList {
    fn load(&self) -> Result<DataFrame> {
        info!("Reading reference gene list from {}", self.path.display());
        let is_excel = self
            .path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("xlsx") || e.eq_ignore_ascii_case("xls"));
        if is_excel {
            read_excel(&self.path)
        } else {
            read_text(&self.path)
        }
    }
}

/// Gene symbol to note, empty symbols skipped.
pub fn gene_annotations(df: &DataFrame) -> Result<HashMap<String, String>> {
    let genes = string_values(df, "Gene")?;
    let notes = string_values(df, "annotation")?;
    Ok(genes
        .into_iter()
        .zip(notes)
        .filter(|(g, _)| !g.is_empty())
        .map(|(g, n)| (normalize_gene(&g), n))
        .collect())
}

/// Note for each region: primary gene first, then the secondary one.
pub fn cross_reference(regions: &[RegionRecord], notes: &HashMap<String, String>) -> Vec<String> {
    let hits: Vec<String> = regions
        .iter()
        .map(|r| {
            notes
                .get(&r.gene_primary)
                .or_else(|| notes.get(&r.gene_secondary))
                .cloned()
                .unwrap_or_default()
        })
        .collect();
    info!(
        "{} of {} regions hit the reference gene list",
        hits.iter().filter(|h| !h.is_empty()).count(),
        regions.len()
    );
    hits
}
