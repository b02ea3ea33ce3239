//! Externally supplied interval files.
//!
//! BED-like files arrive with an unknown number of header or track lines.
//! Leading rows are skipped until one looks like interval data; the six
//! positional columns are then read as chrom, start, end, id, description
//! and info.

use std::path::PathBuf;

use polars::prelude::*;
use tracing::{debug, info};

use crate::error::{PanelError, Result};
use crate::helper_functions::{parse_number, require_columns, string_values};
use crate::models::{Coord, Dataset};
use crate::panel::bed::{looks_like_interval_row, split_coord_column};

const BED_COLUMNS: [&str; 6] = ["chrom", "start", "end", "id", "description", "info"];

fn tsv_reader(path: &PathBuf) -> Result<csv::Reader<std::fs::File>> {
    Ok(csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .comment(None)
        .quoting(false)
        .from_path(path)?)
}

pub struct IntervalFile {
    pub path: PathBuf,
}

impl Dataset for IntervalFile {
    fn load(&self) -> Result<DataFrame> {
        info!("Reading interval file {}", self.path.display());
        let mut columns: Vec<Vec<String>> = vec![Vec::new(); BED_COLUMNS.len()];
        let mut skipped = 0;
        let mut in_data = false;

        for row in tsv_reader(&self.path)?.records() {
            let row = row?;
            let fields: Vec<&str> = row.iter().collect();
            if fields.iter().all(|f| f.trim().is_empty()) {
                continue;
            }
            if !in_data {
                if !looks_like_interval_row(&fields) {
                    skipped += 1;
                    continue;
                }
                in_data = true;
            }
            for (i, column) in columns.iter_mut().enumerate() {
                column.push(fields.get(i).map(|f| f.trim().to_string()).unwrap_or_default());
            }
        }
        debug!("Skipped {} header lines in {}", skipped, self.path.display());

        let series: Vec<Column> = BED_COLUMNS
            .iter()
            .zip(columns)
            .map(|(name, values)| Column::from(Series::new(PlSmallStr::from(*name), values)))
            .collect();
        Ok(DataFrame::new(series)?)
    }
}

/// Plain list of `chr:start-end` strings in the first column. Leading lines
/// that do not parse are treated as header.
pub struct CoordList {
    pub path: PathBuf,
}

impl Dataset for CoordList {
    fn load(&self) -> Result<DataFrame> {
        info!("Reading coordinate list {}", self.path.display());
        let mut coords: Vec<String> = Vec::new();
        for row in tsv_reader(&self.path)?.records() {
            let row = row?;
            let Some(first) = row.get(0).map(str::trim).filter(|f| !f.is_empty()) else {
                continue;
            };
            if coords.is_empty() && first.parse::<Coord>().is_err() {
                debug!("Skipping header line '{}'", first);
                continue;
            }
            coords.push(first.to_string());
        }
        let df = DataFrame::new(vec![Column::from(Series::new("coords".into(), coords))])?;
        split_coord_column(&df, "coords")
    }
}

/// Intervals from a table with `chrom`/`start`/`end` style columns.
pub fn intervals_from_frame(
    df: &DataFrame,
    chrom_col: &str,
    start_col: &str,
    end_col: &str,
) -> Result<Vec<Coord>> {
    require_columns(df, &[chrom_col, start_col, end_col], "interval table")?;
    let chroms = string_values(df, chrom_col)?;
    let starts = string_values(df, start_col)?;
    let ends = string_values(df, end_col)?;

    chroms
        .into_iter()
        .zip(starts.iter().zip(&ends))
        .map(|(chrom, (s, e))| {
            match (parse_number(s), parse_number(e)) {
                (Some(start), Some(end)) => Ok(Coord {
                    chrom,
                    start: start as i64,
                    end: end as i64,
                }),
                _ => Err(PanelError::InvalidRecord(format!("{chrom}\t{s}\t{e}"))),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn header_lines_are_sniffed_away() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("panel.bed");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "browser position chr1:1-100").unwrap();
        writeln!(f, "track name=\"panel\" description=\"x\"").unwrap();
        writeln!(f, "chrom\tstart\tend\tid\tdescription\tinfo").unwrap();
        writeln!(f, "chr1\t100\t200\tr1\tTP53 exon\t.").unwrap();
        writeln!(f, "chr1\t150\t250\tr2").unwrap();
        writeln!(f, "chr2\t10\t20\tr3\tKRAS\tx").unwrap();
        drop(f);

        let df = IntervalFile { path }.load().unwrap();
        assert_eq!(df.height(), 3);
        assert_eq!(df.width(), 6);
        assert_eq!(string_values(&df, "description").unwrap()[1], "");

        let intervals = intervals_from_frame(&df, "chrom", "start", "end").unwrap();
        assert_eq!(intervals[0], Coord::new("chr1", 100, 200));
    }

    #[test]
    fn coordinate_list_skips_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("coords.txt");
        std::fs::write(&path, "region\nchr7:100-200\nchr1:5-9\n").unwrap();

        let df = CoordList { path }.load().unwrap();
        let intervals = intervals_from_frame(&df, "Chr", "Start", "End").unwrap();
        assert_eq!(intervals, vec![Coord::new("chr7", 100, 200), Coord::new("chr1", 5, 9)]);
    }
}
