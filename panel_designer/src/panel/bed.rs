//! Interval-file helpers: unpadded merge for footprint measurement, data-row
//! sniffing, and `chr:start-end` conversion.

use polars::prelude::*;

use crate::error::{PanelError, Result};
use crate::helper_functions::{chrom_order, parse_number, require_columns, string_values};
use crate::models::{BedRegion, Coord};
use crate::panel::collapse::{group_ranges, overlap_groups};

/// Merge overlapping intervals per chromosome without padding.
pub fn collapse_intervals(mut intervals: Vec<Coord>) -> Vec<BedRegion> {
    intervals.sort_by(|a, b| {
        chrom_order(&a.chrom, &b.chrom)
            .then(a.start.cmp(&b.start))
            .then(a.end.cmp(&b.end))
    });

    let mut merged = Vec::new();
    let mut chrom_begin = 0;
    while chrom_begin < intervals.len() {
        let chrom = &intervals[chrom_begin].chrom;
        let chrom_end = intervals[chrom_begin..]
            .iter()
            .position(|c| &c.chrom != chrom)
            .map_or(intervals.len(), |p| chrom_begin + p);
        let members = &intervals[chrom_begin..chrom_end];

        let spans: Vec<(i64, i64)> = members.iter().map(|c| (c.start, c.end)).collect();
        let ids = overlap_groups(&spans);
        for (begin, end) in group_ranges(&ids) {
            let group = &spans[begin..end];
            let start = group.iter().map(|s| s.0).min().unwrap_or_default();
            let end = group.iter().map(|s| s.1).max().unwrap_or_default();
            merged.push(BedRegion {
                chrom: chrom.clone(),
                start,
                end,
                stretch: end - start,
            });
        }
        chrom_begin = chrom_end;
    }
    merged
}

pub fn total_size(regions: &[BedRegion]) -> i64 {
    regions.iter().map(|r| r.stretch).sum()
}

fn is_integral(field: &str) -> bool {
    field.trim().parse::<i64>().is_ok()
}

/// Whether a row looks like interval data rather than a header or comment:
/// a chromosome-like first field followed by two integer fields.
pub fn looks_like_interval_row(fields: &[&str]) -> bool {
    if fields.len() < 3 {
        return false;
    }
    let chrom = fields[0].trim();
    let chrom_like = chrom.starts_with("chr") || chrom.parse::<u32>().is_ok_and(|n| n < 25);
    chrom_like && is_integral(fields[1]) && is_integral(fields[2])
}

/// Append a `chr:start-end` column built from three structured columns.
pub fn add_coord_column(
    df: &DataFrame,
    chrom_col: &str,
    start_col: &str,
    end_col: &str,
    out_col: &str,
) -> Result<DataFrame> {
    require_columns(df, &[chrom_col, start_col, end_col], "coordinate table")?;
    let chroms = string_values(df, chrom_col)?;
    let starts = string_values(df, start_col)?;
    let ends = string_values(df, end_col)?;

    let coords: Vec<String> = chroms
        .iter()
        .zip(starts.iter().zip(&ends))
        .map(|(c, (s, e))| match (parse_number(s), parse_number(e)) {
            (Some(start), Some(end)) => Ok(Coord::new(c, start as i64, end as i64).to_string()),
            _ => Err(PanelError::InvalidCoordinate(format!("{c}:{s}-{e}"))),
        })
        .collect::<Result<_>>()?;

    let mut out = df.clone();
    out.with_column(Series::new(PlSmallStr::from(out_col), coords))?;
    Ok(out)
}

/// Parse a `chr:start-end` column back into `Chr`, `Start` and `End`.
pub fn split_coord_column(df: &DataFrame, coord_col: &str) -> Result<DataFrame> {
    require_columns(df, &[coord_col], "coordinate table")?;
    let coords = string_values(df, coord_col)?
        .iter()
        .map(|s| s.parse::<Coord>())
        .collect::<Result<Vec<Coord>>>()?;

    let mut out = df.clone();
    out.with_column(Series::new(
        PlSmallStr::from("Chr"),
        coords.iter().map(|c| c.chrom.clone()).collect::<Vec<String>>(),
    ))?;
    out.with_column(Series::new(
        PlSmallStr::from("Start"),
        coords.iter().map(|c| c.start).collect::<Vec<i64>>(),
    ))?;
    out.with_column(Series::new(
        PlSmallStr::from("End"),
        coords.iter().map(|c| c.end).collect::<Vec<i64>>(),
    ))?;
    Ok(out)
}
