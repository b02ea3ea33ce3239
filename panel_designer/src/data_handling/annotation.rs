use std::path::PathBuf;

use polars::prelude::*;
use tracing::{debug, info};

use crate::config::AnnotationFilter;
use crate::error::{PanelError, Result};
use crate::helper_functions::{
    is_missing, parse_number, read_tsv, require_columns, string_values, string_values_or_empty,
};
use crate::models::{normalize_gene, Dataset, MutationRecord, RegionRecord, ScoreSource};

const KEY_COLUMNS: [&str; 5] = ["Chr", "Start", "End", "Ref", "Alt"];

/// Tab-separated mutation table as written by the annotation provider.
pub struct AnnotationTable {
    pub path: PathBuf,
}

impl Dataset for AnnotationTable {
    fn load(&self) -> Result<DataFrame> {
        info!("Reading annotated mutations from {}", self.path.display());
        let df = clean_columns(read_tsv(&self.path)?)?;
        require_columns(&df, &KEY_COLUMNS, &self.path.display().to_string())?;
        debug!("Annotation columns: {:?}", df.get_column_names());
        Ok(df)
    }
}

/// Strip database suffixes from column names. Pass-through columns named
/// `Other*` carry their real name in the first data row, which is then
/// dropped.
pub fn clean_columns(mut df: DataFrame) -> Result<DataFrame> {
    let names: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|n| n.to_string())
        .collect();
    let has_other = names.iter().any(|n| n.starts_with("Other"));

    let mut cleaned: Vec<PlSmallStr> = Vec::with_capacity(names.len());
    for name in &names {
        let new_name = if has_other && name.starts_with("Other") {
            string_values(&df, name)?
                .first()
                .cloned()
                .unwrap_or_else(|| name.clone())
        } else {
            name.replace(".refGene", "").replace("_exome_ALL", "")
        };
        cleaned.push(PlSmallStr::from(new_name.as_str()));
    }
    df.set_column_names(cleaned)?;

    if has_other && df.height() > 0 {
        df = df.slice(1, df.height() - 1);
    }
    Ok(df)
}

/// Convert a loaded table into typed records. With precomputed scores the
/// `cosmic_score` column must be present.
pub fn records_from_frame(df: &DataFrame, source: ScoreSource) -> Result<Vec<MutationRecord>> {
    require_columns(df, &KEY_COLUMNS, "mutation table")?;
    if source == ScoreSource::Precomputed {
        require_columns(df, &["cosmic_score"], "mutation table")?;
    }

    let chrom = string_values(df, "Chr")?;
    let start = string_values(df, "Start")?;
    let end = string_values(df, "End")?;
    let reference = string_values(df, "Ref")?;
    let alt = string_values(df, "Alt")?;
    let func = string_values_or_empty(df, "Func")?;
    let gene = string_values_or_empty(df, "Gene")?;
    let exonic_func = string_values_or_empty(df, "ExonicFunc")?;
    let aa_change = string_values_or_empty(df, "AAChange")?;
    let cytoband = string_values_or_empty(df, "cytoband")?;
    let gnomad = string_values_or_empty(df, "gnomAD")?;
    let mut_id = string_values_or_empty(df, "Mut_ID")?;
    let mut_type = string_values_or_empty(df, "type")?;
    let score = string_values_or_empty(df, "cosmic_score")?;

    let mut records = Vec::with_capacity(df.height());
    for i in 0..df.height() {
        let number = |values: &[String], column: &str| numeric_cell(&values[i], column, i);
        records.push(MutationRecord {
            chrom: chrom[i].clone(),
            start: number(&start, "Start")? as i64,
            end: number(&end, "End")? as i64,
            reference: reference[i].clone(),
            alt: alt[i].clone(),
            func: func[i].clone(),
            gene: normalize_gene(&gene[i]),
            exonic_func: exonic_func[i].clone(),
            aa_change: aa_change[i].clone(),
            cytoband: cytoband[i].clone(),
            population_freq: number(&gnomad, "gnomAD")?,
            mut_id: mut_id[i].clone(),
            mut_type: mut_type[i].clone(),
            cosmic_score: match source {
                ScoreSource::Precomputed => number(&score, "cosmic_score")? as i64,
                ScoreSource::FromType => 0,
            },
            cosmic_density: None,
            ovgroup: None,
        });
    }

    if let Some(bad) = records.iter().find(|r| r.start > r.end) {
        return Err(PanelError::InvalidRecord(format!(
            "start after end at {}:{}-{}",
            bad.chrom, bad.start, bad.end
        )));
    }
    Ok(records)
}

/// Missing cells (empty, `.`, `NA`) read as 0; anything else must parse.
fn numeric_cell(value: &str, column: &str, row: usize) -> Result<f64> {
    if is_missing(value) {
        return Ok(0.0);
    }
    parse_number(value).ok_or_else(|| {
        PanelError::InvalidRecord(format!(
            "non-numeric {column} value '{value}' in data row {}",
            row + 1
        ))
    })
}

/// Keep exonic, functional, non-polymorphic mutations.
pub fn filter_exonic(records: Vec<MutationRecord>, filter: &AnnotationFilter) -> Vec<MutationRecord> {
    let before = records.len();
    let kept: Vec<MutationRecord> = records
        .into_iter()
        .filter(|r| {
            filter.exonic_list.as_ref().map_or(true, |l| l.contains(&r.func))
                && filter.mut_list.as_ref().map_or(true, |l| l.contains(&r.exonic_func))
                && filter.gnomad_max.map_or(true, |max| r.population_freq <= max)
        })
        .collect();
    info!("Filtered out {} mutations [{} --> {}]", before - kept.len(), before, kept.len());
    kept
}

fn text_column<'a>(name: &str, values: impl Iterator<Item = &'a str>) -> Column {
    Column::from(Series::new(
        PlSmallStr::from(name),
        values.collect::<Vec<&str>>(),
    ))
}

pub fn mutations_to_frame(records: &[MutationRecord]) -> Result<DataFrame> {
    let mut columns = vec![
        text_column("Chr", records.iter().map(|r| r.chrom.as_str())),
        Column::from(Series::new("Start".into(), records.iter().map(|r| r.start).collect::<Vec<i64>>())),
        Column::from(Series::new("End".into(), records.iter().map(|r| r.end).collect::<Vec<i64>>())),
        text_column("Ref", records.iter().map(|r| r.reference.as_str())),
        text_column("Alt", records.iter().map(|r| r.alt.as_str())),
        text_column("Func", records.iter().map(|r| r.func.as_str())),
        text_column("Gene", records.iter().map(|r| r.gene.as_str())),
        text_column("ExonicFunc", records.iter().map(|r| r.exonic_func.as_str())),
        text_column("AAChange", records.iter().map(|r| r.aa_change.as_str())),
        text_column("cytoband", records.iter().map(|r| r.cytoband.as_str())),
        Column::from(Series::new(
            "gnomAD".into(),
            records.iter().map(|r| r.population_freq).collect::<Vec<f64>>(),
        )),
        text_column("Mut_ID", records.iter().map(|r| r.mut_id.as_str())),
        text_column("type", records.iter().map(|r| r.mut_type.as_str())),
        Column::from(Series::new(
            "cosmic_score".into(),
            records.iter().map(|r| r.cosmic_score).collect::<Vec<i64>>(),
        )),
        Column::from(Series::new(
            "cosmic_density".into(),
            records.iter().map(|r| r.cosmic_density).collect::<Vec<Option<f64>>>(),
        )),
    ];
    if records.iter().any(|r| r.ovgroup.is_some()) {
        columns.push(Column::from(Series::new(
            "ovgroup".into(),
            records.iter().map(|r| r.ovgroup).collect::<Vec<Option<i64>>>(),
        )));
    }
    Ok(DataFrame::new(columns)?)
}

pub fn regions_to_frame(regions: &[RegionRecord]) -> Result<DataFrame> {
    let df = DataFrame::new(vec![
        text_column("Chr", regions.iter().map(|r| r.chrom.as_str())),
        Column::from(Series::new("Start".into(), regions.iter().map(|r| r.start).collect::<Vec<i64>>())),
        Column::from(Series::new("End".into(), regions.iter().map(|r| r.end).collect::<Vec<i64>>())),
        text_column("Gene", regions.iter().map(|r| r.gene_primary.as_str())),
        text_column("Gene2", regions.iter().map(|r| r.gene_secondary.as_str())),
        text_column("cytoband", regions.iter().map(|r| r.cytoband.as_str())),
        Column::from(Series::new(
            "gnomAD".into(),
            regions.iter().map(|r| r.population_freq).collect::<Vec<f64>>(),
        )),
        Column::from(Series::new(
            "cosmic_score".into(),
            regions.iter().map(|r| r.cosmic_score).collect::<Vec<i64>>(),
        )),
        Column::from(Series::new(
            "cosmic_density".into(),
            regions.iter().map(|r| r.cosmic_density).collect::<Vec<Option<f64>>>(),
        )),
        Column::from(Series::new("ovgroup".into(), regions.iter().map(|r| r.ovgroup).collect::<Vec<i64>>())),
        Column::from(Series::new(
            "mutN".into(),
            regions.iter().map(|r| r.mut_count as u64).collect::<Vec<u64>>(),
        )),
        Column::from(Series::new("stretch".into(), regions.iter().map(|r| r.stretch).collect::<Vec<i64>>())),
    ])?;
    Ok(df)
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::df;

    fn raw_table() -> DataFrame {
        df![
            "Chr" => &["chr17", "chr17", "chr1"],
            "Start" => &["7674220", "7674220.0", "100"],
            "End" => &["7674220", "7674220", "100"],
            "Ref" => &["C", "C", "A"],
            "Alt" => &["T", "A", "G"],
            "Func.refGene" => &["exonic", "exonic", "intronic"],
            "Gene.refGene" => &["TP53;TP53", "TP53", "ABC"],
            "ExonicFunc.refGene" => &["nonsynonymous SNV", "stopgain", "."],
            "gnomAD_exome_ALL" => &[".", "0.2", "0.0001"],
            "type" => &["5x(substitution@exon)", "", "1x(other)"]
        ]
        .unwrap()
    }

    #[test]
    fn suffixes_are_removed_and_genes_normalized() {
        let df = clean_columns(raw_table()).unwrap();
        for name in ["Func", "Gene", "ExonicFunc", "gnomAD"] {
            assert!(df.get_column_names().iter().any(|n| n.as_str() == name));
        }
        let records = records_from_frame(&df, ScoreSource::FromType).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].gene, "TP53");
        assert_eq!(records[1].start, 7674220);
        assert_eq!(records[0].population_freq, 0.0);
        assert_eq!(records[1].population_freq, 0.2);
        assert_eq!(records[0].mut_type, "5x(substitution@exon)");
    }

    #[test]
    fn other_columns_take_name_from_first_row() {
        let df = df![
            "Chr" => &["", "chr1"],
            "Start" => &["", "5"],
            "End" => &["", "5"],
            "Ref" => &["", "A"],
            "Alt" => &["", "T"],
            "Otherinfo1" => &["Mut_ID", "COSV1"]
        ]
        .unwrap();
        let df = clean_columns(df).unwrap();
        assert_eq!(df.height(), 1);
        assert_eq!(string_values(&df, "Mut_ID").unwrap(), vec!["COSV1"]);
    }

    #[test]
    fn precomputed_scores_need_their_column() {
        let df = clean_columns(raw_table()).unwrap();
        match records_from_frame(&df, ScoreSource::Precomputed) {
            Err(PanelError::DataShape { column, .. }) => assert_eq!(column, "cosmic_score"),
            other => panic!("expected data shape error, got {other:?}"),
        }
    }

    #[test]
    fn missing_key_column_is_fatal() {
        let df = df!["Chr" => &["chr1"], "Start" => &["1"]].unwrap();
        assert!(matches!(
            records_from_frame(&df, ScoreSource::FromType),
            Err(PanelError::DataShape { .. })
        ));
    }

    #[test]
    fn garbage_in_numeric_columns_is_rejected() {
        let df = df![
            "Chr" => &["chr1", "chr1"],
            "Start" => &["100", "12abc"],
            "End" => &["100", "500"],
            "Ref" => &["A", "C"],
            "Alt" => &["G", "T"]
        ]
        .unwrap();
        match records_from_frame(&df, ScoreSource::FromType) {
            Err(PanelError::InvalidRecord(msg)) => {
                assert!(msg.contains("Start"));
                assert!(msg.contains("12abc"));
                assert!(msg.contains("row 2"));
            }
            other => panic!("expected invalid record, got {other:?}"),
        }

        let scored = df![
            "Chr" => &["chr1"],
            "Start" => &["100"],
            "End" => &["100"],
            "Ref" => &["A"],
            "Alt" => &["G"],
            "cosmic_score" => &["high"]
        ]
        .unwrap();
        assert!(matches!(
            records_from_frame(&scored, ScoreSource::Precomputed),
            Err(PanelError::InvalidRecord(_))
        ));
    }

    #[test]
    fn missing_numbers_read_as_zero() {
        let df = df![
            "Chr" => &["chr1"],
            "Start" => &["5"],
            "End" => &["5"],
            "Ref" => &["A"],
            "Alt" => &["G"],
            "gnomAD" => &["."],
            "cosmic_score" => &[""]
        ]
        .unwrap();
        let records = records_from_frame(&df, ScoreSource::Precomputed).unwrap();
        assert_eq!(records[0].population_freq, 0.0);
        assert_eq!(records[0].cosmic_score, 0);
    }

    #[test]
    fn exonic_filter_applies_each_configured_rule() {
        let df = clean_columns(raw_table()).unwrap();
        let records = records_from_frame(&df, ScoreSource::FromType).unwrap();
        let filter = AnnotationFilter {
            exonic_list: Some(vec!["exonic".into()]),
            mut_list: None,
            gnomad_max: Some(0.1),
        };
        let kept = filter_exonic(records, &filter);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].alt, "T");
    }

    #[test]
    fn frames_carry_expected_columns() {
        let records = vec![MutationRecord::new("chr1", 1, 1, "A", "T").with_density(0.5)];
        let df = mutations_to_frame(&records).unwrap();
        assert_eq!(df.height(), 1);
        assert!(df.column("ovgroup").is_err());
        assert_eq!(df.column("cosmic_density").unwrap().f64().unwrap().get(0), Some(0.5));
    }
}
