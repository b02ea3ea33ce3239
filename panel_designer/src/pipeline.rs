//! Panel design run: score, condense, densify, select and collapse.

use std::collections::HashMap;
use std::fs::create_dir_all;
use std::path::{Path, PathBuf};

use polars::prelude::*;
use tracing::{info, warn};

use crate::config::{PanelConfig, Scoring};
use crate::data_handling::annotation::{filter_exonic, mutations_to_frame, regions_to_frame};
use crate::data_handling::gene_list::cross_reference;
use crate::error::Result;
use crate::helper_functions::{build_pool, write_tsv};
use crate::models::MutationRecord;
use crate::panel::bed::add_coord_column;
use crate::panel::collapse::{full_collapse, CollapseOutput};
use crate::panel::condense::{condense, CondensePolicy};
use crate::panel::density::compute_density;
use crate::panel::score::ScoreEngine;
use crate::panel::select::filter_cosmic;

pub struct PanelDesign {
    /// Full-merge listing of every scored mutation.
    pub listing: Vec<MutationRecord>,
    pub collapsed: CollapseOutput,
    /// Rows dropped by the score/density selection.
    pub removed: usize,
}

pub fn design_panel(mut records: Vec<MutationRecord>, config: &PanelConfig) -> Result<PanelDesign> {
    let pool = build_pool(config.threads)?;
    let filters = &config.filters;

    if let Some(annotation_filter) = &filters.annotation {
        records = filter_exonic(records, annotation_filter);
    }

    match &config.scoring {
        Scoring::FromType(weights) => ScoreEngine::new(weights).score_records(&mut records, &pool),
        Scoring::Precomputed => info!("Using precomputed cosmic scores"),
    }

    let listing = condense(records.clone(), CondensePolicy::FullMerge, &pool)?;

    let representatives = condense(records, CondensePolicy::PositionCollapse, &pool)?;
    let densified = compute_density(representatives, filters, &pool)?;
    let (selected, removed) = filter_cosmic(densified, filters);
    if selected.is_empty() {
        warn!("No mutations passed the score and density thresholds");
    }
    let collapsed = full_collapse(selected, filters.padding, &pool)?;

    Ok(PanelDesign {
        listing,
        collapsed,
        removed,
    })
}

/// Output file paths of a design run.
pub struct PanelFiles {
    pub listing: PathBuf,
    pub panel_mutations: PathBuf,
    pub regions: PathBuf,
}

impl PanelFiles {
    pub fn new(outdir: &Path, prefix: &str) -> Self {
        Self {
            listing: outdir.join(format!("{prefix}.mutations.tsv")),
            panel_mutations: outdir.join(format!("{prefix}.panel_mutations.tsv")),
            regions: outdir.join(format!("{prefix}.regions.tsv")),
        }
    }
}

pub fn region_table(
    design: &PanelDesign,
    gene_notes: Option<&HashMap<String, String>>,
) -> Result<DataFrame> {
    let regions = &design.collapsed.regions;
    let mut df = add_coord_column(&regions_to_frame(regions)?, "Chr", "Start", "End", "coords")?;
    if let Some(notes) = gene_notes {
        let hits = cross_reference(regions, notes);
        df.with_column(Series::new("ref_annotation".into(), hits))?;
    }
    Ok(df)
}

pub fn write_design(
    design: &PanelDesign,
    files: &PanelFiles,
    gene_notes: Option<&HashMap<String, String>>,
) -> Result<()> {
    if let Some(dir) = files.regions.parent() {
        create_dir_all(dir)?;
    }
    write_tsv(&mut mutations_to_frame(&design.listing)?, &files.listing)?;
    write_tsv(
        &mut mutations_to_frame(&design.collapsed.mutations)?,
        &files.panel_mutations,
    )?;
    write_tsv(&mut region_table(design, gene_notes)?, &files.regions)?;

    info!(
        "Panel of {} regions ({} bp, {} low-interest positions left out) written to {}",
        design.collapsed.regions.len(),
        design.collapsed.footprint(),
        design.removed,
        files.regions.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use crate::config::{FilterSettings, WeightTable};
    use crate::helper_functions::{read_tsv, string_values};

    fn config() -> PanelConfig {
        PanelConfig {
            scoring: Scoring::FromType(WeightTable {
                type_weight: HashMap::from([("substitution".to_string(), 2.0)]),
                location_weight: HashMap::from([("exon".to_string(), 3.0)]),
                gene_multiplier: Some(HashMap::from([("TP53".to_string(), 2.0)])),
            }),
            filters: FilterSettings {
                cosmic_rolling_min: 1.0,
                rolling_window_size: 2,
                cosmic_min: 20.0,
                cosmic_density_min: 100.0,
                padding: 50,
                annotation: None,
            },
            threads: 2,
        }
    }

    fn mutations() -> Vec<MutationRecord> {
        vec![
            MutationRecord::new("chr17", 1000, 1000, "C", "T")
                .with_gene("TP53")
                .with_type("5x(substitution@exon)"),
            MutationRecord::new("chr17", 1000, 1000, "C", "A")
                .with_gene("TP53")
                .with_type("1x(missense)"),
            MutationRecord::new("chr17", 1060, 1060, "G", "A")
                .with_gene("TP53")
                .with_type("3x(substitution@exon)"),
            MutationRecord::new("chr12", 500, 500, "G", "T")
                .with_gene("KRAS")
                .with_type("30x(missense)"),
            MutationRecord::new("chr12", 9000, 9000, "A", "G")
                .with_gene("KRAS")
                .with_type("2x(missense)"),
        ]
    }

    #[test]
    fn end_to_end_design() {
        let design = design_panel(mutations(), &config()).unwrap();

        // listing merges the two alleles at chr17:1000
        assert_eq!(design.listing.len(), 4);
        let merged = design.listing.iter().find(|r| r.chrom == "chr17" && r.start == 1000).unwrap();
        assert_eq!(merged.alt, "T/A");
        assert_eq!(merged.cosmic_score, 70 + 2);

        // chr12:9000 (score 2) is dropped; chr17 positions merge into one region
        assert_eq!(design.removed, 1);
        let regions = &design.collapsed.regions;
        assert_eq!(regions.len(), 2);
        assert_eq!(regions[0].chrom, "chr12");
        assert_eq!(regions[1].chrom, "chr17");
        assert_eq!(regions[1].mut_count, 2);
        assert_eq!(regions[1].cosmic_score, 70 + 42);
        assert_eq!((regions[1].start, regions[1].end), (950, 1110));
    }

    #[test]
    fn thresholds_that_drop_everything_yield_empty_panel() {
        let mut cfg = config();
        cfg.filters.cosmic_min = 1_000.0;
        let design = design_panel(mutations(), &cfg).unwrap();
        assert!(design.collapsed.regions.is_empty());
        assert_eq!(design.collapsed.footprint(), 0);
    }

    #[test]
    fn outputs_are_written() {
        let dir = tempfile::tempdir().unwrap();
        let design = design_panel(mutations(), &config()).unwrap();
        let files = PanelFiles::new(&dir.path().join("out"), "test");
        let notes = HashMap::from([("TP53".to_string(), "tumour suppressor".to_string())]);
        write_design(&design, &files, Some(&notes)).unwrap();

        let regions = read_tsv(&files.regions).unwrap();
        assert_eq!(regions.height(), 2);
        assert_eq!(
            string_values(&regions, "coords").unwrap(),
            vec!["chr12:450-550", "chr17:950-1110"]
        );
        assert_eq!(
            string_values(&regions, "ref_annotation").unwrap(),
            vec!["", "tumour suppressor"]
        );
        assert_eq!(read_tsv(&files.listing).unwrap().height(), 4);
        assert_eq!(read_tsv(&files.panel_mutations).unwrap().height(), 3);
    }
}
