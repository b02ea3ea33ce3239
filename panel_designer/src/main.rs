use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::cli::{BedSizeArgs, Cli, Command, DesignArgs};
use crate::config::{load_filter_settings, load_weights, PanelConfig, Scoring};
use crate::data_handling::annotation::{records_from_frame, AnnotationTable};
use crate::data_handling::gene_list::{gene_annotations, GeneList};
use crate::data_handling::interval_file::{intervals_from_frame, CoordList, IntervalFile};
use crate::helper_functions::write_tsv;
use crate::models::Dataset;
use crate::panel::bed::{add_coord_column, collapse_intervals, total_size};
use crate::pipeline::{design_panel, write_design, PanelFiles};

mod cli;
mod config;
mod data_handling;
mod error;
mod helper_functions;
mod models;
mod panel;
mod pipeline;

fn run_design(args: DesignArgs) -> Result<()> {
    let filters = load_filter_settings(&args.filters)
        .with_context(|| format!("loading filter settings from {}", args.filters.display()))?;
    let scoring = match (&args.weights, args.precomputed_scores) {
        (_, true) => Scoring::Precomputed,
        (Some(path), false) => Scoring::FromType(
            load_weights(path).with_context(|| format!("loading weights from {}", path.display()))?,
        ),
        (None, false) => anyhow::bail!("--weights is required unless --precomputed-scores is set"),
    };
    let config = PanelConfig {
        scoring,
        filters,
        threads: args.threads,
    };

    let table = AnnotationTable {
        path: args.mutations.clone(),
    }
    .load()?;
    let records = records_from_frame(&table, config.scoring.source())?;
    info!("Loaded {} mutations", records.len());

    let gene_notes = match &args.gene_list {
        Some(path) => Some(gene_annotations(&GeneList { path: path.clone() }.load()?)?),
        None => None,
    };

    let design = design_panel(records, &config)?;
    write_design(&design, &PanelFiles::new(&args.outdir, &args.prefix), gene_notes.as_ref())?;
    Ok(())
}

fn run_bed_size(args: BedSizeArgs) -> Result<()> {
    let intervals = match (&args.bed, &args.coords) {
        (Some(bed), _) => {
            let df = IntervalFile { path: bed.clone() }.load()?;
            intervals_from_frame(&df, "chrom", "start", "end")?
        }
        (None, Some(coords)) => {
            let df = CoordList { path: coords.clone() }.load()?;
            intervals_from_frame(&df, "Chr", "Start", "End")?
        }
        (None, None) => anyhow::bail!("either --bed or --coords is required"),
    };

    let merged = collapse_intervals(intervals);
    let size = total_size(&merged);
    info!("{} merged intervals covering {} bp", merged.len(), size);
    println!("{size}");

    if let Some(out) = &args.out {
        write_merged(&merged, out)?;
    }
    Ok(())
}

fn write_merged(merged: &[crate::models::BedRegion], out: &Path) -> Result<()> {
    use polars::prelude::*;

    let df = DataFrame::new(vec![
        Column::from(Series::new("Chr".into(), merged.iter().map(|r| r.chrom.as_str()).collect::<Vec<_>>())),
        Column::from(Series::new("Start".into(), merged.iter().map(|r| r.start).collect::<Vec<i64>>())),
        Column::from(Series::new("End".into(), merged.iter().map(|r| r.end).collect::<Vec<i64>>())),
        Column::from(Series::new("stretch".into(), merged.iter().map(|r| r.stretch).collect::<Vec<i64>>())),
    ])?;
    let mut df = add_coord_column(&df, "Chr", "Start", "End", "coords")?;
    write_tsv(&mut df, out)?;
    info!("Merged intervals written to {}", out.display());
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    match cli.command {
        Command::Design(args) => {
            info!("Starting panel design");
            run_design(args)
        }
        Command::BedSize(args) => run_bed_size(args),
    }
}
