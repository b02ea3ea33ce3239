use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "panel_designer", version, about = "Design targeted sequencing panels from scored mutations")]
pub struct Cli {
    #[arg(
        short = 'v',
        long = "verbose",
        global = true,
        action = ArgAction::SetTrue,
        help = "Log per-chromosome progress"
    )]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Score mutations and collapse them into padded panel regions
    Design(DesignArgs),
    /// Merge an external interval file and report its covered size
    BedSize(BedSizeArgs),
}

#[derive(Debug, Args)]
pub struct DesignArgs {
    #[arg(
        short = 'm',
        long = "mutations",
        value_name = "PATH",
        help = "Annotated mutation table (tab-separated)"
    )]
    pub mutations: PathBuf,

    #[arg(
        short = 'w',
        long = "weights",
        value_name = "PATH",
        required_unless_present = "precomputed_scores",
        help = "Weight table as JSON with 'type', 'location' and optional 'genes' (YAML is not read)"
    )]
    pub weights: Option<PathBuf>,

    #[arg(
        short = 'f',
        long = "filters",
        value_name = "PATH",
        help = "Filter settings as JSON (YAML is not read)"
    )]
    pub filters: PathBuf,

    #[arg(
        short = 'g',
        long = "gene-list",
        value_name = "PATH",
        help = "Reference gene list (.xlsx or tab-separated) for the region report"
    )]
    pub gene_list: Option<PathBuf>,

    #[arg(
        long = "precomputed-scores",
        action = ArgAction::SetTrue,
        help = "Take scores from the 'cosmic_score' column instead of the weight table"
    )]
    pub precomputed_scores: bool,

    #[arg(
        short = 'o',
        long = "outdir",
        value_name = "PATH",
        default_value("panel"),
        help = "Output directory"
    )]
    pub outdir: PathBuf,

    #[arg(
        short = 'p',
        long = "prefix",
        value_name = "NAME",
        default_value("panel"),
        help = "Prefix for output file names"
    )]
    pub prefix: String,

    #[arg(
        short = 't',
        long = "threads",
        value_name = "THREADS",
        default_value_t = 2,
        help = "Number of worker threads"
    )]
    pub threads: usize,
}

#[derive(Debug, Args)]
pub struct BedSizeArgs {
    #[arg(
        short = 'b',
        long = "bed",
        value_name = "PATH",
        conflicts_with("coords"),
        required_unless_present = "coords",
        help = "Interval file with unknown header lines"
    )]
    pub bed: Option<PathBuf>,

    #[arg(
        short = 'c',
        long = "coords",
        value_name = "PATH",
        help = "File with one chr:start-end coordinate per line"
    )]
    pub coords: Option<PathBuf>,

    #[arg(
        short = 'o',
        long = "out",
        value_name = "PATH",
        help = "Write the merged intervals here"
    )]
    pub out: Option<PathBuf>,
}
