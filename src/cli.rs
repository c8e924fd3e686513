use std::path::PathBuf;

/// Canopy statistics CLI (argument schema only)
#[derive(clap::Parser, Debug)]
#[command(name = "treevis", version, about, propagate_version = true)]
pub struct Cli {
    /// Increase output verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Convert raw layers to parquet and split them per district
    Partition(PartitionArgs),

    /// Compute, normalize and export per-district statistics, then merge
    Stats(StatsArgs),

    /// Merge existing per-district reports into the municipality report
    Merge(MergeArgs),

    /// Partition and compute statistics in one go
    Run(RunArgs),
}

#[derive(clap::Args, Debug)]
pub struct PartitionArgs {
    /// Run configuration (JSON)
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,
}

#[derive(clap::Args, Debug)]
pub struct StatsArgs {
    /// Run configuration (JSON)
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,
}

#[derive(clap::Args, Debug)]
pub struct MergeArgs {
    /// Run configuration (JSON)
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,
}

#[derive(clap::Args, Debug)]
pub struct RunArgs {
    /// Run configuration (JSON)
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,
}
