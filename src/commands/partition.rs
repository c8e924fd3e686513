use anyhow::Result;
use log::info;
use treevis::{Partitioner, RunConfig};

pub fn run(_cli: &crate::cli::Cli, args: &crate::cli::PartitionArgs) -> Result<()> {
    let cfg = RunConfig::from_file(&args.config)?;
    let summary = Partitioner::new(&cfg).run()?;
    info!(
        "partition: {} written, {} already present, {} layers skipped",
        summary.written, summary.skipped_existing, summary.skipped_layers
    );
    Ok(())
}
