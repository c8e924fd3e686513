use anyhow::Result;
use treevis::{Partitioner, RunConfig};

pub fn run(_cli: &crate::cli::Cli, args: &crate::cli::RunArgs) -> Result<()> {
    let cfg = RunConfig::from_file(&args.config)?;
    Partitioner::new(&cfg).run()?;
    treevis::stats::run(&cfg)
}
