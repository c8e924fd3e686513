use anyhow::Result;
use treevis::RunConfig;

pub fn run(_cli: &crate::cli::Cli, args: &crate::cli::StatsArgs) -> Result<()> {
    let cfg = RunConfig::from_file(&args.config)?;
    treevis::stats::run(&cfg)
}
