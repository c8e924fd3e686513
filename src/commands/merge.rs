use anyhow::Result;
use treevis::{district_list, RunConfig};

pub fn run(_cli: &crate::cli::Cli, args: &crate::cli::MergeArgs) -> Result<()> {
    let cfg = RunConfig::from_file(&args.config)?;
    let districts = district_list(&cfg)?;
    treevis::stats::merge::run(&cfg, &districts)
}
