mod cli;
mod commands;

use cli::{Cli, Commands};
use commands::{merge, partition, run as run_all, stats};

pub fn run() -> anyhow::Result<()> {
    use clap::Parser;

    let cli = Cli::parse();
    init_logging(cli.verbose);
    match &cli.command {
        Commands::Partition(args) => partition::run(&cli, args),
        Commands::Stats(args) => stats::run(&cli, args),
        Commands::Merge(args) => merge::run(&cli, args),
        Commands::Run(args) => run_all::run(&cli, args),
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => log::LevelFilter::Info,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::builder()
        .format_timestamp(None)
        .filter_level(level)
        .init();
}

fn main() -> anyhow::Result<()> { run() }
