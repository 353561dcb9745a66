//! CLI entry point for accumulating and rendering average photographs

use avgphoto::io::cli::{Cli, Runner};
use clap::Parser;

fn main() -> avgphoto::Result<()> {
    let cli = Cli::parse();
    let filter = if cli.quiet { "warn" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter)).init();
    Runner::new(cli).run()
}
