use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cli = x::cli::Cli::parse();
    x::app::run(cli)
}
