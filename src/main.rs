//! Embedly CLI
//!
//! Calls the Embedly API from the command line and runs plain-English
//! feature files against it.

use clap::Parser;
use embedly::{cli, commands};
use commands::Commands;

#[derive(Parser)]
#[command(name = "embedly", about = "Embedly API client and scenario runner")]
#[command(version, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = cli::dispatch(cli.command).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
