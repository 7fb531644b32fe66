//! Aurelia-Check-RS: template compiler and type-check bridge for Aurelia
//! projects.

mod cli;
mod config;
mod orchestrator;
mod output;

use clap::Parser;
use cli::Args;
use miette::Result;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let result = orchestrator::run(args).await;

    match result {
        Ok(summary) => {
            if summary.failed() {
                std::process::exit(1);
            }
            Ok(())
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
