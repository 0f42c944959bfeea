//! transdoc: translate and summarize web text into shared Google Docs.
//!
//! Runs the HTTP service, and offers offline rendering of model output into
//! a document plan for inspection.

mod commands;
mod http;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
