#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::multiple_crate_versions)]

//! Binary entrypoint that wires the cumularr services together and runs
//! the download-orchestration engine until shutdown.

mod bootstrap;
mod cli;
mod error;
mod logging;

use clap::Parser;

#[tokio::main]
async fn main() -> error::AppResult<()> {
    let cli = cli::Cli::parse();
    logging::init()?;
    bootstrap::run(cli).await
}
