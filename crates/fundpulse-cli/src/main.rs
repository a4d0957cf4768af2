//! Fundpulse CLI
//!
//! Runs one orchestrated stream (chat, analysis or deep research) and prints
//! its events to stdout as SSE frames. Logs go to stderr.
//!
//! ```bash
//! fundpulse analyze --fund 161725 --fund 110022
//! fundpulse analyze --fast "Anything unusual today?"
//! fundpulse research "Impact of rate cuts on gold ETFs"
//! fundpulse chat "What moved the CSI 300 today?"
//! ```

mod args;
mod commands;
mod logging;
mod router;
mod signal_handler;

use anyhow::Context;
use clap::Parser;
use fundpulse_core::config::load_config;

use args::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_deref()).context("Failed to load configuration")?;
    config.logging.merge(cli.logging_overrides());
    logging::init(&config.logging)?;

    router::route(cli, config).await
}
