//! Command routing logic for CLI

use crate::args::{Cli, Commands};
use crate::commands;
use crate::commands::stream::StreamRequest;
use fundpulse_core::config::PulseConfig;
use fundpulse_core::orchestrator::{AnalysisMode, AnalysisRequest};

/// Route CLI commands to their respective handlers
pub async fn route(cli: Cli, config: PulseConfig) -> anyhow::Result<()> {
    let request = match cli.command {
        Commands::Config { action } => return commands::config::run(action, &config),
        Commands::Chat { message, history } => StreamRequest::Chat {
            history: commands::stream::load_history(history.as_deref())?,
            message,
        },
        Commands::Analyze {
            fast,
            funds,
            question,
        } => StreamRequest::Analyze(AnalysisRequest {
            mode: if fast {
                AnalysisMode::Fast
            } else {
                AnalysisMode::Standard
            },
            fund_codes: funds,
            question,
        }),
        Commands::Research { topic } => StreamRequest::Research { topic },
    };

    commands::stream::run(&config, &cli.client_key, request).await
}
