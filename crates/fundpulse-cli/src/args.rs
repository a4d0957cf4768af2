//! CLI argument definitions using clap

use clap::{Parser, Subcommand};
use fundpulse_core::config::LoggingConfig;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "fundpulse")]
#[command(about = "Fundpulse - market data with streaming AI commentary")]
#[command(version)]
pub struct Cli {
    /// Path to a TOML configuration file
    #[arg(long, short, env = "FUNDPULSE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log level or filter directive (RUST_LOG wins when set)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format: pretty, compact or json
    #[arg(long)]
    pub log_format: Option<String>,

    /// Key the rate limiter charges for this invocation
    #[arg(long, default_value = "cli")]
    pub client_key: String,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Logging settings given on the command line; empty fields keep the
    /// configured value
    pub fn logging_overrides(&self) -> LoggingConfig {
        LoggingConfig {
            level: self.log_level.clone().unwrap_or_default(),
            format: self.log_format.clone().unwrap_or_default(),
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Ask a question in a conversation
    Chat {
        /// The new message
        message: String,

        /// JSON file with prior turns: [{"role": "user", "content": "..."}, ...]
        #[arg(long)]
        history: Option<PathBuf>,
    },

    /// Analyse the market and the given funds
    Analyze {
        /// Reduced context for a quicker answer
        #[arg(long)]
        fast: bool,

        /// Fund code to include (repeatable)
        #[arg(long = "fund", value_name = "CODE")]
        funds: Vec<String>,

        /// Optional question to focus the analysis
        question: Option<String>,
    },

    /// Research a topic with news search and web page tools
    Research {
        /// Topic to research
        topic: String,
    },

    /// Inspect configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Clone, Copy)]
pub enum ConfigAction {
    /// Print the effective configuration with secrets redacted
    Show,
    /// Validate the configuration and report the result
    Validate,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_analyze() {
        let cli = Cli::try_parse_from([
            "fundpulse", "analyze", "--fast", "--fund", "161725", "--fund", "110022", "gold?",
        ])
        .unwrap();
        match cli.command {
            Commands::Analyze {
                fast,
                funds,
                question,
            } => {
                assert!(fast);
                assert_eq!(funds, vec!["161725", "110022"]);
                assert_eq!(question.as_deref(), Some("gold?"));
            }
            _ => panic!("expected analyze"),
        }
        assert_eq!(cli.client_key, "cli");
    }

    #[test]
    fn test_logging_overrides_keep_config_when_absent() {
        let cli = Cli::try_parse_from(["fundpulse", "--log-format", "json", "research", "oil"])
            .unwrap();
        let mut logging = LoggingConfig::default();
        logging.merge(cli.logging_overrides());
        assert_eq!(logging.level, "info");
        assert!(logging.is_json());
    }

    #[test]
    fn test_cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
