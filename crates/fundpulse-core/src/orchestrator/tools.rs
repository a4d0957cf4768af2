//! Tools offered to the model during deep research
//!
//! Tool failures are reported back to the model as text so a source outage
//! degrades the answer instead of ending the stream. Only cancellation
//! escapes as an error.

use crate::crawler::{MarketData, NewsItem};
use crate::error::{PulseError, PulseResult};
use crate::llm::{ToolCall, ToolDefinition};
use crate::utils::truncate_with_notice;
use serde::Deserialize;
use serde_json::json;
use std::fmt::Write;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

pub const SEARCH_NEWS: &str = "search_news";
pub const FETCH_WEBPAGE: &str = "fetch_webpage";

/// Upper bound on the `limit` argument the model may ask for
const MAX_SEARCH_RESULTS: usize = 20;

pub fn research_tools() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition {
            name: SEARCH_NEWS.to_string(),
            description: "Search recent financial news. Returns titles, sources, summaries and links."
                .to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "query": {"type": "string", "description": "Search keywords"},
                    "limit": {"type": "integer", "description": "Maximum number of results", "minimum": 1, "maximum": MAX_SEARCH_RESULTS}
                },
                "required": ["query"]
            }),
        },
        ToolDefinition {
            name: FETCH_WEBPAGE.to_string(),
            description: "Fetch a web page and return its readable text.".to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "url": {"type": "string", "description": "Absolute http(s) URL"}
                },
                "required": ["url"]
            }),
        },
    ]
}

#[derive(Debug, Deserialize)]
struct SearchArgs {
    query: String,
    #[serde(default)]
    limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct FetchArgs {
    url: String,
}

/// Runs research tool calls against the crawler set
pub struct ToolExecutor {
    market: Arc<dyn MarketData>,
    news_limit: usize,
    max_result_chars: usize,
}

impl ToolExecutor {
    pub fn new(market: Arc<dyn MarketData>, news_limit: usize, max_result_chars: usize) -> Self {
        Self {
            market,
            news_limit,
            max_result_chars,
        }
    }

    /// Execute one call and return the text fed back to the model
    #[instrument(skip_all, fields(tool = %call.name, id = %call.id))]
    pub async fn execute(&self, call: &ToolCall, cancel: &CancellationToken) -> PulseResult<String> {
        let result = match call.name.as_str() {
            SEARCH_NEWS => self.search_news(&call.arguments, cancel).await,
            FETCH_WEBPAGE => self.fetch_webpage(&call.arguments, cancel).await,
            other => Err(PulseError::invalid_input_field(
                format!("unknown tool '{}'", other),
                "name",
            )),
        };

        match result {
            Ok(text) => {
                debug!(chars = text.len(), "Tool call succeeded");
                Ok(truncate_with_notice(&text, self.max_result_chars))
            }
            Err(e) if e.is_cancelled() => Err(e),
            Err(e) => {
                warn!(error = %e, "Tool call failed");
                Ok(format!("Tool {} failed: {}", call.name, e))
            }
        }
    }

    async fn search_news(&self, arguments: &str, cancel: &CancellationToken) -> PulseResult<String> {
        let args: SearchArgs = parse_arguments(arguments)?;
        let limit = args
            .limit
            .unwrap_or(self.news_limit)
            .clamp(1, MAX_SEARCH_RESULTS);
        let items = self.market.search_news(&args.query, limit, cancel).await?;
        Ok(render_search_results(&args.query, &items))
    }

    async fn fetch_webpage(&self, arguments: &str, cancel: &CancellationToken) -> PulseResult<String> {
        let args: FetchArgs = parse_arguments(arguments)?;
        let page = self.market.fetch_webpage(&args.url, cancel).await?;

        let mut out = String::new();
        if let Some(title) = &page.title {
            let _ = writeln!(out, "Title: {}", title);
        }
        let _ = writeln!(out, "URL: {}\n", page.url);
        out.push_str(&page.text);
        if page.truncated {
            out.push_str("\n[page text truncated]");
        }
        Ok(out)
    }
}

fn parse_arguments<T: serde::de::DeserializeOwned>(arguments: &str) -> PulseResult<T> {
    let raw = if arguments.trim().is_empty() { "{}" } else { arguments };
    serde_json::from_str(raw).map_err(|e| {
        PulseError::invalid_input_field(format!("invalid tool arguments: {}", e), "arguments")
    })
}

fn render_search_results(query: &str, items: &[NewsItem]) -> String {
    if items.is_empty() {
        return format!("No news found for \"{}\".", query);
    }
    let mut out = format!("{} results for \"{}\":\n", items.len(), query);
    for (n, item) in items.iter().enumerate() {
        let _ = write!(out, "\n{}. {}", n + 1, item.title);
        if let Some(source) = &item.source {
            let _ = write!(out, " ({})", source);
        }
        if let Some(published) = &item.published_at {
            let _ = write!(out, " {}", published);
        }
        if let Some(summary) = item.summary.as_deref().filter(|s| !s.is_empty()) {
            let _ = write!(out, "\n   {}", summary);
        }
        if let Some(url) = &item.url {
            let _ = write!(out, "\n   {}", url);
        }
    }
    out
}
