//! Crawler set
//!
//! Per-source adapters built from the shared HTTP client and one circuit
//! breaker per source. Every fetch honors the caller's cancellation token.

pub mod records;
mod source;
mod webpage;

#[cfg(test)]
mod tests;

pub use records::{FundValuation, MarketIndex, MetalPrice, NewsItem, SectorSnapshot, WebPage};
pub use source::parse_records;
pub use webpage::{extract_title, html_to_text};

use crate::config::SourceSettings;
use crate::error::{PulseError, PulseResult};
use crate::http::ResilientClient;
use crate::recovery::circuit_breaker::CircuitBreakerRegistry;
use crate::utils::truncate_str;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::instrument;

/// Breaker names, one per upstream
pub mod sources {
    pub const INDICES: &str = "indices";
    pub const METALS: &str = "metals";
    pub const NEWS: &str = "news";
    pub const SECTORS: &str = "sectors";
    pub const FUNDS: &str = "funds";
    pub const WEBPAGE: &str = "webpage";
}

/// Market data as seen by the orchestrator
#[async_trait]
pub trait MarketData: Send + Sync {
    async fn fetch_indices(&self, cancel: &CancellationToken) -> PulseResult<Vec<MarketIndex>>;

    async fn fetch_metals(&self, cancel: &CancellationToken) -> PulseResult<Vec<MetalPrice>>;

    async fn fetch_news(&self, limit: usize, cancel: &CancellationToken)
    -> PulseResult<Vec<NewsItem>>;

    async fn fetch_sectors(
        &self,
        limit: usize,
        cancel: &CancellationToken,
    ) -> PulseResult<Vec<SectorSnapshot>>;

    async fn fetch_fund_valuations(
        &self,
        codes: &[String],
        cancel: &CancellationToken,
    ) -> PulseResult<Vec<FundValuation>>;

    async fn search_news(
        &self,
        query: &str,
        limit: usize,
        cancel: &CancellationToken,
    ) -> PulseResult<Vec<NewsItem>>;

    async fn fetch_webpage(&self, url: &str, cancel: &CancellationToken) -> PulseResult<WebPage>;
}

/// Live crawlers against the configured endpoints
#[derive(Debug, Clone)]
pub struct CrawlerSet {
    http: ResilientClient,
    breakers: Arc<CircuitBreakerRegistry>,
    settings: SourceSettings,
}

impl CrawlerSet {
    pub fn new(
        http: ResilientClient,
        breakers: Arc<CircuitBreakerRegistry>,
        settings: SourceSettings,
    ) -> Self {
        Self {
            http,
            breakers,
            settings,
        }
    }

    pub fn breakers(&self) -> &Arc<CircuitBreakerRegistry> {
        &self.breakers
    }

    /// Run `operation` behind the source's breaker, abandoning it on cancel
    async fn guarded<T, F, Fut>(
        &self,
        source: &str,
        cancel: &CancellationToken,
        operation: F,
    ) -> PulseResult<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = PulseResult<T>>,
    {
        let breaker = self.breakers.get(source);
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(PulseError::Cancelled),
            result = breaker.call(operation) => result.map_err(PulseError::from),
        }
    }

    async fn fetch_list<T: DeserializeOwned>(
        &self,
        source: &str,
        url: &str,
        query: &[(&str, &str)],
        cancel: &CancellationToken,
    ) -> PulseResult<Vec<T>> {
        if url.is_empty() {
            return Err(PulseError::config(format!(
                "Source '{}' has no URL configured",
                source
            )));
        }
        let payload: serde_json::Value = self
            .guarded(source, cancel, || self.http.get_json(url, query))
            .await?;
        parse_records(source, payload)
    }
}

#[async_trait]
impl MarketData for CrawlerSet {
    #[instrument(skip_all)]
    async fn fetch_indices(&self, cancel: &CancellationToken) -> PulseResult<Vec<MarketIndex>> {
        self.fetch_list(sources::INDICES, &self.settings.indices_url, &[], cancel)
            .await
    }

    #[instrument(skip_all)]
    async fn fetch_metals(&self, cancel: &CancellationToken) -> PulseResult<Vec<MetalPrice>> {
        self.fetch_list(sources::METALS, &self.settings.metals_url, &[], cancel)
            .await
    }

    #[instrument(skip(self, cancel))]
    async fn fetch_news(
        &self,
        limit: usize,
        cancel: &CancellationToken,
    ) -> PulseResult<Vec<NewsItem>> {
        let limit_param = limit.to_string();
        let mut items: Vec<NewsItem> = self
            .fetch_list(
                sources::NEWS,
                &self.settings.news_url,
                &[("limit", limit_param.as_str())],
                cancel,
            )
            .await?;
        items.truncate(limit);
        Ok(items)
    }

    #[instrument(skip(self, cancel))]
    async fn fetch_sectors(
        &self,
        limit: usize,
        cancel: &CancellationToken,
    ) -> PulseResult<Vec<SectorSnapshot>> {
        let mut sectors: Vec<SectorSnapshot> = self
            .fetch_list(sources::SECTORS, &self.settings.sectors_url, &[], cancel)
            .await?;
        sectors.sort_by(|a, b| b.change_percent.total_cmp(&a.change_percent));
        sectors.truncate(limit);
        Ok(sectors)
    }

    #[instrument(skip(self, cancel))]
    async fn fetch_fund_valuations(
        &self,
        codes: &[String],
        cancel: &CancellationToken,
    ) -> PulseResult<Vec<FundValuation>> {
        if codes.is_empty() {
            return Ok(Vec::new());
        }
        let joined = codes.join(",");
        let valuations: Vec<FundValuation> = self
            .fetch_list(
                sources::FUNDS,
                &self.settings.funds_url,
                &[("codes", joined.as_str())],
                cancel,
            )
            .await?;
        Ok(valuations
            .into_iter()
            .filter(|v| codes.contains(&v.code))
            .collect())
    }

    #[instrument(skip(self, cancel))]
    async fn search_news(
        &self,
        query: &str,
        limit: usize,
        cancel: &CancellationToken,
    ) -> PulseResult<Vec<NewsItem>> {
        if query.trim().is_empty() {
            return Err(PulseError::invalid_input_field(
                "Search query is empty",
                "query",
            ));
        }
        let limit_param = limit.to_string();
        let mut items: Vec<NewsItem> = self
            .fetch_list(
                sources::NEWS,
                &self.settings.news_search_url,
                &[("q", query), ("limit", limit_param.as_str())],
                cancel,
            )
            .await?;
        items.truncate(limit);
        Ok(items)
    }

    #[instrument(skip(self, cancel))]
    async fn fetch_webpage(&self, url: &str, cancel: &CancellationToken) -> PulseResult<WebPage> {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(PulseError::invalid_input_field(
                format!("Unsupported URL: {}", url),
                "url",
            ));
        }

        let html = self
            .guarded(sources::WEBPAGE, cancel, || self.http.get_text(url, &[]))
            .await?;
        let text = html_to_text(&html);
        let kept = truncate_str(&text, self.settings.webpage_max_chars);

        Ok(WebPage {
            url: url.to_string(),
            title: extract_title(&html),
            truncated: kept.len() < text.len(),
            text: kept.to_string(),
        })
    }
}
