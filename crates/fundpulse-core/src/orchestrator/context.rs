//! Market context assembly for analysis requests
//!
//! Each section is fetched through the cache. A section whose source fails
//! is left out and logged; the analysis continues with what is left.

use crate::cache::CacheService;
use crate::config::{CacheSettings, OrchestratorSettings};
use crate::crawler::{FundValuation, MarketData, MarketIndex, MetalPrice, NewsItem, SectorSnapshot};
use crate::error::{PulseError, PulseResult};
use serde::{Serialize, de::DeserializeOwned};
use std::fmt::Write;
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Depth of an analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnalysisMode {
    #[default]
    Standard,
    /// Fewer news items and sectors, no indices or metals
    Fast,
}

#[derive(Debug, Clone, Default)]
pub struct AnalysisRequest {
    pub mode: AnalysisMode,
    pub fund_codes: Vec<String>,
    pub question: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContextSection {
    pub title: &'static str,
    pub body: String,
}

/// Rendered context plus the sections that could not be loaded
#[derive(Debug, Clone, Default)]
pub struct MarketContext {
    pub sections: Vec<ContextSection>,
    pub omitted: Vec<&'static str>,
}

impl MarketContext {
    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        for section in &self.sections {
            let _ = write!(out, "## {}\n\n{}\n\n", section.title, section.body);
        }
        if self.sections.is_empty() {
            out.push_str("No market data is available right now.\n\n");
        }
        if !self.omitted.is_empty() {
            let _ = write!(out, "_Unavailable: {}_\n\n", self.omitted.join(", "));
        }
        out.truncate(out.trim_end().len());
        out
    }
}

pub(super) struct ContextBuilder<'a> {
    pub market: &'a dyn MarketData,
    pub cache: &'a CacheService,
    pub limits: &'a OrchestratorSettings,
    pub ttl: &'a CacheSettings,
}

impl ContextBuilder<'_> {
    pub async fn gather(
        &self,
        request: &AnalysisRequest,
        cancel: &CancellationToken,
    ) -> PulseResult<MarketContext> {
        let fast = request.mode == AnalysisMode::Fast;
        let (news_limit, sector_limit) = if fast {
            (self.limits.fast_news_limit, self.limits.fast_sector_limit)
        } else {
            (self.limits.standard_news_limit, self.limits.standard_sector_limit)
        };
        let codes = normalize_codes(&request.fund_codes);
        let news_key = format!("news:latest:{}", news_limit);
        let sectors_key = format!("market:sectors:{}", sector_limit);
        let funds_key = format!("fund:valuation:{}", codes.join(","));

        let indices = async {
            if fast {
                return None;
            }
            Some(
                self.load("market:indices", self.ttl.market_ttl(), || {
                    self.market.fetch_indices(cancel)
                })
                .await,
            )
        };
        let metals = async {
            if fast {
                return None;
            }
            Some(
                self.load("market:metals", self.ttl.market_ttl(), || {
                    self.market.fetch_metals(cancel)
                })
                .await,
            )
        };
        let news = self.load(&news_key, self.ttl.news_ttl(), || {
            self.market.fetch_news(news_limit, cancel)
        });
        let sectors = self.load(&sectors_key, self.ttl.market_ttl(), || {
            self.market.fetch_sectors(sector_limit, cancel)
        });
        let funds = async {
            if codes.is_empty() {
                return None;
            }
            Some(
                self.load(&funds_key, self.ttl.fund_ttl(), || {
                    self.market.fetch_fund_valuations(&codes, cancel)
                })
                .await,
            )
        };

        let (indices, metals, news, sectors, funds) =
            tokio::join!(indices, metals, news, sectors, funds);
        if cancel.is_cancelled() {
            return Err(PulseError::Cancelled);
        }

        let mut context = MarketContext::default();
        if let Some(indices) = indices {
            context.add("Market indices", indices, render_indices);
        }
        if let Some(metals) = metals {
            context.add("Precious metals", metals, render_metals);
        }
        context.add("Sector performance", sectors, render_sectors);
        context.add("Latest news", news, render_news);
        if let Some(funds) = funds {
            context.add("Fund valuations", funds, render_funds);
        }

        debug!(
            sections = context.sections.len(),
            omitted = context.omitted.len(),
            "Market context assembled"
        );
        Ok(context)
    }

    async fn load<T, F, Fut>(&self, key: &str, ttl: Duration, loader: F) -> PulseResult<Vec<T>>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = PulseResult<Vec<T>>>,
    {
        self.cache.get_or_load(key, ttl, loader).await
    }
}

impl MarketContext {
    fn add<T>(&mut self, title: &'static str, loaded: PulseResult<Vec<T>>, render: fn(&[T]) -> String) {
        match loaded {
            Ok(items) if !items.is_empty() => self.sections.push(ContextSection {
                title,
                body: render(&items),
            }),
            Ok(_) => {
                debug!(section = title, "Context section empty");
                self.omitted.push(title);
            }
            Err(e) => {
                warn!(section = title, error = %e, "Context section unavailable");
                self.omitted.push(title);
            }
        }
    }
}

fn normalize_codes(codes: &[String]) -> Vec<String> {
    let mut codes: Vec<String> = codes
        .iter()
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .collect();
    codes.sort();
    codes.dedup();
    codes
}

fn render_indices(items: &[MarketIndex]) -> String {
    lines(items, |i| {
        format!("- {} ({}): {:.2} ({:+.2}%)", i.name, i.code, i.price, i.change_percent)
    })
}

fn render_metals(items: &[MetalPrice]) -> String {
    lines(items, |m| {
        let unit = m.unit.as_deref().map(|u| format!(" {}", u)).unwrap_or_default();
        format!("- {}: {:.2}{} ({:+.2}%)", m.name, m.price, unit, m.change_percent)
    })
}

fn render_sectors(items: &[SectorSnapshot]) -> String {
    lines(items, |s| match &s.leading_stock {
        Some(leader) => format!("- {}: {:+.2}% (led by {})", s.name, s.change_percent, leader),
        None => format!("- {}: {:+.2}%", s.name, s.change_percent),
    })
}

fn render_news(items: &[NewsItem]) -> String {
    lines(items, |n| {
        let mut line = format!("- {}", n.title);
        if let Some(source) = &n.source {
            let _ = write!(line, " [{}]", source);
        }
        if let Some(summary) = n.summary.as_deref().filter(|s| !s.is_empty()) {
            let _ = write!(line, ": {}", summary);
        }
        line
    })
}

fn render_funds(items: &[FundValuation]) -> String {
    lines(items, |f| {
        let nav = f
            .estimated_nav
            .map(|v| format!("{:.4}", v))
            .unwrap_or_else(|| "n/a".to_string());
        let change = f
            .estimated_change_percent
            .map(|v| format!("{:+.2}%", v))
            .unwrap_or_else(|| "n/a".to_string());
        format!("- {} ({}): estimated NAV {}, change {}", f.name, f.code, nav, change)
    })
}

fn lines<T>(items: &[T], line: impl Fn(&T) -> String) -> String {
    items.iter().map(line).collect::<Vec<_>>().join("\n")
}
