//! Domain records produced by the crawlers
//!
//! Field aliases cover the naming variants seen across upstream payloads;
//! vendor-specific mapping beyond that lives with each deployment's feed.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketIndex {
    #[serde(alias = "symbol")]
    pub code: String,
    pub name: String,
    #[serde(alias = "last", alias = "close")]
    pub price: f64,
    #[serde(alias = "changePercent", alias = "pct_chg", default)]
    pub change_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetalPrice {
    pub name: String,
    #[serde(alias = "last")]
    pub price: f64,
    #[serde(alias = "changePercent", default)]
    pub change_percent: f64,
    #[serde(default)]
    pub unit: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsItem {
    pub title: String,
    #[serde(alias = "digest", alias = "content", default)]
    pub summary: Option<String>,
    #[serde(alias = "link", default)]
    pub url: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(alias = "publishTime", alias = "time", default)]
    pub published_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectorSnapshot {
    pub name: String,
    #[serde(alias = "changePercent", alias = "pct_chg")]
    pub change_percent: f64,
    #[serde(alias = "leader", default)]
    pub leading_stock: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundValuation {
    #[serde(alias = "fundcode")]
    pub code: String,
    pub name: String,
    #[serde(alias = "gsz", default)]
    pub estimated_nav: Option<f64>,
    #[serde(alias = "gszzl", default)]
    pub estimated_change_percent: Option<f64>,
    #[serde(alias = "gztime", default)]
    pub valued_at: Option<String>,
}

/// Readable text extracted from a fetched page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebPage {
    pub url: String,
    pub title: Option<String>,
    pub text: String,
    pub truncated: bool,
}
