//! Tests for the crawler set against canned upstreams

use super::*;
use crate::config::HttpSettings;
use crate::recovery::circuit_breaker::{CircuitBreakerConfig, CircuitState};
use crate::test_support::{Canned, CannedServer};
use std::time::Duration;

fn crawler(settings: SourceSettings) -> CrawlerSet {
    let breakers = Arc::new(CircuitBreakerRegistry::with_config(CircuitBreakerConfig {
        failure_threshold: 2,
        open_duration: Duration::from_secs(60),
        half_open_success_threshold: 1,
    }));
    let http = ResilientClient::new(&HttpSettings::default()).unwrap();
    CrawlerSet::new(http, breakers, settings)
}

#[tokio::test]
async fn test_fetch_news_decodes_and_limits() {
    let server = CannedServer::start(vec![Canned::json(
        r#"{"data": [
            {"title": "PBoC trims reserve ratio", "source": "wire"},
            {"title": "Gold hits record", "link": "https://example.com/gold"},
            {"headline": "missing title"},
            {"title": "Chip stocks slide"}
        ]}"#,
    )])
    .await;
    let crawler = crawler(SourceSettings {
        news_url: server.url("/news"),
        ..Default::default()
    });

    let news = crawler
        .fetch_news(2, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(news.len(), 2);
    assert_eq!(news[1].url.as_deref(), Some("https://example.com/gold"));
    assert!(server.requests().await[0].contains("limit=2"));
}

#[tokio::test]
async fn test_failing_source_trips_only_its_breaker() {
    let broken = CannedServer::start(vec![Canned::status("502 Bad Gateway")]).await;
    let healthy = CannedServer::start(vec![Canned::json(
        r#"[{"name": "Gold", "price": 2400.5, "change_percent": 0.8}]"#,
    )])
    .await;
    let crawler = crawler(SourceSettings {
        indices_url: broken.url("/indices"),
        metals_url: healthy.url("/metals"),
        ..Default::default()
    });
    let cancel = CancellationToken::new();

    for _ in 0..2 {
        let err = crawler.fetch_indices(&cancel).await.unwrap_err();
        assert!(matches!(err, PulseError::Http { status_code: Some(502), .. }));
    }
    let err = crawler.fetch_indices(&cancel).await.unwrap_err();
    assert!(matches!(err, PulseError::CircuitOpen { ref source_name } if source_name == "indices"));
    assert_eq!(broken.hits(), 2);

    let metals = crawler.fetch_metals(&cancel).await.unwrap();
    assert_eq!(metals[0].name, "Gold");
    assert_eq!(
        crawler.breakers().get(sources::METALS).state(),
        CircuitState::Closed
    );
}

#[tokio::test]
async fn test_unconfigured_source_is_rejected_without_a_breaker() {
    let crawler = crawler(SourceSettings::default());

    let err = crawler
        .fetch_sectors(5, &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, PulseError::Config { .. }));
    assert!(crawler.breakers().names().is_empty());
}

#[tokio::test]
async fn test_cancelled_fetch_makes_no_request() {
    let server = CannedServer::start(vec![Canned::json("[]")]).await;
    let crawler = crawler(SourceSettings {
        news_url: server.url("/news"),
        ..Default::default()
    });
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = crawler.fetch_news(5, &cancel).await.unwrap_err();
    assert!(err.is_cancelled());
    assert_eq!(server.hits(), 0);
}

#[tokio::test]
async fn test_sectors_sorted_by_change() {
    let server = CannedServer::start(vec![Canned::json(
        r#"[{"name": "Banks", "change_percent": -0.4},
            {"name": "Semis", "change_percent": 3.1},
            {"name": "Energy", "change_percent": 1.2}]"#,
    )])
    .await;
    let crawler = crawler(SourceSettings {
        sectors_url: server.url("/sectors"),
        ..Default::default()
    });

    let sectors = crawler
        .fetch_sectors(2, &CancellationToken::new())
        .await
        .unwrap();
    let names: Vec<_> = sectors.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["Semis", "Energy"]);
}

#[tokio::test]
async fn test_fund_valuations_keep_requested_codes() {
    let server = CannedServer::start(vec![Canned::json(
        r#"{"data": [
            {"fundcode": "110022", "name": "Consumer Growth", "gsz": 3.21, "gszzl": 0.55},
            {"fundcode": "000001", "name": "Unrequested", "gsz": 1.0}
        ]}"#,
    )])
    .await;
    let crawler = crawler(SourceSettings {
        funds_url: server.url("/funds"),
        ..Default::default()
    });
    let cancel = CancellationToken::new();

    assert!(crawler.fetch_fund_valuations(&[], &cancel).await.unwrap().is_empty());
    assert_eq!(server.hits(), 0);

    let codes = vec!["110022".to_string()];
    let valuations = crawler.fetch_fund_valuations(&codes, &cancel).await.unwrap();
    assert_eq!(valuations.len(), 1);
    assert_eq!(valuations[0].estimated_change_percent, Some(0.55));
    assert!(server.requests().await[0].contains("codes=110022"));
}

#[tokio::test]
async fn test_search_news_requires_query() {
    let crawler = crawler(SourceSettings::default());
    let err = crawler
        .search_news("  ", 5, &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, PulseError::InvalidInput { .. }));
}

#[tokio::test]
async fn test_fetch_webpage_returns_truncated_text() {
    let server = CannedServer::start(vec![Canned::html(
        "<html><head><title>Outlook</title></head><body><p>Rates stay higher for longer.</p></body></html>",
    )])
    .await;
    let crawler = crawler(SourceSettings {
        webpage_max_chars: 10,
        ..Default::default()
    });

    let page = crawler
        .fetch_webpage(&server.url("/article"), &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(page.title.as_deref(), Some("Outlook"));
    assert_eq!(page.text, "Rates stay");
    assert!(page.truncated);

    let err = crawler
        .fetch_webpage("file:///etc/passwd", &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, PulseError::InvalidInput { .. }));
}
