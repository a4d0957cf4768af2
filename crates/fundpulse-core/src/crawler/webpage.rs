//! HTML to readable text

use once_cell::sync::Lazy;
use regex::Regex;

static TITLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<title[^>]*>(.*?)</title\s*>").expect("valid title regex"));

static NON_CONTENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?is)<head\b.*?</head\s*>|<script\b.*?</script\s*>|<style\b.*?</style\s*>|<nav\b.*?</nav\s*>|<footer\b.*?</footer\s*>|<header\b.*?</header\s*>|<noscript\b.*?</noscript\s*>|<!--.*?-->",
    )
    .expect("valid non-content regex")
});

static BLOCK_BREAK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)<\s*(br|/p|/div|/li|/tr|/h[1-6]|/section|/article)\b[^>]*>")
        .expect("valid block regex")
});

static ANY_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<[^>]*>").expect("valid tag regex"));

static SPACES: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t\u{a0}]+").expect("valid space regex"));

/// Page title, if the document has a non-empty one
pub fn extract_title(html: &str) -> Option<String> {
    TITLE
        .captures(html)
        .and_then(|caps| caps.get(1))
        .map(|m| decode_entities(m.as_str()).trim().to_string())
        .filter(|title| !title.is_empty())
}

/// Strip markup, scripts and page chrome, keeping one line per text block
pub fn html_to_text(html: &str) -> String {
    let html = NON_CONTENT.replace_all(html, " ");
    let html = BLOCK_BREAK.replace_all(&html, "\n");
    let text = ANY_TAG.replace_all(&html, " ");
    let text = decode_entities(&text);

    let mut cleaned = String::with_capacity(text.len());
    for line in text.lines() {
        let line = SPACES.replace_all(line.trim(), " ");
        if !line.is_empty() {
            cleaned.push_str(&line);
            cleaned.push('\n');
        }
    }
    cleaned.trim_end().to_string()
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}
