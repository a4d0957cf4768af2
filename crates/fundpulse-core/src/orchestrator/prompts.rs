//! Prompt templates

use super::context::AnalysisMode;

pub const CHAT_SYSTEM_PROMPT: &str = "You are Fundpulse, an assistant for retail fund investors. \
Answer questions about markets, funds and macro news clearly and concisely. \
Do not give personalised investment advice; point out risks where relevant.";

pub const ANALYSIS_SYSTEM_PROMPT: &str = "You are a market analyst writing for retail fund investors. \
Use only the market data provided. Structure the answer as: market overview, \
notable sectors, news that matters, and what it means for the listed funds. \
State clearly when a data section is missing.";

pub const FAST_ANALYSIS_SYSTEM_PROMPT: &str = "You are a market analyst. \
Give a short briefing (at most five bullet points) based only on the data provided.";

pub const RESEARCH_SYSTEM_PROMPT: &str = "You are a research assistant with access to tools. \
Use search_news to find recent coverage and fetch_webpage to read a source in full. \
Call tools only when they add information you do not have. When you have enough, \
write a structured report citing the sources you used.";

pub fn analysis_system_prompt(mode: AnalysisMode) -> &'static str {
    match mode {
        AnalysisMode::Standard => ANALYSIS_SYSTEM_PROMPT,
        AnalysisMode::Fast => FAST_ANALYSIS_SYSTEM_PROMPT,
    }
}

pub fn analysis_user_prompt(context: &str, question: Option<&str>) -> String {
    let question = question
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .unwrap_or("Analyse the current market and the funds listed.");
    format!("# Market data\n\n{}\n\n# Request\n\n{}", context, question)
}

pub fn research_user_prompt(topic: &str) -> String {
    format!("Research the following topic and write a report:\n\n{}", topic.trim())
}
