//! Outbound HTTP for crawled sources

mod client;

pub use client::ResilientClient;
