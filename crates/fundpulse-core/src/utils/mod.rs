//! Shared helpers

pub mod string;

pub use string::{truncate_str, truncate_with_notice};
