//! Error types for Fundpulse
//!
//! A single crate-wide error enum is shared by every component so that the
//! orchestrator can turn any failure into one terminal stream event without
//! caring which layer produced it.

mod classifiers;
mod constructors;
mod conversions;
mod types;

pub use types::{PulseError, PulseResult};
