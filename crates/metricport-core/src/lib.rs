//! metricport core: name/tag grammar, metric samples, and flattening rules.
//!
//! This crate defines the naming contract shared by the exporter and anything
//! that wants to reproduce the exact sub-metric layout the collector expects.
//! It carries no runtime or transport dependencies.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! Malformed metric names degrade to partial results instead of failing, and
//! every other fallible path surfaces as `MetricportError`.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod export;
pub mod sample;

/// Shared result type.
pub use error::{MetricportError, Result};
pub use export::flatten::{flatten, EmissionKind, SubMetric};
pub use export::name::{parse_metric_name, ParsedName};
pub use export::tags::{base_tags, compose_tags, environment_from, DEFAULT_ENVIRONMENT_VAR};
pub use sample::{HistogramSnapshot, MeterSnapshot, MetricSample, Percentiles, TimerSnapshot};
