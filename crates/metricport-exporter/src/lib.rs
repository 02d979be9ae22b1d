//! metricport exporter library entry.
//!
//! This crate wires the instrument registry, the DogStatsD client, and the
//! periodic report loop into one exporter. It is consumed by the binary
//! (`main.rs`), by the facade crate, and by integration tests.

pub mod config;
pub mod registry;
pub mod reporter;
pub mod statsd;

pub use reporter::{report, report_with_config, ReportHandle, Reporter};
