//! Top-level facade crate for metricport.
//!
//! Re-exports the naming core and the exporter so users can depend on a single crate.

pub mod core {
    pub use metricport_core::*;
}

pub mod exporter {
    pub use metricport_exporter::*;
}

pub use metricport_exporter::registry::Registry;
pub use metricport_exporter::{report, report_with_config, ReportHandle, Reporter};
