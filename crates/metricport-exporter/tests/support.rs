//! Recording sink shared by report tests.

#![allow(clippy::unwrap_used)]
#![allow(dead_code)]

use std::sync::Mutex;

use metricport_core::error::{MetricportError, Result};
use metricport_core::EmissionKind;
use metricport_exporter::statsd::MetricSink;

#[derive(Debug, Clone, PartialEq)]
pub struct Emission {
    pub kind: EmissionKind,
    pub name: String,
    pub value: f64,
    pub tags: Vec<String>,
    pub rate: f64,
}

#[derive(Default)]
pub struct RecordingSink {
    pub emissions: Mutex<Vec<Emission>>,
    /// Names whose emission fails with a send-style error.
    pub fail_names: Vec<String>,
}

impl RecordingSink {
    pub fn failing_on(names: &[&str]) -> Self {
        Self {
            emissions: Mutex::new(Vec::new()),
            fail_names: names.iter().map(|n| n.to_string()).collect(),
        }
    }

    pub fn take(&self) -> Vec<Emission> {
        std::mem::take(&mut *self.emissions.lock().unwrap())
    }

    fn record(
        &self,
        kind: EmissionKind,
        name: &str,
        value: f64,
        tags: &[String],
        rate: f64,
    ) -> Result<()> {
        if self.fail_names.iter().any(|n| n == name) {
            return Err(MetricportError::Internal(format!("refused {name}")));
        }
        self.emissions.lock().unwrap().push(Emission {
            kind,
            name: name.to_string(),
            value,
            tags: tags.to_vec(),
            rate,
        });
        Ok(())
    }
}

impl MetricSink for RecordingSink {
    fn count(&self, name: &str, value: f64, tags: &[String], rate: f64) -> Result<()> {
        self.record(EmissionKind::Count, name, value, tags, rate)
    }

    fn gauge(&self, name: &str, value: f64, tags: &[String], rate: f64) -> Result<()> {
        self.record(EmissionKind::Gauge, name, value, tags, rate)
    }
}
