use std::time::Duration;

use serde::Deserialize;
use metricport_core::error::{MetricportError, Result};
use metricport_core::DEFAULT_ENVIRONMENT_VAR;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExporterConfig {
    pub version: u32,

    #[serde(default)]
    pub statsd: StatsdSection,
}

impl Default for ExporterConfig {
    fn default() -> Self {
        Self {
            version: 1,
            statsd: StatsdSection::default(),
        }
    }
}

impl ExporterConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(MetricportError::UnsupportedVersion);
        }

        self.statsd.validate()?;

        Ok(())
    }
}

/// Collector connection and tagging settings.
///
/// `address` is deliberately not checked here: an unusable address is a
/// client construction failure, which is logged and does not stop the loop.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StatsdSection {
    #[serde(default = "default_address")]
    pub address: String,

    #[serde(default)]
    pub app_name: String,

    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    #[serde(default = "default_environment_var")]
    pub environment_var: String,
}

impl Default for StatsdSection {
    fn default() -> Self {
        Self {
            address: default_address(),
            app_name: String::new(),
            interval_ms: default_interval_ms(),
            environment_var: default_environment_var(),
        }
    }
}

impl StatsdSection {
    /// Section with the given collector address and app name, defaults elsewhere.
    pub fn new(address: impl Into<String>, app_name: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            app_name: app_name.into(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(100..=3_600_000).contains(&self.interval_ms) {
            return Err(MetricportError::Config(
                "statsd.interval_ms must be between 100 and 3600000".into(),
            ));
        }
        if self.environment_var.trim().is_empty() {
            return Err(MetricportError::Config(
                "statsd.environment_var must not be empty".into(),
            ));
        }
        Ok(())
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

fn default_address() -> String {
    "127.0.0.1:8125".into()
}
fn default_interval_ms() -> u64 {
    10_000
}
fn default_environment_var() -> String {
    DEFAULT_ENVIRONMENT_VAR.into()
}
