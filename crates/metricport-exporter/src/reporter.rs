//! Periodic export loop.
//!
//! One pass: snapshot the registry, and for every entry decode its name, add
//! the base tags, flatten the sample and hand each sub-metric to the sink.
//! Errors never end the loop; they are logged and the next tick runs as usual.
//!
//! Lifecycle:
//! - the first pass runs immediately, then one pass per interval
//! - `ReportHandle::stop` cancels the sleep between passes and joins the task
//! - a pass in progress is never interrupted

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use metricport_core::error::{ErrorCode, MetricportError};
use metricport_core::export::name::warm_up;
use metricport_core::export::tags::{environment_from, DEFAULT_ENVIRONMENT_VAR};
use metricport_core::{base_tags, compose_tags, flatten, parse_metric_name};

use crate::config::StatsdSection;
use crate::registry::Registry;
use crate::statsd::{DisconnectedSink, MetricSink, StatsdClient};

/// Every sub-metric is sent unsampled.
pub const SAMPLE_RATE: f64 = 1.0;

/// Per-pass settings derived from config.
#[derive(Debug, Clone)]
pub struct ReporterSettings {
    pub app_name: String,
    pub interval: Duration,
    /// Read on every pass, never cached.
    pub environment_var: String,
}

impl From<&StatsdSection> for ReporterSettings {
    fn from(s: &StatsdSection) -> Self {
        Self {
            app_name: s.app_name.clone(),
            interval: s.interval(),
            environment_var: s.environment_var.clone(),
        }
    }
}

/// Result of one pass over the registry.
#[derive(Debug, Default)]
pub struct PassOutcome {
    /// Registry entries visited.
    pub metrics: usize,
    /// Sub-metrics accepted by the sink.
    pub emitted: usize,
    /// Sub-metrics the sink rejected.
    pub failed: usize,
    /// First rejection, kept for logging.
    pub first_error: Option<MetricportError>,
}

impl PassOutcome {
    pub fn is_ok(&self) -> bool {
        self.first_error.is_none()
    }

    /// Every failure came from a missing client. Construction failure is
    /// already logged once, so such passes are not worth a warning each.
    pub fn only_missing_client(&self) -> bool {
        self.emitted == 0
            && matches!(self.first_error.as_ref().map(|e| e.code()), Some(ErrorCode::NoClient))
    }
}

/// Loop phase as seen from outside.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    Reporting,
}

pub struct Reporter {
    registry: Arc<Registry>,
    sink: Arc<dyn MetricSink>,
    settings: ReporterSettings,
}

impl Reporter {
    pub fn new(
        registry: Arc<Registry>,
        sink: Arc<dyn MetricSink>,
        settings: ReporterSettings,
    ) -> Self {
        Self { registry, sink, settings }
    }

    /// Build a reporter sending to `address`, falling back to a disconnected
    /// sink when the client cannot be constructed. The failure is logged
    /// here, once.
    pub fn with_address(
        registry: Arc<Registry>,
        address: &str,
        settings: ReporterSettings,
    ) -> Self {
        let sink: Arc<dyn MetricSink> = match StatsdClient::connect(address) {
            Ok(client) => Arc::new(client),
            Err(e) => {
                tracing::error!(
                    %address,
                    error = %e,
                    "statsd client construction failed; reporting continues without a client"
                );
                Arc::new(DisconnectedSink)
            }
        };
        Self::new(registry, sink, settings)
    }

    pub fn from_config(registry: Arc<Registry>, cfg: &StatsdSection) -> Self {
        Self::with_address(registry, &cfg.address, ReporterSettings::from(cfg))
    }

    pub fn settings(&self) -> &ReporterSettings {
        &self.settings
    }

    /// Run one full pass. Sink failures are counted, not propagated.
    pub fn report_once(&self) -> PassOutcome {
        let environment = environment_from(&self.settings.environment_var);
        let base = base_tags(&self.settings.app_name, environment.as_deref());

        let mut outcome = PassOutcome::default();
        for (raw_name, sample) in self.registry.snapshot() {
            outcome.metrics += 1;

            let parsed = parse_metric_name(&raw_name);
            let tags = compose_tags(&parsed.tags, &base);

            for sub in flatten(&sample) {
                let full_name = format!("{}{}", parsed.name, sub.suffix);
                match self.sink.emit(sub.kind, &full_name, sub.value, &tags, SAMPLE_RATE) {
                    Ok(()) => outcome.emitted += 1,
                    Err(e) => {
                        outcome.failed += 1;
                        if outcome.first_error.is_none() {
                            outcome.first_error = Some(e);
                        }
                    }
                }
            }
        }
        outcome
    }

    /// Start the loop on the current tokio runtime.
    pub fn spawn(self) -> ReportHandle {
        warm_up();

        let token = CancellationToken::new();
        let shared = Arc::new(LoopShared::default());
        let task = tokio::spawn(run_loop(self, token.clone(), Arc::clone(&shared)));

        ReportHandle { token, shared, task }
    }
}

#[derive(Default)]
struct LoopShared {
    reporting: AtomicBool,
    passes: AtomicU64,
}

async fn run_loop(reporter: Reporter, token: CancellationToken, shared: Arc<LoopShared>) {
    let interval = reporter.settings().interval;
    tracing::info!(interval_ms = interval.as_millis() as u64, "reporter started");

    loop {
        shared.reporting.store(true, Ordering::Release);
        let outcome = reporter.report_once();
        shared.reporting.store(false, Ordering::Release);
        let pass = shared.passes.fetch_add(1, Ordering::AcqRel) + 1;

        match &outcome.first_error {
            Some(e) if outcome.only_missing_client() => tracing::debug!(
                pass,
                error = %e,
                failed = outcome.failed,
                "report pass skipped: no client"
            ),
            None => tracing::debug!(
                pass,
                metrics = outcome.metrics,
                emitted = outcome.emitted,
                "report pass complete"
            ),
            Some(e) => tracing::warn!(
                pass,
                error = %e,
                code = e.code().as_str(),
                failed = outcome.failed,
                emitted = outcome.emitted,
                "report pass had errors"
            ),
        }

        tokio::select! {
            _ = token.cancelled() => break,
            _ = tokio::time::sleep(interval) => {}
        }
    }

    tracing::info!("reporter stopped");
}

/// Control handle for a spawned loop.
pub struct ReportHandle {
    token: CancellationToken,
    shared: Arc<LoopShared>,
    task: JoinHandle<()>,
}

impl ReportHandle {
    pub fn state(&self) -> LoopState {
        if self.shared.reporting.load(Ordering::Acquire) {
            LoopState::Reporting
        } else {
            LoopState::Idle
        }
    }

    /// Completed passes so far.
    pub fn passes(&self) -> u64 {
        self.shared.passes.load(Ordering::Acquire)
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Token that stops the loop when cancelled; lets callers tie the loop to
    /// a wider shutdown signal.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Stop after the current pass (if any) and wait for the task to exit.
    pub async fn stop(self) {
        self.token.cancel();
        if let Err(e) = self.task.await {
            tracing::warn!(error = %e, "reporter task ended abnormally");
        }
    }
}

/// Report `registry` to the agent at `address` every `interval`.
pub fn report(registry: Arc<Registry>, interval: Duration, address: &str) -> ReportHandle {
    let settings = ReporterSettings {
        app_name: String::new(),
        interval,
        environment_var: DEFAULT_ENVIRONMENT_VAR.to_string(),
    };
    Reporter::with_address(registry, address, settings).spawn()
}

/// Report `registry` using the full statsd section.
pub fn report_with_config(registry: Arc<Registry>, cfg: &StatsdSection) -> ReportHandle {
    Reporter::from_config(registry, cfg).spawn()
}
