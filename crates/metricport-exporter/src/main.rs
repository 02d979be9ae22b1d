//! metricport exporter binary.
//!
//! - Loads `metricport.yaml` (or the path given as the first argument)
//! - Registers process self-metrics
//! - Reports them to the configured DogStatsD agent until Ctrl-C

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing_subscriber::{fmt, EnvFilter};

use metricport_exporter::config::{self, ExporterConfig};
use metricport_exporter::registry::Registry;
use metricport_exporter::reporter::Reporter;

const DEFAULT_CONFIG_PATH: &str = "metricport.yaml";

#[tokio::main]
async fn main() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let path = std::env::args().nth(1).unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let cfg = if Path::new(&path).exists() {
        match config::load_from_file(&path) {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::error!(%path, error = %e, code = e.code().as_str(), "config load failed");
                std::process::exit(2);
            }
        }
    } else {
        tracing::warn!(%path, "config file not found; using defaults");
        ExporterConfig::default()
    };

    let registry = Arc::new(Registry::new());
    let self_metrics = match spawn_self_metrics(&registry) {
        Ok(task) => Some(task),
        Err(e) => {
            tracing::warn!(error = %e, "self metrics disabled");
            None
        }
    };

    tracing::info!(
        address = %cfg.statsd.address,
        app = %cfg.statsd.app_name,
        "metricport-exporter starting"
    );
    let handle = Reporter::from_config(Arc::clone(&registry), &cfg.statsd).spawn();

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "ctrl_c listener failed; shutting down");
    }

    if let Some(task) = self_metrics {
        task.abort();
    }
    handle.stop().await;
}

fn spawn_self_metrics(
    registry: &Registry,
) -> metricport_core::Result<tokio::task::JoinHandle<()>> {
    let uptime = registry.get_or_register_gauge("metricport.uptime[unit:seconds]")?;
    let heartbeat = registry.get_or_register_meter("metricport.heartbeat")?;
    let started = Instant::now();

    Ok(tokio::spawn(async move {
        let mut tick = tokio::time::interval(Duration::from_secs(1));
        tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            tick.tick().await;
            uptime.update(i64::try_from(started.elapsed().as_secs()).unwrap_or(i64::MAX));
            heartbeat.mark(1);
        }
    }))
}
