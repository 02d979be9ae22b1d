//! Lifecycle of the spawned report loop.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::net::UdpSocket;
use std::sync::{mpsc, Arc, Mutex};
use std::time::Duration;

use metricport_core::error::Result;
use metricport_exporter::config::StatsdSection;
use metricport_exporter::registry::Registry;
use metricport_exporter::reporter::{
    report, report_with_config, LoopState, Reporter, ReporterSettings,
};
use metricport_exporter::statsd::MetricSink;

mod support;
use support::RecordingSink;

async fn wait_for_passes(passes: impl Fn() -> u64, at_least: u64) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while passes() < at_least {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("loop did not tick in time");
}

#[tokio::test]
async fn ticks_until_stopped() {
    let registry = Arc::new(Registry::new());
    registry.get_or_register_counter("loops").unwrap().inc(1);

    let sink = Arc::new(RecordingSink::default());
    let settings = ReporterSettings {
        app_name: "svc".into(),
        interval: Duration::from_millis(20),
        environment_var: "METRICPORT_TEST_ENV_NEVER_SET".into(),
    };
    let handle = Reporter::new(registry, sink.clone(), settings).spawn();

    wait_for_passes(|| handle.passes(), 3).await;
    handle.stop().await;

    let emitted = sink.take();
    assert!(emitted.len() >= 3);
    assert!(emitted.iter().all(|e| e.name == "loops"));
}

#[tokio::test]
async fn failing_passes_keep_ticking() {
    let registry = Arc::new(Registry::new());
    registry.get_or_register_counter("boom").unwrap().inc(1);

    let sink = Arc::new(RecordingSink::failing_on(&["boom"]));
    let settings = ReporterSettings {
        app_name: String::new(),
        interval: Duration::from_millis(10),
        environment_var: "METRICPORT_TEST_ENV_NEVER_SET".into(),
    };
    let handle = Reporter::new(registry, sink.clone(), settings).spawn();

    wait_for_passes(|| handle.passes(), 3).await;
    assert!(!handle.is_finished());
    handle.stop().await;
    assert!(sink.take().is_empty());
}

#[tokio::test]
async fn bad_address_still_enters_the_loop() {
    let registry = Arc::new(Registry::new());
    registry.get_or_register_gauge("g").unwrap().update(1);

    let mut cfg = StatsdSection::new("not an address", "svc");
    cfg.interval_ms = 100;
    let handle = report_with_config(registry, &cfg);

    wait_for_passes(|| handle.passes(), 2).await;
    handle.stop().await;
}

#[tokio::test]
async fn cancellation_token_stops_the_loop() {
    let registry = Arc::new(Registry::new());
    let settings = ReporterSettings {
        app_name: String::new(),
        interval: Duration::from_secs(3600),
        environment_var: "METRICPORT_TEST_ENV_NEVER_SET".into(),
    };
    let handle = Reporter::new(registry, Arc::new(RecordingSink::default()), settings).spawn();

    wait_for_passes(|| handle.passes(), 1).await;
    handle.cancellation_token().cancel();

    tokio::time::timeout(Duration::from_secs(5), async {
        while !handle.is_finished() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("loop did not stop");
}

/// Sink whose first call signals `entered` and then waits for `release`.
struct GatedSink {
    entered: Mutex<Option<mpsc::Sender<()>>>,
    release: Mutex<mpsc::Receiver<()>>,
}

impl MetricSink for GatedSink {
    fn count(&self, _: &str, _: f64, _: &[String], _: f64) -> Result<()> {
        if let Some(tx) = self.entered.lock().unwrap().take() {
            tx.send(()).unwrap();
            self.release.lock().unwrap().recv().unwrap();
        }
        Ok(())
    }

    fn gauge(&self, name: &str, value: f64, tags: &[String], rate: f64) -> Result<()> {
        self.count(name, value, tags, rate)
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn state_is_reporting_during_a_pass_and_idle_between() {
    let registry = Arc::new(Registry::new());
    registry.get_or_register_counter("gated").unwrap().inc(1);

    let (entered_tx, entered_rx) = mpsc::channel();
    let (release_tx, release_rx) = mpsc::channel();
    let sink = Arc::new(GatedSink {
        entered: Mutex::new(Some(entered_tx)),
        release: Mutex::new(release_rx),
    });
    let settings = ReporterSettings {
        app_name: String::new(),
        interval: Duration::from_secs(3600),
        environment_var: "METRICPORT_TEST_ENV_NEVER_SET".into(),
    };
    let handle = Reporter::new(registry, sink, settings).spawn();

    tokio::task::spawn_blocking(move || entered_rx.recv_timeout(Duration::from_secs(5)))
        .await
        .unwrap()
        .expect("pass never reached the sink");
    assert_eq!(handle.state(), LoopState::Reporting);
    assert_eq!(handle.passes(), 0);

    release_tx.send(()).unwrap();
    wait_for_passes(|| handle.passes(), 1).await;
    assert_eq!(handle.state(), LoopState::Idle);

    handle.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn report_sends_datagrams_to_the_agent() {
    let listener = UdpSocket::bind("127.0.0.1:0").unwrap();
    listener.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
    let addr = listener.local_addr().unwrap().to_string();

    let registry = Arc::new(Registry::new());
    registry.get_or_register_counter("req[env:x]").unwrap().inc(5);

    let handle = report(registry, Duration::from_secs(3600), &addr);

    let received = tokio::task::spawn_blocking(move || {
        let mut buf = [0u8; 512];
        let n = listener.recv(&mut buf).unwrap();
        String::from_utf8(buf[..n].to_vec()).unwrap()
    })
    .await
    .unwrap();

    // An ambient ENVIRONMENT value may append an `environment:` base tag.
    assert!(received.starts_with("req:5|c|#env:x"), "received={received}");

    wait_for_passes(|| handle.passes(), 1).await;
    assert_eq!(handle.state(), LoopState::Idle);
    handle.stop().await;
}
