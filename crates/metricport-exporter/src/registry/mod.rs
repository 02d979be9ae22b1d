//! In-process instrument registry.
//!
//! Instruments are registered under their full inline-tagged name (for example
//! `http.requests[route:login]`) and shared as `Arc`s with the code that
//! updates them. The map is a `DashMap`, so registration and removal from any
//! thread never block a report pass for longer than one shard access.

pub mod histogram;
pub mod instruments;
pub mod meter;

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use metricport_core::error::{MetricportError, Result};
use metricport_core::MetricSample;

pub use histogram::{Histogram, DEFAULT_RESERVOIR_SIZE};
pub use instruments::{Counter, Gauge, GaugeFloat};
pub use meter::{Meter, Timer};

/// A registered instrument.
#[derive(Debug, Clone)]
pub enum Metric {
    Counter(Arc<Counter>),
    Gauge(Arc<Gauge>),
    GaugeFloat(Arc<GaugeFloat>),
    Histogram(Arc<Histogram>),
    Meter(Arc<Meter>),
    Timer(Arc<Timer>),
}

impl Metric {
    /// Read the instrument once.
    pub fn sample(&self) -> MetricSample {
        match self {
            Metric::Counter(c) => MetricSample::Counter(c.count()),
            Metric::Gauge(g) => MetricSample::Gauge(g.value()),
            Metric::GaugeFloat(g) => MetricSample::GaugeFloat(g.value()),
            Metric::Histogram(h) => MetricSample::Histogram(h.snapshot()),
            Metric::Meter(m) => MetricSample::Meter(m.snapshot()),
            Metric::Timer(t) => MetricSample::Timer(t.snapshot()),
        }
    }

    fn kind_str(&self) -> &'static str {
        match self {
            Metric::Counter(_) => "counter",
            Metric::Gauge(_) => "gauge",
            Metric::GaugeFloat(_) => "gauge_float",
            Metric::Histogram(_) => "histogram",
            Metric::Meter(_) => "meter",
            Metric::Timer(_) => "timer",
        }
    }
}

#[derive(Debug, Default)]
pub struct Registry {
    map: DashMap<String, Metric>,
}

fn kind_mismatch(name: &str, found: &Metric, wanted: &str) -> MetricportError {
    MetricportError::Registry(format!(
        "{name} is registered as {}, not {wanted}",
        found.kind_str()
    ))
}

macro_rules! get_or_register {
    ($fn_name:ident, $variant:ident, $ty:ty, $kind:literal) => {
        #[doc = concat!("Return the ", $kind, " registered under `name`, creating it if absent.")]
        pub fn $fn_name(&self, name: &str) -> Result<Arc<$ty>> {
            match self.get_or_insert_with(name, || Metric::$variant(Arc::new(<$ty>::new()))) {
                Metric::$variant(m) => Ok(m),
                other => Err(kind_mismatch(name, &other, $kind)),
            }
        }
    };
}

impl Registry {
    pub fn new() -> Self {
        Self { map: DashMap::new() }
    }

    /// Register `metric` under `name`. Fails if the name is taken.
    pub fn register(&self, name: impl Into<String>, metric: Metric) -> Result<()> {
        match self.map.entry(name.into()) {
            Entry::Occupied(e) => Err(MetricportError::Registry(format!(
                "duplicate metric: {}",
                e.key()
            ))),
            Entry::Vacant(e) => {
                e.insert(metric);
                Ok(())
            }
        }
    }

    fn get_or_insert_with(&self, name: &str, make: impl FnOnce() -> Metric) -> Metric {
        if let Some(existing) = self.map.get(name) {
            return existing.value().clone();
        }
        self.map
            .entry(name.to_string())
            .or_insert_with(make)
            .value()
            .clone()
    }

    get_or_register!(get_or_register_counter, Counter, Counter, "counter");
    get_or_register!(get_or_register_gauge, Gauge, Gauge, "gauge");
    get_or_register!(get_or_register_gauge_float, GaugeFloat, GaugeFloat, "gauge_float");
    get_or_register!(get_or_register_histogram, Histogram, Histogram, "histogram");
    get_or_register!(get_or_register_meter, Meter, Meter, "meter");
    get_or_register!(get_or_register_timer, Timer, Timer, "timer");

    pub fn get(&self, name: &str) -> Option<Metric> {
        self.map.get(name).map(|r| r.value().clone())
    }

    pub fn unregister(&self, name: &str) -> Option<Metric> {
        self.map.remove(name).map(|(_, m)| m)
    }

    pub fn unregister_all(&self) {
        self.map.clear();
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Weakly consistent read of every entry, sorted by name.
    ///
    /// Handles are collected first and shard locks released before any
    /// instrument is read, so concurrent registration never waits on
    /// snapshot math. Entries added mid-call may or may not be included.
    pub fn snapshot(&self) -> Vec<(String, MetricSample)> {
        let mut handles: Vec<(String, Metric)> = self
            .map
            .iter()
            .map(|r| (r.key().clone(), r.value().clone()))
            .collect();
        handles.sort_by(|a, b| a.0.cmp(&b.0));

        handles
            .into_iter()
            .map(|(name, metric)| {
                let sample = metric.sample();
                (name, sample)
            })
            .collect()
    }

    /// Visit a snapshot of every entry.
    pub fn each(&self, mut f: impl FnMut(&str, &MetricSample)) {
        for (name, sample) in self.snapshot() {
            f(&name, &sample);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_or_register_returns_same_instrument() {
        let r = Registry::new();
        let a = r.get_or_register_counter("hits").unwrap();
        let b = r.get_or_register_counter("hits").unwrap();
        a.inc(2);
        assert_eq!(b.count(), 2);
        assert_eq!(r.len(), 1);
    }

    #[test]
    fn kind_mismatch_is_registry_error() {
        let r = Registry::new();
        r.get_or_register_gauge("depth").unwrap();
        let err = r.get_or_register_timer("depth").unwrap_err();
        assert_eq!(err.code().as_str(), "REGISTRY");
    }

    #[test]
    fn duplicate_register_fails() {
        let r = Registry::new();
        r.register("x", Metric::Gauge(Arc::new(Gauge::new())))
            .unwrap();
        assert!(r.register("x", Metric::Counter(Arc::new(Counter::new()))).is_err());
    }

    #[test]
    fn each_visits_in_name_order() {
        let r = Registry::new();
        for name in ["zeta[k:v]", "alpha", "mid.point"] {
            r.get_or_register_counter(name).unwrap().inc(1);
        }
        let mut names = Vec::new();
        r.each(|name, _| names.push(name.to_string()));
        assert_eq!(names, vec!["alpha", "mid.point", "zeta[k:v]"]);
    }

    #[test]
    fn snapshot_is_sorted_and_reflects_values() {
        let r = Registry::new();
        r.get_or_register_gauge_float("b").unwrap().update(1.5);
        r.get_or_register_counter("a").unwrap().inc(3);

        let snap = r.snapshot();
        assert_eq!(
            snap,
            vec![
                ("a".to_string(), MetricSample::Counter(3)),
                ("b".to_string(), MetricSample::GaugeFloat(1.5)),
            ]
        );

        let mut visited = Vec::new();
        r.each(|name, sample| visited.push((name.to_string(), sample.clone())));
        assert_eq!(visited, snap);

        r.unregister("a");
        assert_eq!(r.snapshot().len(), 1);
        r.unregister_all();
        assert!(r.is_empty());
    }
}
