//! Per-kind expansion of samples into scalar sub-metrics.
//!
//! The suffix layout is what the collector dashboards key on:
//!
//! | kind              | suffixes                                                        |
//! |-------------------|-----------------------------------------------------------------|
//! | counter           | (root)                                                          |
//! | gauge/gauge_float | (root)                                                          |
//! | histogram         | .count .min .max .mean .stddev .p50 .p75 .p95 .p99 .p999        |
//! | meter             | .count .1MinuteRate .5MinuteRate .15MinuteRate .mean            |
//! | timer             | histogram suffixes + .1MinuteRate .5MinuteRate .15MinuteRate .meanRate |
//!
//! Only `.count` (and a bare counter) is a `Count`; the collector normalizes
//! counts by the flush interval and passes gauges through, so the kind must
//! survive end to end.

use crate::sample::{HistogramSnapshot, MeterSnapshot, MetricSample};

/// How a sub-metric is sent to the collector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EmissionKind {
    Count,
    Gauge,
}

/// One scalar derived from a sample, addressed by `root + suffix`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SubMetric {
    /// Empty for counters and gauges.
    pub suffix: &'static str,
    pub value: f64,
    pub kind: EmissionKind,
}

impl SubMetric {
    fn count(suffix: &'static str, value: i64) -> Self {
        Self { suffix, value: value as f64, kind: EmissionKind::Count }
    }

    fn gauge(suffix: &'static str, value: f64) -> Self {
        Self { suffix, value, kind: EmissionKind::Gauge }
    }
}

/// Expand one sample. Output order is fixed per kind.
pub fn flatten(sample: &MetricSample) -> Vec<SubMetric> {
    match sample {
        MetricSample::Counter(count) => vec![SubMetric::count("", *count)],
        MetricSample::Gauge(value) => vec![SubMetric::gauge("", *value as f64)],
        MetricSample::GaugeFloat(value) => vec![SubMetric::gauge("", *value)],
        MetricSample::Histogram(h) => {
            let mut out = Vec::with_capacity(10);
            push_distribution(&mut out, h);
            out
        }
        MetricSample::Meter(m) => vec![
            SubMetric::count(".count", m.count),
            SubMetric::gauge(".1MinuteRate", m.rate1),
            SubMetric::gauge(".5MinuteRate", m.rate5),
            SubMetric::gauge(".15MinuteRate", m.rate15),
            SubMetric::gauge(".mean", m.rate_mean),
        ],
        MetricSample::Timer(t) => {
            let mut out = Vec::with_capacity(14);
            push_distribution(&mut out, &t.histogram);
            push_timer_rates(&mut out, &t.rates);
            out
        }
    }
}

fn push_distribution(out: &mut Vec<SubMetric>, h: &HistogramSnapshot) {
    let p = &h.percentiles;
    out.extend([
        SubMetric::count(".count", h.count),
        SubMetric::gauge(".min", h.min as f64),
        SubMetric::gauge(".max", h.max as f64),
        SubMetric::gauge(".mean", h.mean),
        SubMetric::gauge(".stddev", h.stddev),
        SubMetric::gauge(".p50", p.p50),
        SubMetric::gauge(".p75", p.p75),
        SubMetric::gauge(".p95", p.p95),
        SubMetric::gauge(".p99", p.p99),
        SubMetric::gauge(".p999", p.p999),
    ]);
}

// `.mean` is taken by the distribution, so a timer's mean rate is `.meanRate`.
fn push_timer_rates(out: &mut Vec<SubMetric>, m: &MeterSnapshot) {
    out.extend([
        SubMetric::gauge(".1MinuteRate", m.rate1),
        SubMetric::gauge(".5MinuteRate", m.rate5),
        SubMetric::gauge(".15MinuteRate", m.rate15),
        SubMetric::gauge(".meanRate", m.rate_mean),
    ]);
}
