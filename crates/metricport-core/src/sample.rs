//! Point-in-time metric samples.
//!
//! A `MetricSample` is what the exporter reads out of a registry entry: the
//! instrument kind plus an immutable snapshot of its state. Composite kinds
//! carry pre-computed statistics so flattening is a pure field mapping.

/// Quantiles reported for every distribution, in emission order.
pub const QUANTILES: [f64; 5] = [0.5, 0.75, 0.95, 0.99, 0.999];

/// One read of an instrument.
#[derive(Debug, Clone, PartialEq)]
pub enum MetricSample {
    Counter(i64),
    Gauge(i64),
    GaugeFloat(f64),
    Histogram(HistogramSnapshot),
    Meter(MeterSnapshot),
    Timer(TimerSnapshot),
}

/// Percentile values at [`QUANTILES`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Percentiles {
    pub p50: f64,
    pub p75: f64,
    pub p95: f64,
    pub p99: f64,
    pub p999: f64,
}

impl Percentiles {
    pub fn new([p50, p75, p95, p99, p999]: [f64; 5]) -> Self {
        Self { p50, p75, p95, p99, p999 }
    }

    /// Compute percentiles from an ascending-sorted slice.
    ///
    /// Linear interpolation between the closest ranks at `q * (n + 1)`;
    /// positions below the first rank clamp to the minimum, positions at or
    /// past the last rank clamp to the maximum. Empty input yields zeros.
    pub fn from_sorted(sorted: &[i64]) -> Self {
        let mut out = [0.0; 5];
        let Some((&first, _)) = sorted.split_first() else {
            return Self::default();
        };
        let last = sorted[sorted.len() - 1];
        let size = sorted.len() as f64;

        for (slot, q) in out.iter_mut().zip(QUANTILES) {
            let pos = q * (size + 1.0);
            *slot = if pos < 1.0 {
                first as f64
            } else if pos >= size {
                last as f64
            } else {
                let idx = pos as usize;
                let lower = sorted[idx - 1] as f64;
                let upper = sorted[idx] as f64;
                lower + (pos - pos.floor()) * (upper - lower)
            };
        }
        Self::new(out)
    }
}

/// Distribution statistics of a histogram (or of a timer's durations).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct HistogramSnapshot {
    /// Total observations ever recorded, not just those still sampled.
    pub count: i64,
    pub min: i64,
    pub max: i64,
    pub mean: f64,
    pub stddev: f64,
    pub percentiles: Percentiles,
}

impl HistogramSnapshot {
    /// Build statistics from the sampled values.
    ///
    /// `count` is the lifetime observation count; `values` is the reservoir
    /// content and may be smaller. Standard deviation is the population one.
    pub fn from_values(count: i64, values: &[i64]) -> Self {
        if values.is_empty() {
            return Self { count, ..Self::default() };
        }

        let mut sorted = values.to_vec();
        sorted.sort_unstable();

        let n = sorted.len() as f64;
        let sum: f64 = sorted.iter().map(|&v| v as f64).sum();
        let mean = sum / n;
        let variance = sorted
            .iter()
            .map(|&v| {
                let d = v as f64 - mean;
                d * d
            })
            .sum::<f64>()
            / n;

        Self {
            count,
            min: sorted[0],
            max: sorted[sorted.len() - 1],
            mean,
            stddev: variance.sqrt(),
            percentiles: Percentiles::from_sorted(&sorted),
        }
    }
}

/// Event rates of a meter (events per second).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MeterSnapshot {
    pub count: i64,
    pub rate1: f64,
    pub rate5: f64,
    pub rate15: f64,
    pub rate_mean: f64,
}

/// A timer is a duration distribution plus the rate at which it is updated.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TimerSnapshot {
    pub histogram: HistogramSnapshot,
    pub rates: MeterSnapshot,
}

impl TimerSnapshot {
    pub fn count(&self) -> i64 {
        self.histogram.count
    }
}
