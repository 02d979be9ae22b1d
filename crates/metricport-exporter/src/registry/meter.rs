//! Rate instruments: meters (EWMA rates) and timers.
//!
//! Moving averages advance in fixed 5 second ticks. There is no background
//! ticker: every `mark`/`snapshot` first catches up on the ticks that elapsed
//! since the last one, so idle meters decay exactly as if they had been ticked.

use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use metricport_core::{MeterSnapshot, TimerSnapshot};

use super::histogram::Histogram;

const TICK: Duration = Duration::from_secs(5);

/// Exponentially weighted moving average over a window in minutes.
#[derive(Debug, Clone, Copy)]
struct Ewma {
    alpha: f64,
    /// Events per second.
    rate: f64,
    uncounted: i64,
    init: bool,
}

impl Ewma {
    fn with_window(minutes: f64) -> Self {
        Self {
            alpha: 1.0 - (-TICK.as_secs_f64() / 60.0 / minutes).exp(),
            rate: 0.0,
            uncounted: 0,
            init: false,
        }
    }

    fn tick(&mut self) {
        let instant = self.uncounted as f64 / TICK.as_secs_f64();
        self.uncounted = 0;
        if self.init {
            self.rate += self.alpha * (instant - self.rate);
        } else {
            self.rate = instant;
            self.init = true;
        }
    }

    /// Equivalent to `n` ticks with nothing uncounted.
    fn decay(&mut self, n: u64) {
        if n == 0 {
            return;
        }
        if !self.init {
            self.rate = 0.0;
            self.init = true;
            return;
        }
        self.rate *= (1.0 - self.alpha).powf(n as f64);
    }
}

#[derive(Debug)]
struct MeterState {
    count: i64,
    last_tick: Instant,
    rates: [Ewma; 3],
}

impl MeterState {
    fn catch_up(&mut self, now: Instant) {
        let elapsed = now.saturating_duration_since(self.last_tick);
        let ticks = (elapsed.as_nanos() / TICK.as_nanos()) as u64;
        if ticks == 0 {
            return;
        }
        for ewma in &mut self.rates {
            ewma.tick();
            ewma.decay(ticks - 1);
        }
        let step = u32::try_from(ticks).unwrap_or(u32::MAX);
        self.last_tick += TICK * step;
    }
}

/// Counts events and tracks their 1/5/15-minute and lifetime mean rates.
#[derive(Debug)]
pub struct Meter {
    start: Instant,
    state: Mutex<MeterState>,
}

impl Default for Meter {
    fn default() -> Self {
        Self::new()
    }
}

impl Meter {
    pub fn new() -> Self {
        Self::started_at(Instant::now())
    }

    fn started_at(start: Instant) -> Self {
        Self {
            start,
            state: Mutex::new(MeterState {
                count: 0,
                last_tick: start,
                rates: [Ewma::with_window(1.0), Ewma::with_window(5.0), Ewma::with_window(15.0)],
            }),
        }
    }

    pub fn mark(&self, n: i64) {
        self.mark_at(n, Instant::now());
    }

    fn mark_at(&self, n: i64, now: Instant) {
        let mut st = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        st.catch_up(now);
        st.count = st.count.saturating_add(n);
        for ewma in &mut st.rates {
            ewma.uncounted = ewma.uncounted.saturating_add(n);
        }
    }

    pub fn count(&self) -> i64 {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).count
    }

    pub fn snapshot(&self) -> MeterSnapshot {
        self.snapshot_at(Instant::now())
    }

    fn snapshot_at(&self, now: Instant) -> MeterSnapshot {
        let mut st = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        st.catch_up(now);

        let elapsed = now.saturating_duration_since(self.start).as_secs_f64();
        let rate_mean = if elapsed > 0.0 { st.count as f64 / elapsed } else { 0.0 };

        MeterSnapshot {
            count: st.count,
            rate1: st.rates[0].rate,
            rate5: st.rates[1].rate,
            rate15: st.rates[2].rate,
            rate_mean,
        }
    }
}

/// Duration distribution (nanoseconds) plus the rate of updates.
#[derive(Debug, Default)]
pub struct Timer {
    histogram: Histogram,
    meter: Meter,
}

impl Timer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&self, d: Duration) {
        let nanos = i64::try_from(d.as_nanos()).unwrap_or(i64::MAX);
        self.histogram.update(nanos);
        self.meter.mark(1);
    }

    pub fn update_since(&self, start: Instant) {
        self.update(start.elapsed());
    }

    /// Run `f` and record how long it took.
    pub fn time<R>(&self, f: impl FnOnce() -> R) -> R {
        let start = Instant::now();
        let out = f();
        self.update_since(start);
        out
    }

    pub fn count(&self) -> i64 {
        self.histogram.count()
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        TimerSnapshot {
            histogram: self.histogram.snapshot(),
            rates: self.meter.snapshot(),
        }
    }
}
