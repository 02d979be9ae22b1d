//! Reservoir-sampled histogram.
//!
//! Values are kept in a fixed-size uniform reservoir (Vitter's Algorithm R), so
//! memory stays bounded while every observation has an equal chance of being
//! represented. The lifetime count is tracked separately from the reservoir.

use std::sync::{Mutex, PoisonError};

use rand::Rng;

use metricport_core::HistogramSnapshot;

/// Reservoir size used by [`Histogram::new`].
pub const DEFAULT_RESERVOIR_SIZE: usize = 1028;

#[derive(Debug, Default)]
struct Reservoir {
    count: i64,
    values: Vec<i64>,
}

#[derive(Debug)]
pub struct Histogram {
    capacity: usize,
    inner: Mutex<Reservoir>,
}

impl Default for Histogram {
    fn default() -> Self {
        Self::new()
    }
}

impl Histogram {
    pub fn new() -> Self {
        Self::with_reservoir(DEFAULT_RESERVOIR_SIZE)
    }

    /// Histogram keeping at most `capacity` samples (minimum 1).
    pub fn with_reservoir(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            inner: Mutex::new(Reservoir {
                count: 0,
                values: Vec::with_capacity(capacity.min(DEFAULT_RESERVOIR_SIZE)),
            }),
        }
    }

    pub fn update(&self, v: i64) {
        // A poisoned lock only means another updater panicked mid-push; the
        // reservoir is still a valid Vec.
        let mut r = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        r.count = r.count.saturating_add(1);
        if r.values.len() < self.capacity {
            r.values.push(v);
        } else {
            let idx = rand::thread_rng().gen_range(0..r.count);
            if let Some(slot) = usize::try_from(idx).ok().and_then(|i| r.values.get_mut(i)) {
                *slot = v;
            }
        }
    }

    pub fn clear(&self) {
        let mut r = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        r.count = 0;
        r.values.clear();
    }

    pub fn count(&self) -> i64 {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner).count
    }

    /// Copy the reservoir under the lock, compute statistics outside it.
    pub fn snapshot(&self) -> HistogramSnapshot {
        let (count, values) = {
            let r = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            (r.count, r.values.clone())
        };
        HistogramSnapshot::from_values(count, &values)
    }
}
