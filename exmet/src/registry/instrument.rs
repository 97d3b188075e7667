/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use hdrhistogram::Histogram;

/// A monotonically increasing count.
pub struct Counter {
    count: AtomicU64,
}

impl Counter {
    pub(crate) fn new() -> Self {
        Counter {
            count: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn inc(&self) {
        self.add(1);
    }

    #[inline]
    pub fn add(&self, n: u64) {
        self.count.fetch_add(n, Ordering::Relaxed);
    }

    #[inline]
    pub fn value(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }
}

/// Tracks how often an event occurs.
#[derive(Debug)]
pub struct Meter {
    count: AtomicU64,
    started: Instant,
}

impl Meter {
    pub(crate) fn new() -> Self {
        Meter {
            count: AtomicU64::new(0),
            started: Instant::now(),
        }
    }

    #[inline]
    pub fn mark(&self) {
        self.count.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    /// Events per second since the meter was created.
    pub fn mean_rate(&self) -> f64 {
        let count = self.count();
        if count == 0 {
            return 0.0;
        }
        let elapsed = self.started.elapsed().as_secs_f64();
        if elapsed <= 0.0 {
            return 0.0;
        }
        count as f64 / elapsed
    }
}

pub struct TimerSnapshot {
    pub count: u64,
    pub min: u64,
    pub max: u64,
    pub mean: f64,
    pub p50: u64,
    pub p95: u64,
    pub p99: u64,
}

/// Tracks occurrence rate and a distribution of durations, with
/// millisecond resolution.
pub struct Timer {
    histogram: Mutex<Histogram<u64>>,
}

impl Timer {
    pub(crate) fn new() -> Self {
        Timer {
            histogram: Mutex::new(Histogram::new(3).unwrap()),
        }
    }

    pub fn update(&self, duration: Duration) {
        self.update_millis(duration.as_millis() as u64);
    }

    pub fn update_millis(&self, millis: u64) {
        let mut histogram = self.histogram.lock().unwrap();
        let _ = histogram.record(millis);
    }

    pub fn count(&self) -> u64 {
        self.histogram.lock().unwrap().len()
    }

    pub fn stats(&self) -> TimerSnapshot {
        let histogram = self.histogram.lock().unwrap();
        TimerSnapshot {
            count: histogram.len(),
            min: histogram.min(),
            max: histogram.max(),
            mean: histogram.mean(),
            p50: histogram.value_at_quantile(0.50),
            p95: histogram.value_at_quantile(0.95),
            p99: histogram.value_at_quantile(0.99),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counter_add() {
        let counter = Counter::new();
        counter.inc();
        counter.add(2);
        assert_eq!(counter.value(), 3);
    }

    #[test]
    fn meter_rate() {
        let meter = Meter::new();
        assert_eq!(meter.mean_rate(), 0.0);
        meter.mark();
        meter.mark();
        assert_eq!(meter.count(), 2);
        assert!(meter.mean_rate() > 0.0);
    }

    #[test]
    fn timer_stats() {
        let timer = Timer::new();
        timer.update_millis(100);
        timer.update_millis(200);
        timer.update(Duration::from_millis(300));
        let stats = timer.stats();
        assert_eq!(stats.count, 3);
        assert!(stats.min <= 100);
        // hdrhistogram stores values with 3 significant figures
        assert!((299..=301).contains(&stats.max));
        assert!(stats.mean > 100.0);
        assert!(stats.p99 >= stats.p50);
    }

    #[test]
    fn timer_empty() {
        let timer = Timer::new();
        let stats = timer.stats();
        assert_eq!(stats.count, 0);
        assert_eq!(stats.max, 0);
    }
}
