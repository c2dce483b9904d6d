//! Batch counters and timing statistics.
//!
//! Counters are atomics so a converter running on another task can record
//! into the same collector; timing samples sit behind a mutex.

use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Upper bound on retained timing samples.
const MAX_SAMPLES: usize = 4096;

/// Collects counts and timings for one or more batches.
#[derive(Debug, Default)]
pub struct ConversionMetrics {
    attempted: AtomicU64,
    succeeded: AtomicU64,
    failed: AtomicU64,
    timed_out: AtomicU64,
    sources_removed: AtomicU64,
    removal_failures: AtomicU64,
    input_bytes: AtomicU64,
    output_bytes: AtomicU64,
    samples: Mutex<Vec<Duration>>,
}

impl ConversionMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// A file is about to be handed to the converter.
    pub fn record_attempt(&self, input_bytes: Option<u64>) {
        self.attempted.fetch_add(1, Ordering::Relaxed);
        if let Some(bytes) = input_bytes {
            self.input_bytes.fetch_add(bytes, Ordering::Relaxed);
        }
    }

    pub fn record_success(&self, elapsed: Duration, output_bytes: u64) {
        self.succeeded.fetch_add(1, Ordering::Relaxed);
        self.output_bytes.fetch_add(output_bytes, Ordering::Relaxed);

        if let Ok(mut samples) = self.samples.lock() {
            if samples.len() == MAX_SAMPLES {
                samples.remove(0);
            }
            samples.push(elapsed);
        }
    }

    /// A failed conversion. Timeouts count as failures too.
    pub fn record_failure(&self, timed_out: bool) {
        self.failed.fetch_add(1, Ordering::Relaxed);
        if timed_out {
            self.timed_out.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_removal(&self, ok: bool) {
        let counter = if ok {
            &self.sources_removed
        } else {
            &self.removal_failures
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Point-in-time copy of all counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let mut samples = self
            .samples
            .lock()
            .map(|s| s.clone())
            .unwrap_or_default();
        samples.sort();

        let pick = |pct: usize| -> Option<u64> {
            if samples.is_empty() {
                return None;
            }
            let idx = ((samples.len() - 1) * pct) / 100;
            samples.get(idx).map(|d| d.as_millis() as u64)
        };

        let total_ms: u128 = samples.iter().map(Duration::as_millis).sum();
        let mean_ms = (!samples.is_empty()).then(|| (total_ms / samples.len() as u128) as u64);

        MetricsSnapshot {
            attempted: self.attempted.load(Ordering::Relaxed),
            succeeded: self.succeeded.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            timed_out: self.timed_out.load(Ordering::Relaxed),
            sources_removed: self.sources_removed.load(Ordering::Relaxed),
            removal_failures: self.removal_failures.load(Ordering::Relaxed),
            input_bytes: self.input_bytes.load(Ordering::Relaxed),
            output_bytes: self.output_bytes.load(Ordering::Relaxed),
            mean_ms,
            p50_ms: pick(50),
            p95_ms: pick(95),
            max_ms: samples.last().map(|d| d.as_millis() as u64),
        }
    }
}

/// Serializable view of [`ConversionMetrics`]. Timings are milliseconds
/// over successful conversions only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub attempted: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub timed_out: u64,
    pub sources_removed: u64,
    pub removal_failures: u64,
    pub input_bytes: u64,
    pub output_bytes: u64,
    pub mean_ms: Option<u64>,
    pub p50_ms: Option<u64>,
    pub p95_ms: Option<u64>,
    pub max_ms: Option<u64>,
}
