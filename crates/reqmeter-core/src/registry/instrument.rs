//! Lock-free instrument cells.
//!
//! Values are `f64` stored as bits in an `AtomicU64`; updates go through a CAS
//! loop so concurrent observers never lose an increment. Histogram buckets are
//! kept cumulative at write time, so rendering is a plain load per bucket.

use std::sync::atomic::{AtomicU64, Ordering};

use super::definition::MetricKind;

pub(crate) struct AtomicF64(AtomicU64);

impl AtomicF64 {
    pub(crate) fn new(v: f64) -> Self {
        Self(AtomicU64::new(v.to_bits()))
    }

    pub(crate) fn load(&self) -> f64 {
        f64::from_bits(self.0.load(Ordering::Acquire))
    }

    pub(crate) fn store(&self, v: f64) {
        self.0.store(v.to_bits(), Ordering::Release);
    }

    pub(crate) fn add(&self, delta: f64) {
        // The closure always yields Some, so fetch_update cannot fail.
        let _ = self
            .0
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |bits| {
                Some((f64::from_bits(bits) + delta).to_bits())
            });
    }
}

pub(crate) struct HistogramCell {
    buckets: Box<[AtomicU64]>,
    sum: AtomicF64,
    count: AtomicU64,
}

impl HistogramCell {
    fn new(n: usize) -> Self {
        Self {
            buckets: (0..n).map(|_| AtomicU64::new(0)).collect(),
            sum: AtomicF64::new(0.0),
            count: AtomicU64::new(0),
        }
    }

    fn observe(&self, bounds: &[f64], v: f64) {
        for (cell, &le) in self.buckets.iter().zip(bounds) {
            if v <= le {
                cell.fetch_add(1, Ordering::Relaxed);
            }
        }
        self.sum.add(v);
        self.count.fetch_add(1, Ordering::AcqRel);
    }
}

/// One labeled instance of a metric family.
pub(crate) enum Series {
    Scalar(AtomicF64),
    Histogram(HistogramCell),
}

/// Point-in-time copy of a series, taken for rendering.
#[derive(Debug, Clone)]
pub(crate) enum SeriesSnapshot {
    Scalar(f64),
    Histogram {
        cumulative: Vec<u64>,
        sum: f64,
        count: u64,
    },
}

impl Series {
    pub(crate) fn new(kind: MetricKind, bucket_count: usize) -> Self {
        match kind {
            MetricKind::Counter | MetricKind::Gauge => Series::Scalar(AtomicF64::new(0.0)),
            MetricKind::Histogram => Series::Histogram(HistogramCell::new(bucket_count)),
        }
    }

    /// Apply an already-validated observation.
    pub(crate) fn observe(&self, bounds: &[f64], v: f64) {
        match self {
            Series::Scalar(cell) => cell.add(v),
            Series::Histogram(h) => h.observe(bounds, v),
        }
    }

    pub(crate) fn set(&self, v: f64) {
        if let Series::Scalar(cell) = self {
            cell.store(v);
        }
    }

    /// Scalar value, or observation count for histograms.
    pub(crate) fn current(&self) -> f64 {
        match self {
            Series::Scalar(cell) => cell.load(),
            Series::Histogram(h) => h.count.load(Ordering::Acquire) as f64,
        }
    }

    pub(crate) fn snapshot(&self) -> SeriesSnapshot {
        match self {
            Series::Scalar(cell) => SeriesSnapshot::Scalar(cell.load()),
            Series::Histogram(h) => SeriesSnapshot::Histogram {
                cumulative: h.buckets.iter().map(|b| b.load(Ordering::Relaxed)).collect(),
                sum: h.sum.load(),
                count: h.count.load(Ordering::Acquire),
            },
        }
    }
}
