//! Metric registry.
//!
//! Families live in a `DashMap` keyed by name; each family keeps its labeled
//! series in a second `DashMap` keyed by the ordered label-value tuple, so a
//! first observation of a tuple is a concurrency-safe get-or-create. Values
//! are atomics, so `observe` and `serialize` can run from any number of
//! request tasks at once.
//!
//! A `Registry` is an ordinary value: the host constructs one, wraps it in an
//! `Arc`, and hands it to whatever needs it. Tests build their own.

mod definition;
mod instrument;
mod process;
mod text;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::error::{ReqMeterError, Result};

use instrument::Series;
use process::ProcessCollector;

pub use definition::{MetricDefinition, MetricKind, DEFAULT_BUCKETS};
pub use text::CONTENT_TYPE;

struct Family {
    def: MetricDefinition,
    series: DashMap<Vec<String>, Series>,
}

impl Family {
    fn new(def: MetricDefinition) -> Self {
        Self {
            def,
            series: DashMap::new(),
        }
    }

    fn check_labels(&self, label_values: &[&str]) -> Result<Vec<String>> {
        let expected = self.def.label_names().len();
        if label_values.len() != expected {
            return Err(ReqMeterError::LabelCardinality {
                name: self.def.name().to_string(),
                expected,
                got: label_values.len(),
            });
        }
        Ok(label_values.iter().map(|v| v.to_string()).collect())
    }

    fn with_series<R>(&self, key: Vec<String>, f: impl FnOnce(&Series) -> R) -> R {
        let def = &self.def;
        let series = self
            .series
            .entry(key)
            .or_insert_with(|| Series::new(def.kind(), def.buckets().len()));
        f(series.value())
    }
}

/// Process-wide collection of metric families.
pub struct Registry {
    families: DashMap<String, Family>,
    process: ProcessCollector,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    pub fn new() -> Self {
        Self {
            families: DashMap::new(),
            process: ProcessCollector::new(),
        }
    }

    /// Register a new family. Fails with `DuplicateName` if the name is taken,
    /// leaving the existing family untouched.
    pub fn register(&self, def: MetricDefinition) -> Result<()> {
        def.validate()?;
        match self.families.entry(def.name().to_string()) {
            Entry::Occupied(_) => Err(ReqMeterError::DuplicateName(def.name().to_string())),
            Entry::Vacant(v) => {
                tracing::debug!(
                    metric = %def.name(),
                    kind = def.kind().as_str(),
                    "metric registered"
                );
                v.insert(Family::new(def));
                Ok(())
            }
        }
    }

    /// Like `register`, but an identical existing definition is accepted.
    fn ensure_registered(&self, def: MetricDefinition) -> Result<()> {
        if let Some(existing) = self.families.get(def.name()) {
            if existing.def == def {
                return Ok(());
            }
            return Err(ReqMeterError::DuplicateName(def.name().to_string()));
        }
        match self.register(def.clone()) {
            // lost a registration race against an identical definition
            Err(ReqMeterError::DuplicateName(_)) => self.ensure_registered(def),
            other => other,
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.families.contains_key(name)
    }

    /// Number of registered families.
    pub fn len(&self) -> usize {
        self.families.len()
    }

    pub fn is_empty(&self) -> bool {
        self.families.is_empty()
    }

    /// Apply `delta` to the series for `label_values`, creating it on first use.
    ///
    /// Counters reject negative or non-finite deltas with `InvalidDelta`;
    /// gauges add the delta; histograms record it as one observation.
    pub fn observe(&self, name: &str, label_values: &[&str], delta: f64) -> Result<()> {
        let family = self
            .families
            .get(name)
            .ok_or_else(|| ReqMeterError::UnknownMetric(name.to_string()))?;
        let key = family.check_labels(label_values)?;

        let invalid = match family.def.kind() {
            MetricKind::Counter => !delta.is_finite() || delta < 0.0,
            MetricKind::Gauge => !delta.is_finite(),
            MetricKind::Histogram => delta.is_nan(),
        };
        if invalid {
            return Err(ReqMeterError::InvalidDelta {
                name: name.to_string(),
                delta,
            });
        }

        let bounds = family.def.buckets();
        family.with_series(key, |s| s.observe(bounds, delta));
        Ok(())
    }

    /// Shorthand for `observe(name, label_values, 1.0)`.
    pub fn inc(&self, name: &str, label_values: &[&str]) -> Result<()> {
        self.observe(name, label_values, 1.0)
    }

    /// Overwrite a gauge value.
    pub fn set(&self, name: &str, label_values: &[&str], value: f64) -> Result<()> {
        let family = self
            .families
            .get(name)
            .ok_or_else(|| ReqMeterError::UnknownMetric(name.to_string()))?;
        if family.def.kind() != MetricKind::Gauge {
            return Err(ReqMeterError::KindMismatch {
                name: name.to_string(),
                kind: family.def.kind().as_str(),
                op: "set",
            });
        }
        let key = family.check_labels(label_values)?;
        family.with_series(key, |s| s.set(value));
        Ok(())
    }

    /// Current value of a series without creating it. Histograms report their
    /// observation count.
    pub fn get(&self, name: &str, label_values: &[&str]) -> Option<f64> {
        let family = self.families.get(name)?;
        let key: Vec<String> = label_values.iter().map(|v| v.to_string()).collect();
        let value = family.series.get(&key).map(|s| s.current());
        value
    }

    /// Register (on first call) and sample the default process gauges.
    pub fn collect_default(&self) -> Result<()> {
        for def in process::definitions() {
            self.ensure_registered(def)?;
        }
        for (name, value) in self.process.sample() {
            self.set(name, &[], value)?;
        }
        Ok(())
    }

    /// Render every family in the text exposition format.
    ///
    /// Families are ordered by name and series by label tuple, so two calls
    /// over the same state produce identical output.
    pub fn serialize(&self) -> String {
        let mut names: Vec<String> = self.families.iter().map(|e| e.key().clone()).collect();
        names.sort();

        let mut out = String::new();
        for name in &names {
            let Some(family) = self.families.get(name) else {
                continue;
            };
            let mut series: Vec<_> = family
                .series
                .iter()
                .map(|e| (e.key().clone(), e.value().snapshot()))
                .collect();
            series.sort_by(|a, b| a.0.cmp(&b.0));
            text::write_family(&mut out, &family.def, &series);
        }
        out
    }
}
