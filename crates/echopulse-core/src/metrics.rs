//! In-process metrics registry with Prometheus text exposition.
//!
//! Counters, gauges, and histograms are grouped into named families with a
//! fixed label schema. Series are created lazily on first update and backed
//! by `DashMap` + atomics, so no caller ever holds a lock across an await
//! point. Rendering walks sorted snapshots to keep the output deterministic.
//!
//! Label cardinality is the caller's contract: values must come from small
//! enumerable sets (route template, method, status code, peer name). The
//! registry never evicts a series once created.

use std::fmt::Write;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

use dashmap::DashMap;

use crate::error::{EchoPulseError, Result};

/// Metric family kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Counter,
    Gauge,
    Histogram,
}

impl MetricKind {
    fn as_str(self) -> &'static str {
        match self {
            MetricKind::Counter => "counter",
            MetricKind::Gauge => "gauge",
            MetricKind::Histogram => "histogram",
        }
    }
}

/// Static description of a metric family: name, help text, kind, and the
/// ordered label schema every series in the family follows.
#[derive(Debug, Clone, Copy)]
pub struct FamilySpec {
    pub name: &'static str,
    pub help: &'static str,
    pub kind: MetricKind,
    pub labels: &'static [&'static str],
    /// Histogram bucket upper bounds; empty for counters and gauges.
    pub buckets: &'static [f64],
}

struct HistogramCell {
    count: AtomicU64,
    /// f64 sum stored as its bit pattern, updated with a CAS loop.
    sum_bits: AtomicU64,
    buckets: Vec<AtomicU64>,
}

impl HistogramCell {
    fn new(n_buckets: usize) -> Self {
        Self {
            count: AtomicU64::new(0),
            sum_bits: AtomicU64::new(0f64.to_bits()),
            buckets: (0..n_buckets).map(|_| AtomicU64::new(0)).collect(),
        }
    }

    fn observe(&self, bounds: &[f64], value: f64) {
        // Cumulative buckets: every bound >= value is incremented.
        for (i, &le) in bounds.iter().enumerate() {
            if value <= le {
                if let Some(b) = self.buckets.get(i) {
                    b.fetch_add(1, Ordering::Relaxed);
                }
            }
        }
        self.count.fetch_add(1, Ordering::Relaxed);
        let _ = self
            .sum_bits
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |cur| {
                Some((f64::from_bits(cur) + value).to_bits())
            });
    }

    fn sum(&self) -> f64 {
        f64::from_bits(self.sum_bits.load(Ordering::Relaxed))
    }
}

enum Series {
    Counter(AtomicU64),
    Gauge(AtomicI64),
    Histogram(HistogramCell),
}

struct Family {
    spec: FamilySpec,
    series: DashMap<Vec<String>, Series>,
}

impl Family {
    /// Render `# HELP`/`# TYPE` plus every known series, sorted by label
    /// values.
    fn render(&self, out: &mut String) {
        let name = self.spec.name;
        let _ = writeln!(out, "# HELP {} {}", name, self.spec.help);
        let _ = writeln!(out, "# TYPE {} {}", name, self.spec.kind.as_str());

        let mut keys: Vec<Vec<String>> = self.series.iter().map(|s| s.key().clone()).collect();
        keys.sort();

        for k in keys {
            let Some(series) = self.series.get(&k) else { continue };
            let labels = label_str(self.spec.labels, &k);
            match series.value() {
                Series::Counter(c) => {
                    let v = c.load(Ordering::Relaxed);
                    let _ = writeln!(out, "{}{} {}", name, braced(&labels), v);
                }
                Series::Gauge(g) => {
                    let v = g.load(Ordering::Relaxed);
                    let _ = writeln!(out, "{}{} {}", name, braced(&labels), v);
                }
                Series::Histogram(h) => {
                    let prefix = if labels.is_empty() {
                        String::new()
                    } else {
                        format!("{labels},")
                    };
                    for (i, &le) in self.spec.buckets.iter().enumerate() {
                        let n = h.buckets.get(i).map(|b| b.load(Ordering::Relaxed)).unwrap_or(0);
                        let _ = writeln!(out, "{name}_bucket{{{prefix}le=\"{le}\"}} {n}");
                    }
                    let count = h.count.load(Ordering::Relaxed);
                    let _ = writeln!(out, "{name}_bucket{{{prefix}le=\"+Inf\"}} {count}");
                    let _ = writeln!(out, "{}_sum{} {}", name, braced(&labels), h.sum());
                    let _ = writeln!(out, "{}_count{} {}", name, braced(&labels), count);
                }
            }
        }
    }
}

/// Process-wide metrics registry.
///
/// One instance is constructed at startup and passed explicitly to every
/// component that records or renders metrics. Updates to a single series are
/// atomic and serialized; there is no ordering guarantee across series.
#[derive(Default)]
pub struct MetricsRegistry {
    families: DashMap<&'static str, Family>,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self {
            families: DashMap::new(),
        }
    }

    /// Register a family. Must be called exactly once per family before its
    /// first update; registering the same name twice is an error and the
    /// process should not serve traffic with an inconsistent schema.
    pub fn register(&self, spec: FamilySpec) -> Result<()> {
        match self.families.entry(spec.name) {
            dashmap::mapref::entry::Entry::Occupied(_) => {
                Err(EchoPulseError::DuplicateFamily(spec.name))
            }
            dashmap::mapref::entry::Entry::Vacant(v) => {
                v.insert(Family {
                    spec,
                    series: DashMap::new(),
                });
                Ok(())
            }
        }
    }

    /// Increment a counter series by 1.
    pub fn inc(&self, name: &str, labels: &[&str]) {
        self.add(name, labels, 1);
    }

    /// Increment a counter series by an arbitrary amount.
    pub fn add(&self, name: &str, labels: &[&str], v: u64) {
        let Some(family) = self.checked(name, MetricKind::Counter, labels) else {
            return;
        };
        let series = family
            .series
            .entry(key_of(labels))
            .or_insert_with(|| Series::Counter(AtomicU64::new(0)));
        if let Series::Counter(c) = series.value() {
            c.fetch_add(v, Ordering::Relaxed);
        }
    }

    /// Record one histogram observation. Non-finite or negative values are
    /// dropped with an error log; durations and sizes are never negative.
    pub fn observe(&self, name: &str, labels: &[&str], value: f64) {
        let Some(family) = self.checked(name, MetricKind::Histogram, labels) else {
            return;
        };
        if !value.is_finite() || value < 0.0 {
            tracing::error!(family = name, value, "non-finite or negative observation dropped");
            return;
        }
        let spec = family.spec;
        let series = family
            .series
            .entry(key_of(labels))
            .or_insert_with(|| Series::Histogram(HistogramCell::new(spec.buckets.len())));
        if let Series::Histogram(h) = series.value() {
            h.observe(spec.buckets, value);
        }
    }

    /// Set a gauge series to an absolute value.
    pub fn set_gauge(&self, name: &str, labels: &[&str], v: i64) {
        self.update_gauge(name, labels, |g| g.store(v, Ordering::Relaxed));
    }

    /// Add a signed delta to a gauge series.
    pub fn add_gauge(&self, name: &str, labels: &[&str], delta: i64) {
        self.update_gauge(name, labels, |g| {
            g.fetch_add(delta, Ordering::Relaxed);
        });
    }

    /// Increment a gauge series by 1.
    pub fn inc_gauge(&self, name: &str, labels: &[&str]) {
        self.add_gauge(name, labels, 1);
    }

    /// Decrement a gauge series by 1.
    pub fn dec_gauge(&self, name: &str, labels: &[&str]) {
        self.add_gauge(name, labels, -1);
    }

    /// Current value of a counter series, if it exists.
    pub fn counter_value(&self, name: &str, labels: &[&str]) -> Option<u64> {
        let family = self.families.get(name)?;
        let series = family.series.get(&key_of(labels))?;
        match series.value() {
            Series::Counter(c) => Some(c.load(Ordering::Relaxed)),
            _ => None,
        }
    }

    /// Current value of a gauge series, if it exists.
    pub fn gauge_value(&self, name: &str, labels: &[&str]) -> Option<i64> {
        let family = self.families.get(name)?;
        let series = family.series.get(&key_of(labels))?;
        match series.value() {
            Series::Gauge(g) => Some(g.load(Ordering::Relaxed)),
            _ => None,
        }
    }

    /// Total number of observations in a histogram series, if it exists.
    pub fn histogram_count(&self, name: &str, labels: &[&str]) -> Option<u64> {
        let family = self.families.get(name)?;
        let series = family.series.get(&key_of(labels))?;
        match series.value() {
            Series::Histogram(h) => Some(h.count.load(Ordering::Relaxed)),
            _ => None,
        }
    }

    /// Sum of all observations in a histogram series, if it exists.
    pub fn histogram_sum(&self, name: &str, labels: &[&str]) -> Option<f64> {
        let family = self.families.get(name)?;
        let series = family.series.get(&key_of(labels))?;
        match series.value() {
            Series::Histogram(h) => Some(h.sum()),
            _ => None,
        }
    }

    /// Render every family in Prometheus text exposition format.
    ///
    /// Families are emitted sorted by name and series sorted by label values,
    /// so two renders over the same state produce identical output. Safe to
    /// call concurrently with ongoing updates; each value read is atomic but
    /// there is no global snapshot across series.
    pub fn render(&self) -> String {
        let mut names: Vec<&'static str> = self.families.iter().map(|f| *f.key()).collect();
        names.sort_unstable();

        let mut out = String::new();
        for name in names {
            let Some(family) = self.families.get(name) else { continue };
            family.render(&mut out);
        }
        out
    }

    /// Look up a family and validate kind + label arity. Mismatches are a
    /// programming bug; they are logged and the update dropped rather than
    /// crashing a serving process.
    fn checked(
        &self,
        name: &str,
        kind: MetricKind,
        labels: &[&str],
    ) -> Option<dashmap::mapref::one::Ref<'_, &'static str, Family>> {
        let Some(family) = self.families.get(name) else {
            tracing::error!(family = name, "update for unregistered family dropped");
            return None;
        };
        if family.spec.kind != kind {
            tracing::error!(family = name, "update with wrong metric kind dropped");
            return None;
        }
        if family.spec.labels.len() != labels.len() {
            tracing::error!(
                family = name,
                expected = family.spec.labels.len(),
                got = labels.len(),
                "update with wrong label arity dropped"
            );
            return None;
        }
        Some(family)
    }

    fn update_gauge(&self, name: &str, labels: &[&str], f: impl FnOnce(&AtomicI64)) {
        let Some(family) = self.checked(name, MetricKind::Gauge, labels) else {
            return;
        };
        let series = family
            .series
            .entry(key_of(labels))
            .or_insert_with(|| Series::Gauge(AtomicI64::new(0)));
        if let Series::Gauge(g) = series.value() {
            f(g);
        }
    }
}

fn key_of(labels: &[&str]) -> Vec<String> {
    labels.iter().map(|v| (*v).to_string()).collect()
}

/// Helper to escape label values.
fn escape_label(v: &str) -> String {
    v.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n")
}

fn label_str(names: &[&str], values: &[String]) -> String {
    names
        .iter()
        .zip(values)
        .map(|(k, v)| format!("{}=\"{}\"", k, escape_label(v)))
        .collect::<Vec<_>>()
        .join(",")
}

fn braced(labels: &str) -> String {
    if labels.is_empty() {
        String::new()
    } else {
        format!("{{{labels}}}")
    }
}
