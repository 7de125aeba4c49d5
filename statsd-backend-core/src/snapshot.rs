use indexmap::{IndexMap, IndexSet};

use crate::Value;

/// A point-in-time view of the daemon's aggregated metrics.
///
/// The daemon builds one snapshot per flush interval and hands it, read-only,
/// to every registered backend.  Maps preserve insertion order, so a backend
/// iterating a given snapshot sees the same order every time.
#[derive(Debug, Clone, Default)]
pub struct MetricsSnapshot {
    /// Aggregated counter totals for the interval, keyed by metric name.
    pub counters: IndexMap<String, Value>,
    /// Last-observed gauge values, keyed by metric name.
    pub gauges: IndexMap<String, Value>,
    /// Per-timer aggregate statistics, keyed by metric name and then by
    /// statistic name (`mean`, `median`, `count`, `lower`, `upper`, `std`,
    /// `sum`, and percentile-qualified variants such as `upper_90`).
    pub timer_data: IndexMap<String, IndexMap<String, Value>>,
    /// Distinct values observed per set metric during the interval.
    pub sets: IndexMap<String, IndexSet<String>>,
    /// The daemon's own internal counters, e.g. `bad_lines_seen`.
    pub statsd_metrics: IndexMap<String, Value>,
}

impl MetricsSnapshot {
    /// Creates an empty snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a counter total.
    pub fn record_counter(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.counters.insert(name.into(), value.into());
    }

    /// Records a gauge value.
    pub fn record_gauge(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.gauges.insert(name.into(), value.into());
    }

    /// Records one aggregate statistic for a timer.
    pub fn record_timer_stat(
        &mut self,
        name: impl Into<String>,
        stat: impl Into<String>,
        value: impl Into<Value>,
    ) {
        self.timer_data.entry(name.into()).or_default().insert(stat.into(), value.into());
    }

    /// Records one distinct member of a set metric.
    pub fn record_set_value(&mut self, name: impl Into<String>, member: impl Into<String>) {
        self.sets.entry(name.into()).or_default().insert(member.into());
    }

    /// Records one of the daemon's internal counters.
    pub fn record_statsd_metric(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.statsd_metrics.insert(name.into(), value.into());
    }

    /// Returns `true` if the snapshot holds no metrics of any kind.
    pub fn is_empty(&self) -> bool {
        self.counters.is_empty()
            && self.gauges.is_empty()
            && self.timer_data.is_empty()
            && self.sets.is_empty()
            && self.statsd_metrics.is_empty()
    }
}
