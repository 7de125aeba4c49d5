use std::time::Instant;

use statsd_backend_core::{MetricsSnapshot, Value};
use tracing::warn;

use crate::{
    config::OpenTsdbConfig,
    filter::MetricFilter,
    namespace::{join_key, Namespaces},
    tags::extract_tags,
};

/// Trailing tag applied to every line when no instance name is configured.
const DEFAULT_SOURCE_TAG: &str = "source=statsd";

/// Substrings retained by `minimalTimerStats`.
const MINIMAL_TIMER_STATS: &[&str] = &["mean", "median", "count", "lower", "upper", "std"];

/// Percentile-qualified aggregate fields dropped by `onlyUpperForPercentile`.
const PERCENTILE_AGGREGATES: &[&str] = &["count_", "mean_", "sum_"];

/// A rendered flush payload.
#[derive(Debug)]
pub struct RenderedPayload {
    /// The payload text, one `put` command per newline-terminated line.
    pub text: String,
    /// Number of accepted metrics; a timer counts once per metric name
    /// regardless of how many statistic lines it emitted.
    pub num_stats: u64,
}

struct ValueFormatter {
    int_writer: itoa::Buffer,
    float_writer: ryu::Buffer,
}

impl ValueFormatter {
    fn new() -> ValueFormatter {
        ValueFormatter { int_writer: itoa::Buffer::new(), float_writer: ryu::Buffer::new() }
    }

    fn format(&mut self, value: Value) -> &str {
        match value {
            Value::Integer(v) => self.int_writer.format(v),
            Value::Unsigned(v) => self.int_writer.format(v),
            Value::Float(v) => self.float_writer.format(v),
        }
    }
}

/// Renders flush snapshots into OpenTSDB `put` commands.
///
/// One writer is built at init and reused for every flush.  Rendering is a
/// pure function of the flush timestamp and the snapshot (plus the measured
/// calculation time), so a fixed input produces the same payload text every
/// time.
pub struct PayloadWriter {
    namespaces: Namespaces,
    filter: MetricFilter,
    tag_prefix: Option<String>,
    source_tag: String,
    minimal_timer_stats: bool,
    only_upper_for_percentile: bool,
}

impl PayloadWriter {
    /// Creates a writer from resolved namespaces and the backend config.
    pub fn new(namespaces: Namespaces, config: &OpenTsdbConfig) -> PayloadWriter {
        let source_tag = match &config.instance_name {
            Some(name) => format!("instance={}", name),
            None => DEFAULT_SOURCE_TAG.to_string(),
        };

        PayloadWriter {
            namespaces,
            filter: MetricFilter::new(
                config.opentsdb.included_prefixes.clone(),
                config.opentsdb.excluded_prefixes.clone(),
            ),
            tag_prefix: config.tag_prefix.clone(),
            source_tag,
            minimal_timer_stats: config.opentsdb.minimal_timer_stats,
            only_upper_for_percentile: config.opentsdb.only_upper_for_percentile,
        }
    }

    /// Renders one flush into a payload and the accepted-metric count.
    ///
    /// Entries rejected by the prefix filter are skipped without a trace;
    /// entries with out-of-range values are skipped with a diagnostic and do
    /// not count toward `num_stats`.
    pub fn render(&self, timestamp: u64, snapshot: &MetricsSnapshot) -> RenderedPayload {
        let started = Instant::now();
        let mut text = String::new();
        let mut formatter = ValueFormatter::new();
        let mut num_stats: u64 = 0;

        for (name, value) in &snapshot.counters {
            let (stripped, tags) = match self.admit(name) {
                Some(entry) => entry,
                None => continue,
            };

            if !value.in_i64_range() {
                warn!(
                    metric = %stripped,
                    value = value.as_f64(),
                    "counter value outside signed 64-bit range, skipping"
                );
                continue;
            }

            let key = if self.namespaces.legacy {
                join_key(["stats_counts", stripped.as_str()])
            } else {
                self.kind_key(&self.namespaces.counter, &stripped, Some("count"))
            };
            self.put_line(&mut text, &mut formatter, &key, timestamp, *value, Some(&tags));
            num_stats += 1;
        }

        for (name, stats) in &snapshot.timer_data {
            let (stripped, tags) = match self.admit(name) {
                Some(entry) => entry,
                None => continue,
            };

            for (stat, value) in stats {
                if !self.timer_stat_allowed(stat) {
                    continue;
                }
                if !value.in_i64_range() {
                    warn!(
                        metric = %stripped,
                        statistic = %stat,
                        value = value.as_f64(),
                        "timer statistic outside signed 64-bit range, skipping"
                    );
                    continue;
                }

                let key = self.kind_key(&self.namespaces.timer, &stripped, Some(stat.as_str()));
                self.put_line(&mut text, &mut formatter, &key, timestamp, *value, Some(&tags));
            }

            // One unit per timer name, however many statistic lines emitted.
            num_stats += 1;
        }

        for (name, value) in &snapshot.gauges {
            let (stripped, tags) = match self.admit(name) {
                Some(entry) => entry,
                None => continue,
            };

            if value.above_i64_range() {
                warn!(
                    metric = %stripped,
                    value = value.as_f64(),
                    "gauge value too high for signed 64-bit range, skipping"
                );
                continue;
            }
            if value.below_i64_range() {
                warn!(
                    metric = %stripped,
                    value = value.as_f64(),
                    "gauge value too low for signed 64-bit range, skipping"
                );
                continue;
            }

            let key = self.kind_key(&self.namespaces.gauge, &stripped, None);
            self.put_line(&mut text, &mut formatter, &key, timestamp, *value, Some(&tags));
            num_stats += 1;
        }

        for (name, values) in &snapshot.sets {
            let (stripped, tags) = match self.admit(name) {
                Some(entry) => entry,
                None => continue,
            };

            let count = values.len() as u64;
            if Value::Unsigned(count).above_i64_range() {
                warn!(
                    metric = %stripped,
                    count,
                    "set cardinality too high for signed 64-bit range, skipping"
                );
                continue;
            }

            let key = self.kind_key(&self.namespaces.set, &stripped, Some("count"));
            self.put_line(
                &mut text,
                &mut formatter,
                &key,
                timestamp,
                Value::Unsigned(count),
                Some(&tags),
            );
            num_stats += 1;
        }

        // Summary lines: always emitted, never filtered, bounds-checked, or
        // tagged beyond the trailing source/instance tag.
        let summary = self.namespaces.summary_key();

        let num_stats_key = if self.namespaces.legacy {
            "statsd.numStats".to_string()
        } else {
            join_key([summary.as_str(), "numStats"])
        };
        self.put_line(
            &mut text,
            &mut formatter,
            &num_stats_key,
            timestamp,
            Value::Unsigned(num_stats),
            None,
        );

        let calculation_key = if self.namespaces.legacy {
            "stats.statsd.opentsdbStats.calculationtime".to_string()
        } else {
            join_key([summary.as_str(), "opentsdbStats", "calculationtime"])
        };
        let elapsed_ms = started.elapsed().as_millis() as u64;
        self.put_line(
            &mut text,
            &mut formatter,
            &calculation_key,
            timestamp,
            Value::Unsigned(elapsed_ms),
            None,
        );

        for (name, value) in &snapshot.statsd_metrics {
            let key = if self.namespaces.legacy {
                join_key(["stats.statsd", name.as_str()])
            } else {
                join_key([summary.as_str(), name.as_str()])
            };
            self.put_line(&mut text, &mut formatter, &key, timestamp, *value, None);
        }

        RenderedPayload { text, num_stats }
    }

    fn admit(&self, name: &str) -> Option<(String, Vec<String>)> {
        let (stripped, tags) = extract_tags(name, self.tag_prefix.as_deref());
        if self.filter.includes(&stripped) {
            Some((stripped, tags))
        } else {
            None
        }
    }

    fn kind_key(&self, namespace: &[String], name: &str, suffix: Option<&str>) -> String {
        join_key(namespace.iter().map(String::as_str).chain([name]).chain(suffix))
    }

    fn timer_stat_allowed(&self, stat: &str) -> bool {
        if self.minimal_timer_stats && !MINIMAL_TIMER_STATS.iter().any(|keep| stat.contains(keep)) {
            return false;
        }
        if self.only_upper_for_percentile
            && PERCENTILE_AGGREGATES.iter().any(|drop| stat.contains(drop))
        {
            return false;
        }
        true
    }

    // Metric lines always carry a tag field, even when the tag list is
    // empty (a blank field before the trailing tag); summary lines carry no
    // tag field at all.
    fn put_line(
        &self,
        out: &mut String,
        formatter: &mut ValueFormatter,
        key: &str,
        timestamp: u64,
        value: Value,
        tags: Option<&[String]>,
    ) {
        out.push_str("put ");
        out.push_str(key);
        out.push(' ');
        out.push_str(formatter.format(Value::Unsigned(timestamp)));
        out.push(' ');
        out.push_str(formatter.format(value));
        out.push(' ');
        if let Some(tags) = tags {
            out.push_str(&tags.join(" "));
            out.push(' ');
        }
        out.push_str(&self.source_tag);
        out.push('\n');
    }
}
