use serde::Deserialize;

/// Configuration for the OpenTSDB backend.
///
/// This mirrors the backend's slice of the daemon's configuration file: the
/// daemon parses its config and hands the relevant section over at init.
/// Field names keep the daemon's camelCase spelling on the wire.
///
/// For the prefix fields, `None` means "use the documented default" while an
/// explicitly configured empty string means "omit that path segment".
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct OpenTsdbConfig {
    /// Hostname of the OpenTSDB server.  Delivery is disabled when unset;
    /// rendering still happens, and a flush is then a silent no-op on the
    /// network side.
    #[serde(rename = "opentsdbHost")]
    pub host: Option<String>,

    /// Port of the OpenTSDB server.  Defaults to 4242.
    #[serde(rename = "opentsdbPort")]
    pub port: Option<u16>,

    /// Emit verbose trace output, including the rendered payload per flush.
    pub debug: bool,

    /// The daemon's flush interval in milliseconds.  Informational only.
    #[serde(rename = "flushInterval")]
    pub flush_interval: Option<u64>,

    /// Token marking embedded tag segments inside dotted metric names.
    ///
    /// Tag extraction is disabled when unset or empty.
    #[serde(rename = "opentsdbTagPrefix")]
    pub tag_prefix: Option<String>,

    /// Instance identifier used to tag every emitted line as
    /// `instance=<name>` in place of the default `source=statsd`.
    pub instance_name: Option<String>,

    /// The nested backend options group.
    pub opentsdb: OpenTsdbOptions,
}

/// The nested `opentsdb` options group.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OpenTsdbOptions {
    /// Global path segment shared by all metric kinds.  Default `stats`.
    pub global_prefix: Option<String>,

    /// Counter path segment.  Default `counters`.
    pub prefix_counter: Option<String>,

    /// Timer path segment.  Default `timers`.
    pub prefix_timer: Option<String>,

    /// Gauge path segment.  Default `gauges`.
    pub prefix_gauge: Option<String>,

    /// Set path segment.  Default `sets`.
    pub prefix_set: Option<String>,

    /// Use the fixed historical naming scheme, ignoring all configured
    /// prefixes.  Default `true`.
    pub legacy_namespace: Option<bool>,

    /// Restrict timer output to statistics whose name contains `mean`,
    /// `median`, `count`, `lower`, `upper`, or `std`.
    pub minimal_timer_stats: bool,

    /// Additionally drop percentile-qualified aggregate statistics
    /// (`count_*`, `mean_*`, `sum_*`), keeping `upper_*` as the only
    /// per-percentile output.
    pub only_upper_for_percentile: bool,

    /// If non-empty, only metrics whose stripped name starts with one of
    /// these prefixes are exported.
    pub included_prefixes: Vec<String>,

    /// Metrics whose stripped name starts with one of these prefixes are
    /// never exported, even when allow-listed.
    pub excluded_prefixes: Vec<String>,
}
