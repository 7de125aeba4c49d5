use crate::config::OpenTsdbOptions;

const DEFAULT_GLOBAL_PREFIX: &str = "stats";
const DEFAULT_COUNTER_PREFIX: &str = "counters";
const DEFAULT_TIMER_PREFIX: &str = "timers";
const DEFAULT_GAUGE_PREFIX: &str = "gauges";
const DEFAULT_SET_PREFIX: &str = "sets";

/// Dotted-path prefixes for each metric kind, resolved once at init.
///
/// In legacy mode the namespaces are fixed literals and every configured
/// prefix is ignored.  Otherwise each kind's namespace is the global segment
/// followed by the kind segment, with explicitly emptied segments omitted
/// rather than emitted as empty path components.
#[derive(Clone, Debug, PartialEq)]
pub struct Namespaces {
    /// Namespace for summary keys (joined with the fixed `statsd` segment).
    pub global: Vec<String>,
    /// Namespace for counter keys.
    pub counter: Vec<String>,
    /// Namespace for timer keys.
    pub timer: Vec<String>,
    /// Namespace for gauge keys.
    pub gauge: Vec<String>,
    /// Namespace for set keys.
    pub set: Vec<String>,
    /// Whether the fixed historical naming scheme is active.
    pub legacy: bool,
}

impl Namespaces {
    /// Resolves the namespaces from the options group.
    ///
    /// Pure function of configuration: absent values fall back to the
    /// documented defaults, and nothing here can fail.
    pub fn resolve(options: &OpenTsdbOptions) -> Namespaces {
        let legacy = options.legacy_namespace.unwrap_or(true);
        if legacy {
            return Namespaces {
                global: segments(&["stats"]),
                counter: segments(&["stats"]),
                timer: segments(&["stats", "timers"]),
                gauge: segments(&["stats", "gauges"]),
                set: segments(&["stats", "sets"]),
                legacy,
            };
        }

        let global_prefix = options.global_prefix.as_deref().unwrap_or(DEFAULT_GLOBAL_PREFIX);
        let counter_prefix = options.prefix_counter.as_deref().unwrap_or(DEFAULT_COUNTER_PREFIX);
        let timer_prefix = options.prefix_timer.as_deref().unwrap_or(DEFAULT_TIMER_PREFIX);
        let gauge_prefix = options.prefix_gauge.as_deref().unwrap_or(DEFAULT_GAUGE_PREFIX);
        let set_prefix = options.prefix_set.as_deref().unwrap_or(DEFAULT_SET_PREFIX);

        Namespaces {
            global: compose(global_prefix, None),
            counter: compose(global_prefix, Some(counter_prefix)),
            timer: compose(global_prefix, Some(timer_prefix)),
            gauge: compose(global_prefix, Some(gauge_prefix)),
            set: compose(global_prefix, Some(set_prefix)),
            legacy,
        }
    }

    /// Returns the joined namespace for the backend's self-observability
    /// keys: the global namespace followed by the fixed `statsd` segment.
    pub fn summary_key(&self) -> String {
        join_key(self.global.iter().map(String::as_str).chain(["statsd"]))
    }
}

fn segments(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|p| (*p).to_string()).collect()
}

fn compose(global: &str, kind: Option<&str>) -> Vec<String> {
    let mut namespace = Vec::new();
    if !global.is_empty() {
        namespace.push(global.to_string());
    }
    if let Some(kind) = kind {
        if !kind.is_empty() {
            namespace.push(kind.to_string());
        }
    }
    namespace
}

/// Joins path segments with dots, skipping empty segments so a key never
/// carries a leading, trailing, or doubled separator.
pub(crate) fn join_key<'a>(segments: impl IntoIterator<Item = &'a str>) -> String {
    let mut key = String::new();
    for segment in segments {
        if segment.is_empty() {
            continue;
        }
        if !key.is_empty() {
            key.push('.');
        }
        key.push_str(segment);
    }
    key
}
