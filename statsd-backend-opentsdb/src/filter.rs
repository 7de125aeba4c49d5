/// Allow-list/deny-list prefix filter applied to stripped metric names.
#[derive(Clone, Debug, Default)]
pub struct MetricFilter {
    included: Vec<String>,
    excluded: Vec<String>,
}

impl MetricFilter {
    /// Creates a filter from the configured prefix lists.
    ///
    /// An empty allow-list imposes no restriction; the deny-list always
    /// wins over the allow-list.
    pub fn new(included: Vec<String>, excluded: Vec<String>) -> MetricFilter {
        MetricFilter { included, excluded }
    }

    /// Returns `true` if a metric with this stripped name should be
    /// exported.
    pub fn includes(&self, name: &str) -> bool {
        if !self.included.is_empty()
            && !self.included.iter().any(|prefix| name.starts_with(prefix.as_str()))
        {
            return false;
        }

        !self.excluded.iter().any(|prefix| name.starts_with(prefix.as_str()))
    }
}
