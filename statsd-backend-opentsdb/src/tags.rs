/// Splits embedded tag segments out of a dotted metric name.
///
/// A segment beginning with `tag_prefix` names a tag key (the prefix token
/// is stripped from it); the segment that follows is that tag's value.  Both
/// segments are removed from the name, and each pair is rendered as
/// `key=value`, ordered by position of occurrence.  All other segments are
/// kept in their original order and rejoined with dots.
///
/// A key segment with no following segment is dropped silently.  When
/// `tag_prefix` is unset or empty, extraction is disabled and the name is
/// returned unchanged -- an empty token would otherwise match every segment
/// and shred the name into bogus tag pairs.
pub fn extract_tags(name: &str, tag_prefix: Option<&str>) -> (String, Vec<String>) {
    let prefix = match tag_prefix {
        Some(prefix) if !prefix.is_empty() => prefix,
        _ => return (name.to_string(), Vec::new()),
    };

    let mut kept: Vec<&str> = Vec::new();
    let mut tags = Vec::new();
    let mut segments = name.split('.');
    while let Some(segment) = segments.next() {
        match segment.strip_prefix(prefix) {
            Some(key) => {
                if let Some(value) = segments.next() {
                    tags.push(format!("{}={}", key, value));
                }
            }
            None => kept.push(segment),
        }
    }

    (kept.join("."), tags)
}

#[cfg(test)]
mod tests {
    use super::extract_tags;

    #[test]
    fn extracts_a_tag_pair_and_strips_it_from_the_name() {
        let (name, tags) = extract_tags("app._t_host.web1.requests", Some("_t_"));
        assert_eq!(name, "app.requests");
        assert_eq!(tags, vec!["host=web1".to_string()]);
    }

    #[test]
    fn multiple_tags_keep_order_of_occurrence() {
        let (name, tags) = extract_tags("app._t_host.web1.requests._t_dc.east", Some("_t_"));
        assert_eq!(name, "app.requests");
        assert_eq!(tags, vec!["host=web1".to_string(), "dc=east".to_string()]);
    }

    #[test]
    fn name_without_tag_segments_is_unchanged() {
        let (name, tags) = extract_tags("app.requests", Some("_t_"));
        assert_eq!(name, "app.requests");
        assert!(tags.is_empty());
    }

    #[test]
    fn unset_or_empty_prefix_disables_extraction() {
        let (name, tags) = extract_tags("app._t_host.web1.requests", None);
        assert_eq!(name, "app._t_host.web1.requests");
        assert!(tags.is_empty());

        let (name, tags) = extract_tags("app._t_host.web1.requests", Some(""));
        assert_eq!(name, "app._t_host.web1.requests");
        assert!(tags.is_empty());
    }

    #[test]
    fn dangling_key_segment_is_dropped_silently() {
        let (name, tags) = extract_tags("app.requests._t_host", Some("_t_"));
        assert_eq!(name, "app.requests");
        assert!(tags.is_empty());
    }
}
