//! Wildcard pattern matching and the per-event match cache

use crate::listener::ListenerEntry;
use compact_str::CompactString;
use std::collections::HashMap;

/// Token that turns a listener pattern into a wildcard.
pub const WILDCARD: char = '*';

/// Pattern matching every event.
pub const GLOBAL_WILDCARD: &str = "*";

pub fn is_wildcard(pattern: &str) -> bool {
    pattern.contains(WILDCARD)
}

pub fn is_global(pattern: &str) -> bool {
    pattern == GLOBAL_WILDCARD
}

/// Match `candidate` against `pattern`.
///
/// Without a `*` the strings must be equal. With one `*`, the candidate must
/// start with the text before it and end with the text after it; either side
/// may be empty. Further `*` tokens each match any run of characters.
pub fn matches(pattern: &str, candidate: &str) -> bool {
    if !is_wildcard(pattern) {
        return pattern == candidate;
    }

    let mut segments = pattern.split(WILDCARD);
    let prefix = segments.next().unwrap_or_default();
    let Some(mut rest) = candidate.strip_prefix(prefix) else {
        return false;
    };

    let inner: Vec<&str> = segments.collect();
    let Some((suffix, middle)) = inner.split_last() else {
        return true;
    };

    for segment in middle {
        match rest.find(segment) {
            Some(at) => rest = &rest[at + segment.len()..],
            None => return false,
        }
    }

    rest.ends_with(suffix)
}

/// Wildcard listeners resolved per concrete event name.
///
/// Entries are only ever dropped all at once; any registry mutation clears
/// the whole cache.
#[derive(Debug)]
pub struct WildcardCache {
    enabled: bool,
    entries: HashMap<CompactString, Vec<ListenerEntry>>,
}

impl WildcardCache {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            entries: HashMap::new(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Vec<ListenerEntry>> {
        self.entries.get(name)
    }

    pub fn insert(&mut self, name: &str, listeners: Vec<ListenerEntry>) {
        if self.enabled {
            self.entries.insert(CompactString::new(name), listeners);
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for WildcardCache {
    fn default() -> Self {
        Self::new(true)
    }
}
