//! Listener storage keyed by event name, class, interface or wildcard pattern

use crate::listener::{ListenerEntry, ListenerSpec};
use crate::wildcard::{self, WildcardCache};
use compact_str::CompactString;
use std::collections::HashMap;

/// Ordered listener storage.
///
/// Exact listeners live in a map keyed by pattern. Wildcard listeners keep
/// the order in which their patterns were first registered, which is the
/// order they fire in after the exact listeners. The global `*` pattern
/// always fires last.
#[derive(Debug, Default)]
pub struct ListenerRegistry {
    listeners: HashMap<CompactString, Vec<ListenerEntry>>,
    wildcards: Vec<(CompactString, Vec<ListenerEntry>)>,
    cache: WildcardCache,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry whose wildcard match cache is switched on or off
    pub fn with_wildcard_cache(enabled: bool) -> Self {
        Self {
            cache: WildcardCache::new(enabled),
            ..Self::default()
        }
    }

    /// Append a listener for `pattern`. Duplicates are kept and fire once each.
    pub fn listen(&mut self, pattern: &str, listener: ListenerSpec) {
        let entry = ListenerEntry::new(pattern, listener);

        if wildcard::is_wildcard(pattern) {
            match self.wildcards.iter_mut().find(|(p, _)| p.as_str() == pattern) {
                Some((_, entries)) => entries.push(entry),
                None => self
                    .wildcards
                    .push((CompactString::new(pattern), vec![entry])),
            }
        } else {
            self.listeners
                .entry(CompactString::new(pattern))
                .or_default()
                .push(entry);
        }

        self.cache.clear();
    }

    /// Remove every listener registered under exactly `pattern`
    pub fn forget(&mut self, pattern: &str) {
        if wildcard::is_wildcard(pattern) {
            self.wildcards.retain(|(p, _)| p.as_str() != pattern);
        } else {
            self.listeners.remove(pattern);
        }

        self.cache.clear();
    }

    /// Listeners for a single name: direct, then matching wildcards, then global
    pub fn get_listeners(&mut self, name: &str) -> Vec<ListenerEntry> {
        self.listeners_for_tags(name, &[])
    }

    /// Listeners for an event carrying several lookup keys.
    ///
    /// `name` is the primary key. Every entry in `tags` that differs from it is
    /// an additional direct key (an interface the event declares). Wildcards
    /// are matched against `name` only.
    pub fn listeners_for_tags(&mut self, name: &str, tags: &[&str]) -> Vec<ListenerEntry> {
        let mut resolved = self.listeners.get(name).cloned().unwrap_or_default();

        for tag in tags.iter().filter(|tag| **tag != name) {
            if let Some(entries) = self.listeners.get(*tag) {
                resolved.extend(entries.iter().cloned());
            }
        }

        resolved.extend(self.wildcard_listeners(name));
        resolved
    }

    /// Wildcard listeners matching `name`, from the cache when possible
    fn wildcard_listeners(&mut self, name: &str) -> Vec<ListenerEntry> {
        if let Some(cached) = self.cache.get(name) {
            return cached.clone();
        }

        let (global, scoped): (Vec<_>, Vec<_>) = self
            .wildcards
            .iter()
            .filter(|(pattern, _)| wildcard::matches(pattern, name))
            .partition(|(pattern, _)| wildcard::is_global(pattern));

        let resolved: Vec<ListenerEntry> = scoped
            .into_iter()
            .chain(global)
            .flat_map(|(_, entries)| entries.iter().cloned())
            .collect();

        self.cache.insert(name, resolved.clone());
        resolved
    }

    /// True when anything would fire for `name`
    pub fn has_listeners(&self, name: &str) -> bool {
        self.listeners.contains_key(name)
            || self.wildcards.iter().any(|(pattern, _)| pattern.as_str() == name)
            || self.has_wildcard_listeners(name)
    }

    /// True when any registered wildcard pattern matches `name`
    pub fn has_wildcard_listeners(&self, name: &str) -> bool {
        self.wildcards
            .iter()
            .any(|(pattern, _)| wildcard::matches(pattern, name))
    }

    /// Every registered listener, grouped by the pattern it was registered under
    pub fn raw_listeners(&self) -> HashMap<String, Vec<ListenerEntry>> {
        self.listeners
            .iter()
            .chain(self.wildcards.iter().map(|(pattern, entries)| (pattern, entries)))
            .map(|(pattern, entries)| (pattern.to_string(), entries.clone()))
            .collect()
    }

    /// Total number of registered listeners
    pub fn len(&self) -> usize {
        self.listeners.values().map(Vec::len).sum::<usize>()
            + self
                .wildcards
                .iter()
                .map(|(_, entries)| entries.len())
                .sum::<usize>()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of concrete names with cached wildcard matches
    pub fn cached_names(&self) -> usize {
        self.cache.len()
    }
}
