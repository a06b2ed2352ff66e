//! Shared routing table.
//!
//! Records which plugin owns which logical name and whether the name is
//! reachable from outside the broker. Mutated only by the lifecycle
//! manager (insert at creation, remove at teardown); read concurrently by
//! message routing and by plugins.

use std::collections::HashMap;

use parking_lot::RwLock;

/// Visibility metadata for a routed name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RouteFlags {
    /// Private names are reachable only through the broker, never directly
    /// by external API clients.
    pub private: bool,
}

/// One routing entry.
#[derive(Debug, Clone)]
pub struct RouteEntry {
    /// The plugin that services this name.
    pub owner: String,
    /// Optional parent name for hierarchical routes.
    pub parent: Option<String>,
    /// Visibility flags.
    pub flags: RouteFlags,
}

/// Name-to-owner routing table with exclusive-writer, concurrent-reader
/// access.
#[derive(Default)]
pub struct RouteTable {
    entries: RwLock<HashMap<String, RouteEntry>>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `owner` services `name`.
    pub fn add(&self, name: &str, owner: &str, parent: Option<&str>, flags: RouteFlags) {
        self.entries.write().insert(
            name.to_owned(),
            RouteEntry {
                owner: owner.to_owned(),
                parent: parent.map(str::to_owned),
                flags,
            },
        );
    }

    /// Remove `name` if it is owned by `owner`. Returns whether an entry
    /// was removed.
    pub fn remove(&self, name: &str, owner: &str) -> bool {
        let mut entries = self.entries.write();
        match entries.get(name) {
            Some(entry) if entry.owner == owner => {
                entries.remove(name);
                true
            }
            _ => false,
        }
    }

    /// Look up the entry for `name`.
    pub fn lookup(&self, name: &str) -> Option<RouteEntry> {
        self.entries.read().get(name).cloned()
    }

    /// Currently routed names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.entries.read().keys().cloned().collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_then_lookup() {
        let table = RouteTable::new();
        table.add("kvs", "kvs", None, RouteFlags { private: true });

        let entry = table.lookup("kvs").expect("entry");
        assert_eq!(entry.owner, "kvs");
        assert!(entry.parent.is_none());
        assert!(entry.flags.private);
    }

    #[test]
    fn remove_requires_matching_owner() {
        let table = RouteTable::new();
        table.add("kvs", "kvs", None, RouteFlags::default());

        assert!(!table.remove("kvs", "somebody-else"));
        assert!(table.lookup("kvs").is_some());

        assert!(table.remove("kvs", "kvs"));
        assert!(table.lookup("kvs").is_none());
        assert!(!table.remove("kvs", "kvs"));
    }

    #[test]
    fn names_are_sorted() {
        let table = RouteTable::new();
        table.add("sync", "sync", None, RouteFlags::default());
        table.add("barrier", "barrier", None, RouteFlags::default());
        table.add("kvs", "kvs", None, RouteFlags::default());

        assert_eq!(table.names(), ["barrier", "kvs", "sync"]);
    }
}
