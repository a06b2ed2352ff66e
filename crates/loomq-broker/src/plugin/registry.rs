//! Compile-time plugin registry.
//!
//! The plugin set is closed: a fixed list of named constructors built once
//! at startup and read-only thereafter. There is no dynamic registration
//! and no plugin loading.

use super::Plugin;
use crate::builtins;

/// Constructor for one registered plugin.
pub type PluginCtor = fn() -> Box<dyn Plugin>;

/// A fixed mapping from plugin name to constructor.
pub struct PluginRegistry {
    entries: Vec<(&'static str, PluginCtor)>,
}

impl PluginRegistry {
    /// The compiled-in plugin set.
    pub fn builtin() -> Self {
        Self::new(vec![
            ("kvs", builtins::kvs::build as PluginCtor),
            ("sync", builtins::sync::build),
            ("barrier", builtins::barrier::build),
            ("api", builtins::api::build),
            ("live", builtins::live::build),
            ("log", builtins::log::build),
        ])
    }

    /// Build a registry from an explicit constructor list. Exists for the
    /// daemon's builtin set and for tests; the list never changes after
    /// construction.
    pub fn new(entries: Vec<(&'static str, PluginCtor)>) -> Self {
        Self { entries }
    }

    /// Exact-name lookup. Linear scan; the set is small and fixed.
    pub fn lookup(&self, name: &str) -> Option<PluginCtor> {
        self.entries
            .iter()
            .find(|(entry_name, _)| *entry_name == name)
            .map(|(_, ctor)| *ctor)
    }

    /// Registered names, in registration order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|(name, _)| *name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_set_has_six_plugins() {
        let registry = PluginRegistry::builtin();
        let names: Vec<_> = registry.names().collect();
        assert_eq!(names, ["kvs", "sync", "barrier", "api", "live", "log"]);
    }

    #[test]
    fn lookup_finds_registered_names() {
        let registry = PluginRegistry::builtin();
        for name in ["kvs", "sync", "barrier", "api", "live", "log"] {
            let ctor = registry.lookup(name).expect("registered");
            assert_eq!(ctor().name(), name);
        }
    }

    #[test]
    fn lookup_misses_unknown_names() {
        let registry = PluginRegistry::builtin();
        assert!(registry.lookup("frobsrv").is_none());
        assert!(registry.lookup("").is_none());
        // Exact match only.
        assert!(registry.lookup("kv").is_none());
    }
}
