//! Broker configuration schema.
//!
//! Loaded from a TOML file; every field has a default so a missing file or
//! an empty one yields a runnable broker. Unknown fields are ignored for
//! forward compatibility.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Endpoint service order in the default poll loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PollFairness {
    /// Fixed priority: upstream responses, then downstream requests, then
    /// events, then snoop traffic. A persistently ready endpoint can
    /// starve the ones below it.
    #[default]
    StrictPriority,
    /// Randomized service order across ready endpoints.
    Fair,
}

/// Top-level broker configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrokerConfig {
    /// Ordered list of plugin names to instantiate at startup. Each must
    /// resolve against the compiled-in registry; an unknown name aborts
    /// initialization of the whole set.
    #[serde(default = "default_plugins")]
    pub plugins: Vec<String>,

    /// Endpoint service order in the poll loop.
    #[serde(default)]
    pub poll_fairness: PollFairness,

    /// Interval of the sync plugin's pulse event, in milliseconds.
    #[serde(default = "default_sync_interval_ms")]
    pub sync_interval_ms: u64,

    /// Capacity of the event and snoop fan-out buses. Slow subscribers
    /// that fall further behind than this lose the oldest messages.
    #[serde(default = "default_bus_capacity")]
    pub bus_capacity: usize,
}

fn default_plugins() -> Vec<String> {
    ["kvs", "sync", "barrier", "api", "live", "log"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_sync_interval_ms() -> u64 {
    1000
}

fn default_bus_capacity() -> usize {
    1024
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            plugins: default_plugins(),
            poll_fairness: PollFairness::default(),
            sync_interval_ms: default_sync_interval_ms(),
            bus_capacity: default_bus_capacity(),
        }
    }
}

impl BrokerConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_name_all_six_plugins() {
        let cfg = BrokerConfig::default();
        assert_eq!(cfg.plugins, ["kvs", "sync", "barrier", "api", "live", "log"]);
        assert_eq!(cfg.poll_fairness, PollFairness::StrictPriority);
        assert_eq!(cfg.sync_interval_ms, 1000);
        assert_eq!(cfg.bus_capacity, 1024);
    }

    #[test]
    fn empty_toml_gives_defaults() {
        let cfg: BrokerConfig = toml::from_str("").unwrap();
        assert_eq!(cfg.plugins.len(), 6);
    }

    #[test]
    fn partial_toml_overrides() {
        let cfg: BrokerConfig = toml::from_str(
            r#"
            plugins = ["kvs", "log"]
            poll_fairness = "fair"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.plugins, ["kvs", "log"]);
        assert_eq!(cfg.poll_fairness, PollFairness::Fair);
        assert_eq!(cfg.sync_interval_ms, 1000);
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let cfg: BrokerConfig = toml::from_str("future_knob = 3\n").unwrap();
        assert_eq!(cfg.plugins.len(), 6);
    }

    #[test]
    fn load_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "plugins = [\"sync\"]\nsync_interval_ms = 250").unwrap();

        let cfg = BrokerConfig::load(file.path()).unwrap();
        assert_eq!(cfg.plugins, ["sync"]);
        assert_eq!(cfg.sync_interval_ms, 250);
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let err = BrokerConfig::load(Path::new("/nonexistent/loomq.toml")).unwrap_err();
        assert!(matches!(err, crate::error::BrokerError::Io(_)));
    }
}
