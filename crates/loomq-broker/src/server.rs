//! Plugin lifecycle manager.
//!
//! Owns the switchboard, the routing table, and the handle map of running
//! plugin workers. Creation is strictly ordered: the five endpoints are
//! opened and the route registered before the worker task is spawned, so a
//! worker never observes its own half-built setup. Teardown reverses it:
//! the handle leaves the map, the route is withdrawn, the worker is asked
//! to stop, and the join happens last. The endpoints close when the worker
//! drops its context.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use loomq_types::config::BrokerConfig;
use loomq_types::error::{BrokerError, Result};

use crate::plugin::{runtime, PluginContext, PluginRegistry};
use crate::route::{RouteFlags, RouteTable};
use crate::switchboard::Switchboard;

/// A running plugin worker, as seen by the lifecycle manager.
struct PluginHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

/// Shared broker state: the transport, the routing table, and the set of
/// running plugins.
pub struct Server {
    pub switchboard: Switchboard,
    pub routes: RouteTable,
    plugins: Mutex<HashMap<String, PluginHandle>>,
}

impl Server {
    pub fn new(config: &BrokerConfig) -> Arc<Self> {
        Arc::new(Self {
            switchboard: Switchboard::new(config.bus_capacity),
            routes: RouteTable::new(),
            plugins: Mutex::new(HashMap::new()),
        })
    }

    /// Names of the plugins currently running, sorted.
    pub fn plugin_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.plugins.lock().keys().cloned().collect();
        names.sort();
        names
    }

    /// Resolve `name` in the registry, open its endpoints, register its
    /// route, and spawn its worker. Fails without side effects if the name
    /// is unknown or already running.
    pub fn create_plugin(
        self: &Arc<Self>,
        registry: &PluginRegistry,
        config: &Arc<BrokerConfig>,
        name: &str,
    ) -> Result<()> {
        let ctor = registry
            .lookup(name)
            .ok_or_else(|| BrokerError::UnknownPlugin {
                name: name.to_owned(),
            })?;

        let mut plugins = self.plugins.lock();
        if plugins.contains_key(name) {
            return Err(BrokerError::ConfigInvalid {
                reason: format!("plugin {name} configured twice"),
            });
        }

        let plugin = ctor();
        let endpoints = self.switchboard.connect(name);
        self.routes
            .add(name, name, None, RouteFlags { private: true });

        let cancel = CancellationToken::new();
        let ctx = PluginContext::new(
            name,
            Arc::clone(self),
            Arc::clone(config),
            endpoints,
            cancel.clone(),
        );
        let task = tokio::spawn(runtime::run(plugin, ctx));
        plugins.insert(name.to_owned(), PluginHandle { cancel, task });

        info!(plugin = %name, "plugin started");
        Ok(())
    }

    /// Stop and join the worker for `name`. Teardown order is fixed: handle
    /// out of the map, route withdrawn, worker cancelled, then joined.
    /// Returns whether a plugin by that name was running.
    pub async fn destroy_plugin(&self, name: &str) -> bool {
        let handle = match self.plugins.lock().remove(name) {
            Some(handle) => handle,
            None => return false,
        };

        self.routes.remove(name, name);
        handle.cancel.cancel();
        if let Err(e) = handle.task.await {
            error!(plugin = %name, error = %e, "plugin task join failed");
        }
        info!(plugin = %name, "plugin stopped");
        true
    }

    /// Start every plugin named in the configuration, in order. On the
    /// first failure, every plugin started so far is torn down again and
    /// the error is returned.
    pub async fn init_plugins(
        self: &Arc<Self>,
        registry: &PluginRegistry,
        config: &Arc<BrokerConfig>,
    ) -> Result<()> {
        for name in &config.plugins {
            if let Err(e) = self.create_plugin(registry, config, name) {
                error!(plugin = %name, error = %e, "plugin startup failed");
                self.shutdown().await;
                return Err(e);
            }
        }
        Ok(())
    }

    /// Tear down every running plugin.
    pub async fn shutdown(&self) {
        for name in self.plugin_names() {
            self.destroy_plugin(&name).await;
        }
    }
}
