//! # loomq-broker
//!
//! The plugin execution substrate of the loomq message broker. A fixed set
//! of named service modules ("plugins") run as independently cancellable
//! workers that talk to the broker core and to each other exclusively
//! through typed message channels.
//!
//! - **[`switchboard`]** -- in-process transport: five endpoints per plugin
//! - **[`route`]** -- shared routing table mapping names to owners
//! - **[`plugin`]** -- the [`Plugin`] trait, registry, context, and the
//!   default poll-loop runtime
//! - **[`builtins`]** -- the compiled-in plugin set
//! - **[`server`]** -- lifecycle management: create, run, and tear down the
//!   configured plugin set

pub mod builtins;
pub mod plugin;
pub mod route;
pub mod server;
pub mod switchboard;

pub use plugin::{Dispatch, Plugin, PluginContext, PluginRegistry, PluginStats};
pub use server::Server;
