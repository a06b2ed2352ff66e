//! Plugin capability surface.
//!
//! A plugin is one broker service module running on its own worker. The
//! [`Plugin`] trait exposes the optional lifecycle hooks; everything a
//! hook can do at runtime goes through its [`PluginContext`].

pub mod context;
pub mod registry;
pub(crate) mod runtime;

pub use context::{PluginContext, PluginStats};
pub use registry::{PluginCtor, PluginRegistry};

use async_trait::async_trait;

use loomq_types::error::Result;
use loomq_types::{Envelope, MessageKind};

/// Outcome of handing an envelope to a plugin's receive hook.
///
/// The hook either takes ownership of the envelope or hands it back, so
/// the runtime's fallback path never depends on the hook following an
/// implicit do-not-free convention.
pub enum Dispatch {
    /// The hook took ownership; the runtime does nothing further.
    Consumed,
    /// The hook did not recognize the tag. The runtime answers a returned
    /// REQUEST with a "not implemented" error reply and drops anything
    /// else.
    NotRecognized(Envelope),
}

/// One broker service module.
///
/// Every hook is optional: the defaults do nothing and recognize no tags,
/// so a unit struct is already a valid (if silent) plugin. Hooks run
/// strictly sequentially on the plugin's own worker; no two hooks of the
/// same plugin ever run concurrently.
#[async_trait]
pub trait Plugin: Send {
    /// Unique registry name. Also the prefix of the plugin's reserved
    /// `<name>.ping` and `<name>.stats` tags, which the runtime answers
    /// itself and never delivers to [`recv`](Self::recv).
    fn name(&self) -> &'static str;

    /// Runs on the worker before any polling starts. All five endpoints
    /// are already connected when this is called.
    async fn init(&mut self, _ctx: &mut PluginContext) -> Result<()> {
        Ok(())
    }

    /// When true, [`poll`](Self::poll) replaces the default loop entirely;
    /// the runtime then performs no multiplexing, interception, or
    /// fallback on this plugin's behalf.
    fn takes_over_poll(&self) -> bool {
        false
    }

    /// Custom poll loop. Only invoked when
    /// [`takes_over_poll`](Self::takes_over_poll) is true; expected to run
    /// until [`PluginContext::cancelled`] resolves.
    async fn poll(&mut self, _ctx: &mut PluginContext) -> Result<()> {
        Ok(())
    }

    /// Handle one classified envelope.
    async fn recv(
        &mut self,
        _ctx: &mut PluginContext,
        envelope: Envelope,
        _kind: MessageKind,
    ) -> Result<Dispatch> {
        Ok(Dispatch::NotRecognized(envelope))
    }

    /// Fires each time the configured timeout interval fully elapses.
    /// Never fires while the timeout is disabled (the default).
    async fn on_timeout(&mut self, _ctx: &mut PluginContext) -> Result<()> {
        Ok(())
    }

    /// Runs on the worker after the loop exits, before the endpoints are
    /// torn down.
    async fn fini(&mut self, _ctx: &mut PluginContext) {}
}
