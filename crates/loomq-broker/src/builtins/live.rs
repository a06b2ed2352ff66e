//! Liveness query plugin.
//!
//! Handles `live.query`, replying with the names currently present in the
//! routing table.

use async_trait::async_trait;
use serde_json::json;

use loomq_types::error::Result;
use loomq_types::{Envelope, MessageKind};

use crate::plugin::{Dispatch, Plugin, PluginContext};

struct LivePlugin;

pub fn build() -> Box<dyn Plugin> {
    Box::new(LivePlugin)
}

#[async_trait]
impl Plugin for LivePlugin {
    fn name(&self) -> &'static str {
        "live"
    }

    async fn recv(
        &mut self,
        ctx: &mut PluginContext,
        env: Envelope,
        kind: MessageKind,
    ) -> Result<Dispatch> {
        if kind != MessageKind::Request || !env.matches("live.query") {
            return Ok(Dispatch::NotRecognized(env));
        }

        let up = ctx.server.routes.names();
        ctx.send_response(env, json!({ "up": up }))?;
        Ok(Dispatch::Consumed)
    }
}
