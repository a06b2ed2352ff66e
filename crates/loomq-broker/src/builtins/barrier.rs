//! Barrier counting plugin.
//!
//! Handles `barrier.enter` (`{"name": N}`), counting entries per barrier
//! name and replying with the count so far.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::json;

use loomq_types::error::Result;
use loomq_types::{Envelope, MessageKind, EPROTO};

use crate::plugin::{Dispatch, Plugin, PluginContext};

struct BarrierPlugin {
    counts: HashMap<String, u64>,
}

pub fn build() -> Box<dyn Plugin> {
    Box::new(BarrierPlugin {
        counts: HashMap::new(),
    })
}

#[async_trait]
impl Plugin for BarrierPlugin {
    fn name(&self) -> &'static str {
        "barrier"
    }

    async fn recv(
        &mut self,
        ctx: &mut PluginContext,
        env: Envelope,
        kind: MessageKind,
    ) -> Result<Dispatch> {
        if kind != MessageKind::Request || !env.matches("barrier.enter") {
            return Ok(Dispatch::NotRecognized(env));
        }

        let name = env
            .body
            .as_ref()
            .and_then(|b| b.get("name"))
            .and_then(|n| n.as_str())
            .map(str::to_owned);

        match name {
            Some(name) => {
                let count = self.counts.entry(name.clone()).or_insert(0);
                *count += 1;
                let count = *count;
                ctx.send_response(env, json!({ "name": name, "count": count }))?;
            }
            None => ctx.send_response_errnum(env, EPROTO)?,
        }
        Ok(Dispatch::Consumed)
    }
}
