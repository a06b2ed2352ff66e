//! Log sink plugin.
//!
//! Handles `log.msg` requests (`{"text": T}`) by emitting the text into
//! the broker's own tracing output, and observes event traffic at debug
//! level.

use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, info};

use loomq_types::error::Result;
use loomq_types::{Envelope, MessageKind, EPROTO};

use crate::plugin::{Dispatch, Plugin, PluginContext};

struct LogPlugin;

pub fn build() -> Box<dyn Plugin> {
    Box::new(LogPlugin)
}

#[async_trait]
impl Plugin for LogPlugin {
    fn name(&self) -> &'static str {
        "log"
    }

    async fn recv(
        &mut self,
        ctx: &mut PluginContext,
        env: Envelope,
        kind: MessageKind,
    ) -> Result<Dispatch> {
        match kind {
            MessageKind::Request if env.matches("log.msg") => {
                let text = env
                    .body
                    .as_ref()
                    .and_then(|b| b.get("text"))
                    .and_then(|t| t.as_str())
                    .map(str::to_owned);
                match text {
                    Some(text) => {
                        info!(target: "loomq::log", source = %env.route_str(), "{text}");
                        ctx.send_response(env, json!({}))?;
                    }
                    None => ctx.send_response_errnum(env, EPROTO)?,
                }
                Ok(Dispatch::Consumed)
            }
            MessageKind::Event => {
                debug!(target: "loomq::log", tag = %env.tag, "event observed");
                Ok(Dispatch::Consumed)
            }
            _ => Ok(Dispatch::NotRecognized(env)),
        }
    }
}
