//! In-memory key/value store plugin.
//!
//! Handles `kvs.put` (`{"key": K, "val": V}`) and `kvs.get`
//! (`{"key": K}`, replying `{"key": K, "val": V | null}`).

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::{json, Value};

use loomq_types::error::Result;
use loomq_types::{Envelope, MessageKind, EPROTO};

use crate::plugin::{Dispatch, Plugin, PluginContext};

struct KvsPlugin {
    store: HashMap<String, Value>,
}

pub fn build() -> Box<dyn Plugin> {
    Box::new(KvsPlugin {
        store: HashMap::new(),
    })
}

#[async_trait]
impl Plugin for KvsPlugin {
    fn name(&self) -> &'static str {
        "kvs"
    }

    async fn recv(
        &mut self,
        ctx: &mut PluginContext,
        env: Envelope,
        kind: MessageKind,
    ) -> Result<Dispatch> {
        if kind != MessageKind::Request {
            return Ok(Dispatch::NotRecognized(env));
        }

        if env.matches("kvs.put") {
            let key = body_str(&env, "key");
            let val = env.body.as_ref().and_then(|b| b.get("val")).cloned();
            match (key, val) {
                (Some(key), Some(val)) => {
                    self.store.insert(key, val);
                    ctx.send_response(env, json!({}))?;
                }
                _ => ctx.send_response_errnum(env, EPROTO)?,
            }
            return Ok(Dispatch::Consumed);
        }

        if env.matches("kvs.get") {
            match body_str(&env, "key") {
                Some(key) => {
                    let val = self.store.get(&key).cloned().unwrap_or(Value::Null);
                    ctx.send_response(env, json!({ "key": key, "val": val }))?;
                }
                None => ctx.send_response_errnum(env, EPROTO)?,
            }
            return Ok(Dispatch::Consumed);
        }

        Ok(Dispatch::NotRecognized(env))
    }
}

fn body_str(env: &Envelope, field: &str) -> Option<String> {
    env.body
        .as_ref()?
        .get(field)?
        .as_str()
        .map(str::to_owned)
}
