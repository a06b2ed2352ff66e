//! Periodic pulse plugin.
//!
//! Arms the poll-loop timeout from `sync_interval_ms` and publishes a
//! `sync.pulse` event each time it fires. Other plugins subscribe to the
//! pulse to schedule their own periodic work.

use std::time::Duration;

use async_trait::async_trait;

use loomq_types::error::Result;

use crate::plugin::{Plugin, PluginContext};

struct SyncPlugin;

pub fn build() -> Box<dyn Plugin> {
    Box::new(SyncPlugin)
}

#[async_trait]
impl Plugin for SyncPlugin {
    fn name(&self) -> &'static str {
        "sync"
    }

    async fn init(&mut self, ctx: &mut PluginContext) -> Result<()> {
        ctx.set_timeout(Some(Duration::from_millis(ctx.config.sync_interval_ms)));
        Ok(())
    }

    async fn on_timeout(&mut self, ctx: &mut PluginContext) -> Result<()> {
        ctx.send_event("sync.pulse")
    }
}
