//! Per-plugin runtime state and send helpers.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;

use loomq_types::codec;
use loomq_types::config::BrokerConfig;
use loomq_types::error::{BrokerError, Result};
use loomq_types::Envelope;

use crate::server::Server;
use crate::switchboard::Endpoints;

/// Monotonic per-plugin traffic counters. Incremented only on the send or
/// receive path that actually transferred a frame stack; snoop traffic is
/// never counted.
#[derive(Debug, Default, Clone, Copy)]
pub struct PluginStats {
    pub upreq_sent: u64,
    pub upreq_recv: u64,
    pub dnreq_sent: u64,
    pub dnreq_recv: u64,
    pub event_sent: u64,
    pub event_recv: u64,
}

impl PluginStats {
    /// Attach the six counters to `body` as named integer fields, using
    /// the wire names the stats reply is specified with.
    pub(crate) fn attach_to(&self, body: &mut Value) {
        body["upreq_send_count"] = json!(self.upreq_sent);
        body["upreq_recv_count"] = json!(self.upreq_recv);
        body["dnreq_send_count"] = json!(self.dnreq_sent);
        body["dnreq_recv_count"] = json!(self.dnreq_recv);
        body["event_send_count"] = json!(self.event_sent);
        body["event_recv_count"] = json!(self.event_recv);
    }
}

/// Runtime state of one plugin instance: its five endpoints, statistics,
/// timeout, and references to the shared server and configuration.
///
/// Created by the lifecycle manager before the worker starts and owned by
/// the worker until it exits; the endpoints close when the worker drops it.
pub struct PluginContext {
    name: String,
    /// Shared broker state.
    pub server: Arc<Server>,
    /// Shared configuration.
    pub config: Arc<BrokerConfig>,
    pub(crate) endpoints: Endpoints,
    pub(crate) stats: PluginStats,
    timeout: Option<Duration>,
    cancel: CancellationToken,
}

impl PluginContext {
    pub(crate) fn new(
        name: &str,
        server: Arc<Server>,
        config: Arc<BrokerConfig>,
        endpoints: Endpoints,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            name: name.to_owned(),
            server,
            config,
            endpoints,
            stats: PluginStats::default(),
            timeout: None,
            cancel,
        }
    }

    /// The plugin's registry name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current counter values.
    pub fn stats(&self) -> &PluginStats {
        &self.stats
    }

    /// Arm or disarm the poll-loop timeout. Disabled by default.
    pub fn set_timeout(&mut self, timeout: Option<Duration>) {
        self.timeout = timeout;
    }

    /// The configured timeout, if armed.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Resolves when the plugin has been asked to stop. Custom poll loops
    /// must select on this.
    pub async fn cancelled(&self) {
        self.cancel.cancelled().await
    }

    pub(crate) fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Transfer an already-built request envelope on the upstream-request
    /// endpoint.
    pub fn send_request_raw(&mut self, env: &Envelope) -> Result<()> {
        self.endpoints
            .upreq_tx
            .send(codec::encode(env))
            .map_err(|_| BrokerError::ChannelClosed { endpoint: "upreq" })?;
        self.stats.upreq_sent += 1;
        Ok(())
    }

    /// Transfer an already-built response envelope on the
    /// downstream-request endpoint.
    pub fn send_response_raw(&mut self, env: &Envelope) -> Result<()> {
        self.endpoints
            .dnreq_tx
            .send(codec::encode(env))
            .map_err(|_| BrokerError::ChannelClosed { endpoint: "dnreq" })?;
        self.stats.dnreq_sent += 1;
        Ok(())
    }

    /// Publish an already-built event envelope. Publishing with no
    /// subscribers is not an error; the sent counter moves only when the
    /// bus actually took the frames.
    pub fn send_event_raw(&mut self, env: &Envelope) -> Result<()> {
        if self.endpoints.event_tx.send(codec::encode(env)).is_ok() {
            self.stats.event_sent += 1;
        }
        Ok(())
    }

    /// Encode and send a request toward the broker core. An empty JSON
    /// object is substituted when no body is given; the route stack is
    /// left empty for the broker to stamp.
    pub fn send_request(&mut self, body: Option<Value>, tag: &str) -> Result<()> {
        let env = Envelope::new(tag, Some(body.unwrap_or_else(|| json!({}))));
        self.send_request_raw(&env)
    }

    /// Mutate `req` into a success reply carrying `body` and send it back
    /// along the route it accumulated.
    pub fn send_response(&mut self, mut req: Envelope, body: Value) -> Result<()> {
        req.reply_with(body);
        self.send_response_raw(&req)
    }

    /// Mutate `req` into an error reply carrying `errnum` and send it back
    /// along the route it accumulated.
    pub fn send_response_errnum(&mut self, mut req: Envelope, errnum: i32) -> Result<()> {
        req.reply_errnum(errnum);
        self.send_response_raw(&req)
    }

    /// Encode and publish a bodyless event.
    pub fn send_event(&mut self, tag: &str) -> Result<()> {
        let env = Envelope::new(tag, None);
        self.send_event_raw(&env)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::sync::{broadcast, mpsc};

    #[test]
    fn event_send_without_subscribers_is_not_counted() {
        let config = Arc::new(BrokerConfig::default());
        let server = Server::new(&config);

        // Hand-built endpoints whose event bus has no subscriber at all;
        // the switchboard never produces this shape because a plugin is
        // always subscribed to its own bus.
        let (upreq_tx, upreq_rx) = mpsc::unbounded_channel();
        let (dnreq_tx, dnreq_rx) = mpsc::unbounded_channel();
        let (event_tx, dead_rx) = broadcast::channel(4);
        drop(dead_rx);
        let (_other_bus, event_rx) = broadcast::channel(4);
        let (_snoop_bus, snoop_rx) = broadcast::channel(4);
        let endpoints = Endpoints {
            upreq_tx,
            upreq_rx,
            dnreq_rx,
            dnreq_tx,
            event_rx,
            event_tx,
            snoop_rx,
        };

        let mut ctx = PluginContext::new(
            "t",
            server,
            config,
            endpoints,
            CancellationToken::new(),
        );

        ctx.send_event("t.ev").expect("publish is infallible");
        assert_eq!(ctx.stats().event_sent, 0);
    }

    #[test]
    fn stats_attach_uses_wire_field_names() {
        let stats = PluginStats {
            upreq_sent: 1,
            upreq_recv: 2,
            dnreq_sent: 3,
            dnreq_recv: 4,
            event_sent: 5,
            event_recv: 6,
        };
        let mut body = json!({"keep": "me"});
        stats.attach_to(&mut body);

        assert_eq!(body["keep"], "me");
        assert_eq!(body["upreq_send_count"], 1);
        assert_eq!(body["upreq_recv_count"], 2);
        assert_eq!(body["dnreq_send_count"], 3);
        assert_eq!(body["dnreq_recv_count"], 4);
        assert_eq!(body["event_send_count"], 5);
        assert_eq!(body["event_recv_count"], 6);
    }
}
