//! Default plugin poll loop.
//!
//! Each worker runs init, then either the plugin's own poll loop or the
//! default loop below, then fini. The default loop multiplexes the five
//! endpoints plus the cancellation token and an optional timeout deadline,
//! pulls exactly one message per iteration, classifies it by the endpoint
//! it arrived on, intercepts the reserved `<name>.ping` / `<name>.stats`
//! requests, and falls back to a "not implemented" error reply for any
//! request the plugin does not recognize.

use tokio::sync::broadcast;
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use loomq_types::codec::{self, Frames};
use loomq_types::config::PollFairness;
use loomq_types::error::{BrokerError, Result};
use loomq_types::{Envelope, MessageKind, ENOSYS};

use super::{Dispatch, Plugin, PluginContext};

/// Worker entry point.
pub(crate) async fn run(mut plugin: Box<dyn Plugin>, mut ctx: PluginContext) {
    let name = ctx.name().to_owned();

    if let Err(e) = plugin.init(&mut ctx).await {
        error!(plugin = %name, error = %e, "plugin init failed");
        return;
    }

    let result = if plugin.takes_over_poll() {
        debug!(plugin = %name, "entering custom poll loop");
        plugin.poll(&mut ctx).await
    } else {
        poll_loop(plugin.as_mut(), &mut ctx).await
    };

    if let Err(e) = result {
        error!(plugin = %name, error = %e, "plugin loop exited with error");
    }

    plugin.fini(&mut ctx).await;
    debug!(plugin = %name, "plugin stopped");
}

/// One wakeup of the multiplexed wait.
enum Wake {
    /// The cancellation token fired.
    Cancelled,
    /// The timeout deadline passed with no traffic.
    Deadline,
    /// One frame stack arrived, classified by its endpoint.
    Frames(Frames, MessageKind),
    /// A fan-out subscriber fell behind and dropped messages.
    Lagged(&'static str, u64),
    /// A point-to-point peer is gone.
    Closed(&'static str),
}

async fn poll_loop(plugin: &mut dyn Plugin, ctx: &mut PluginContext) -> Result<()> {
    let cancel = ctx.cancel_token();
    let ping_tag = format!("{}.ping", ctx.name());
    let stats_tag = format!("{}.stats", ctx.name());
    let mut deadline: Option<Instant> = None;

    loop {
        // Timeout bookkeeping: arm on entry to a cycle, fire and re-arm
        // once the full interval has elapsed. An early wakeup only spends
        // budget; the deadline itself does not move.
        match ctx.timeout() {
            Some(interval) => {
                let armed = *deadline.get_or_insert_with(|| Instant::now() + interval);
                if Instant::now() >= armed {
                    plugin.on_timeout(ctx).await?;
                    deadline = None;
                    continue;
                }
            }
            None => deadline = None,
        }

        match wait(ctx, &cancel, deadline).await {
            Wake::Cancelled => return Ok(()),
            Wake::Deadline => {
                plugin.on_timeout(ctx).await?;
                deadline = None;
            }
            Wake::Lagged(endpoint, missed) => {
                warn!(plugin = %ctx.name(), endpoint, missed, "fan-out subscriber lagged");
            }
            Wake::Closed(endpoint) => {
                return Err(BrokerError::ChannelClosed { endpoint });
            }
            Wake::Frames(frames, kind) => {
                match kind {
                    MessageKind::Response => ctx.stats.upreq_recv += 1,
                    MessageKind::Request => ctx.stats.dnreq_recv += 1,
                    MessageKind::Event => ctx.stats.event_recv += 1,
                    MessageKind::Snoop => {}
                }

                let env = match codec::decode(&frames) {
                    Ok(env) => env,
                    Err(e) => {
                        warn!(
                            plugin = %ctx.name(),
                            kind = kind.as_str(),
                            error = %e,
                            "dropping malformed envelope"
                        );
                        continue;
                    }
                };

                // Reserved administrative tags never reach the recv hook.
                if kind == MessageKind::Request && env.matches(&ping_tag) {
                    handle_ping(ctx, env)?;
                    continue;
                }
                if kind == MessageKind::Request && env.matches(&stats_tag) {
                    handle_stats(ctx, env)?;
                    continue;
                }

                match plugin.recv(ctx, env, kind).await? {
                    Dispatch::Consumed => {}
                    Dispatch::NotRecognized(env) => {
                        if kind == MessageKind::Request {
                            debug!(
                                plugin = %ctx.name(),
                                tag = %env.tag,
                                "unrecognized request tag"
                            );
                            ctx.send_response_errnum(env, ENOSYS)?;
                        }
                    }
                }
            }
        }
    }
}

/// Wait on the cancellation token, all five endpoints, and the timeout
/// deadline; return the first wakeup. Under strict priority the endpoints
/// are serviced in the fixed order upreq > dnreq > event > snoop, so a
/// persistently ready endpoint can starve the ones below it.
async fn wait(
    ctx: &mut PluginContext,
    cancel: &CancellationToken,
    deadline: Option<Instant>,
) -> Wake {
    let fairness = ctx.config.poll_fairness;
    let ep = &mut ctx.endpoints;
    let expire = async move {
        match deadline {
            Some(d) => sleep_until(d).await,
            None => std::future::pending::<()>().await,
        }
    };

    match fairness {
        PollFairness::StrictPriority => {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => Wake::Cancelled,
                r = ep.upreq_rx.recv() => p2p(r, MessageKind::Response, "upreq"),
                r = ep.dnreq_rx.recv() => p2p(r, MessageKind::Request, "dnreq"),
                r = ep.event_rx.recv() => bus(r, MessageKind::Event, "event"),
                r = ep.snoop_rx.recv() => bus(r, MessageKind::Snoop, "snoop"),
                _ = expire => Wake::Deadline,
            }
        }
        PollFairness::Fair => {
            tokio::select! {
                _ = cancel.cancelled() => Wake::Cancelled,
                r = ep.upreq_rx.recv() => p2p(r, MessageKind::Response, "upreq"),
                r = ep.dnreq_rx.recv() => p2p(r, MessageKind::Request, "dnreq"),
                r = ep.event_rx.recv() => bus(r, MessageKind::Event, "event"),
                r = ep.snoop_rx.recv() => bus(r, MessageKind::Snoop, "snoop"),
                _ = expire => Wake::Deadline,
            }
        }
    }
}

fn p2p(received: Option<Frames>, kind: MessageKind, endpoint: &'static str) -> Wake {
    match received {
        Some(frames) => Wake::Frames(frames, kind),
        None => Wake::Closed(endpoint),
    }
}

fn bus(
    received: std::result::Result<Frames, broadcast::error::RecvError>,
    kind: MessageKind,
    endpoint: &'static str,
) -> Wake {
    match received {
        Ok(frames) => Wake::Frames(frames, kind),
        Err(broadcast::error::RecvError::Lagged(missed)) => Wake::Lagged(endpoint, missed),
        Err(broadcast::error::RecvError::Closed) => Wake::Closed(endpoint),
    }
}

/// `<name>.ping`: echo the request body with the sender's rendered route
/// added under `"route"`.
fn handle_ping(ctx: &mut PluginContext, mut req: Envelope) -> Result<()> {
    let mut body = req.body.take().unwrap_or_else(|| serde_json::json!({}));
    if !body.is_object() {
        body = serde_json::json!({});
    }
    body["route"] = serde_json::Value::String(req.route_str());
    ctx.send_response(req, body)
}

/// `<name>.stats`: echo the request body with the six counters added. The
/// snapshot is taken after this request's own receipt was counted.
fn handle_stats(ctx: &mut PluginContext, mut req: Envelope) -> Result<()> {
    let mut body = req.body.take().unwrap_or_else(|| serde_json::json!({}));
    if !body.is_object() {
        body = serde_json::json!({});
    }
    ctx.stats.attach_to(&mut body);
    ctx.send_response(req, body)
}
