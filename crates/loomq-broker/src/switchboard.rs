//! In-process channel transport.
//!
//! Stands in for the broker's socket mesh: two point-to-point links per
//! plugin (upstream requests toward the core, downstream requests toward
//! the plugin) and two fan-out buses shared by everyone (events and the
//! passive snoop tap).
//!
//! Endpoints for a plugin are created **before** its worker task starts;
//! the unbounded point-to-point channels buffer anything sent to a plugin
//! that is not yet polling, so a worker never races its own setup.

use std::collections::HashMap;

use parking_lot::Mutex;
use tokio::sync::{broadcast, mpsc};

use loomq_types::codec::Frames;

/// The five channel endpoints owned by one plugin context. Touched only by
/// that plugin's own worker after creation.
pub struct Endpoints {
    /// Send requests toward the broker core.
    pub upreq_tx: mpsc::UnboundedSender<Frames>,
    /// Receive responses to our upstream requests.
    pub upreq_rx: mpsc::UnboundedReceiver<Frames>,
    /// Receive requests addressed to this plugin.
    pub dnreq_rx: mpsc::UnboundedReceiver<Frames>,
    /// Send responses back toward the broker core.
    pub dnreq_tx: mpsc::UnboundedSender<Frames>,
    /// Broker-originated event fan-out (subscribe side).
    pub event_rx: broadcast::Receiver<Frames>,
    /// This plugin's outgoing events (publish side).
    pub event_tx: broadcast::Sender<Frames>,
    /// Passive debug tap.
    pub snoop_rx: broadcast::Receiver<Frames>,
}

/// Broker-side peer of one plugin's point-to-point endpoints. Held by the
/// switchboard until the broker core (or a test standing in for it) claims
/// it with [`Switchboard::take_link`].
pub struct BrokerLink {
    /// Deliver a request to the plugin.
    pub to_dnreq: mpsc::UnboundedSender<Frames>,
    /// Responses the plugin sent back.
    pub from_dnreq: mpsc::UnboundedReceiver<Frames>,
    /// Deliver a response to the plugin's upstream request.
    pub to_upreq: mpsc::UnboundedSender<Frames>,
    /// Requests the plugin sent upstream.
    pub from_upreq: mpsc::UnboundedReceiver<Frames>,
}

/// Shared transport context: one per [`Server`](crate::server::Server).
pub struct Switchboard {
    event_bus: broadcast::Sender<Frames>,
    snoop_bus: broadcast::Sender<Frames>,
    links: Mutex<HashMap<String, BrokerLink>>,
}

impl Switchboard {
    /// Create a switchboard whose fan-out buses hold up to `bus_capacity`
    /// messages per lagging subscriber.
    pub fn new(bus_capacity: usize) -> Self {
        let (event_bus, _) = broadcast::channel(bus_capacity);
        let (snoop_bus, _) = broadcast::channel(bus_capacity);
        Self {
            event_bus,
            snoop_bus,
            links: Mutex::new(HashMap::new()),
        }
    }

    /// Open the five endpoints for `name`, retaining the broker-side peer
    /// until [`take_link`](Self::take_link) claims it.
    pub fn connect(&self, name: &str) -> Endpoints {
        let (up_plugin_tx, up_broker_rx) = mpsc::unbounded_channel();
        let (up_broker_tx, up_plugin_rx) = mpsc::unbounded_channel();
        let (dn_broker_tx, dn_plugin_rx) = mpsc::unbounded_channel();
        let (dn_plugin_tx, dn_broker_rx) = mpsc::unbounded_channel();

        let link = BrokerLink {
            to_dnreq: dn_broker_tx,
            from_dnreq: dn_broker_rx,
            to_upreq: up_broker_tx,
            from_upreq: up_broker_rx,
        };
        self.links.lock().insert(name.to_owned(), link);

        Endpoints {
            upreq_tx: up_plugin_tx,
            upreq_rx: up_plugin_rx,
            dnreq_rx: dn_plugin_rx,
            dnreq_tx: dn_plugin_tx,
            event_rx: self.event_bus.subscribe(),
            event_tx: self.event_bus.clone(),
            snoop_rx: self.snoop_bus.subscribe(),
        }
    }

    /// Claim the broker-side peer for `name`, if still unclaimed.
    pub fn take_link(&self, name: &str) -> Option<BrokerLink> {
        self.links.lock().remove(name)
    }

    /// Fan an event out to every subscriber, including the sender if it is
    /// itself subscribed. A send with no subscribers is silently dropped,
    /// matching publish/subscribe semantics.
    pub fn publish_event(&self, frames: Frames) {
        let _ = self.event_bus.send(frames);
    }

    /// Subscribe to the event bus (broker core / test side).
    pub fn subscribe_events(&self) -> broadcast::Receiver<Frames> {
        self.event_bus.subscribe()
    }

    /// Mirror frames onto the passive snoop tap.
    pub fn snoop(&self, frames: Frames) {
        let _ = self.snoop_bus.send(frames);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn point_to_point_buffers_before_receiver_polls() {
        let board = Switchboard::new(16);
        let mut endpoints = board.connect("kvs");
        let mut link = board.take_link("kvs").expect("link");

        // Send before anything has polled the plugin side.
        link.to_dnreq.send(vec![b"hello".to_vec()]).unwrap();
        link.to_dnreq.send(vec![b"again".to_vec()]).unwrap();

        assert_eq!(endpoints.dnreq_rx.recv().await.unwrap()[0], b"hello");
        assert_eq!(endpoints.dnreq_rx.recv().await.unwrap()[0], b"again");

        // And the reverse direction.
        endpoints.dnreq_tx.send(vec![b"reply".to_vec()]).unwrap();
        assert_eq!(link.from_dnreq.recv().await.unwrap()[0], b"reply");
    }

    #[tokio::test]
    async fn events_fan_out_to_all_subscribers_including_publisher() {
        let board = Switchboard::new(16);
        let mut a = board.connect("a");
        let mut b = board.connect("b");

        a.event_tx.send(vec![b"ev".to_vec()]).unwrap();

        assert_eq!(a.event_rx.recv().await.unwrap()[0], b"ev");
        assert_eq!(b.event_rx.recv().await.unwrap()[0], b"ev");
    }

    #[tokio::test]
    async fn snoop_is_a_separate_bus() {
        let board = Switchboard::new(16);
        let mut a = board.connect("a");

        board.snoop(vec![b"tap".to_vec()]);
        assert_eq!(a.snoop_rx.recv().await.unwrap()[0], b"tap");
        assert!(a.event_rx.try_recv().is_err());
    }

    #[test]
    fn take_link_claims_once() {
        let board = Switchboard::new(16);
        let _endpoints = board.connect("a");
        assert!(board.take_link("a").is_some());
        assert!(board.take_link("a").is_none());
    }
}
