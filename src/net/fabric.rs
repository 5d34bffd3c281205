//! Fabric — ordered, reliable fan-out of stroke frames to every peer.
//!
//! DESIGN
//! ======
//! Delivery is invoke-local: a published frame reaches every joined peer,
//! the sender included, so a stroke is applied locally through the same
//! dispatch path as everywhere else.
//!
//! `LoopbackFabric` is the in-process implementation. Each peer owns an
//! unbounded tokio channel; publishing holds the peer-table lock for the
//! whole fan-out, so all peers observe one global frame order. Peers whose
//! receiver is gone are pruned on the next publish.

#[cfg(test)]
#[path = "fabric_test.rs"]
mod tests;

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;
use tracing::{debug, info};
use uuid::Uuid;

use crate::frame::Frame;

/// Anything that can deliver a frame to all participants.
pub trait Fabric {
    /// Deliver `frame` to every peer, sender included. Returns the number of
    /// peers it reached.
    fn publish(&self, frame: Frame) -> usize;
}

// =============================================================================
// LOOPBACK
// =============================================================================

#[derive(Clone, Default)]
pub struct LoopbackFabric {
    peers: Arc<Mutex<BTreeMap<Uuid, mpsc::UnboundedSender<Frame>>>>,
}

impl LoopbackFabric {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a peer and return its endpoint.
    #[must_use]
    pub fn join(&self, name: impl Into<String>) -> Peer {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = Uuid::new_v4();
        let name = name.into();
        self.peers.lock().unwrap_or_else(PoisonError::into_inner).insert(id, tx);
        info!(peer_id = %id, peer = %name, "fabric: peer joined");
        Peer { id, name, rx, fabric: self.clone() }
    }

    /// Remove a peer. Frames already queued for it are discarded with the receiver.
    pub fn leave(&self, id: Uuid) {
        if self.peers.lock().unwrap_or_else(PoisonError::into_inner).remove(&id).is_some() {
            info!(peer_id = %id, "fabric: peer left");
        }
    }

    #[must_use]
    pub fn peer_count(&self) -> usize {
        self.peers.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

impl Fabric for LoopbackFabric {
    fn publish(&self, frame: Frame) -> usize {
        let mut peers = self.peers.lock().unwrap_or_else(PoisonError::into_inner);
        let before = peers.len();
        peers.retain(|_, tx| tx.send(frame.clone()).is_ok());
        if peers.len() < before {
            debug!(pruned = before - peers.len(), "fabric: pruned closed peers");
        }
        peers.len()
    }
}

// =============================================================================
// PEER
// =============================================================================

/// One participant's endpoint on a `LoopbackFabric`.
pub struct Peer {
    id: Uuid,
    name: String,
    rx: mpsc::UnboundedReceiver<Frame>,
    fabric: LoopbackFabric,
}

impl Peer {
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Stamp `frame` with this peer's name and publish it to everyone.
    pub fn send(&self, frame: Frame) -> usize {
        self.fabric.publish(frame.with_from(self.name.clone()))
    }

    /// Next delivered frame without waiting.
    pub fn try_recv(&mut self) -> Option<Frame> {
        match self.rx.try_recv() {
            Ok(frame) => Some(frame),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    /// Wait for the next delivered frame. `None` once the peer has left.
    pub async fn recv(&mut self) -> Option<Frame> {
        self.rx.recv().await
    }

    /// Every frame delivered so far, in delivery order.
    pub fn drain(&mut self) -> Vec<Frame> {
        std::iter::from_fn(|| self.try_recv()).collect()
    }
}

impl Drop for Peer {
    fn drop(&mut self) {
        self.fabric.leave(self.id);
    }
}
