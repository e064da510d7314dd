//! Broadcast Hub
//!
//! Fans events out to connected observers. Each observer owns a bounded queue;
//! events are pushed with `try_send` so a stalled observer never blocks the
//! store. An observer whose queue is full or whose receiver is gone is removed
//! and must reconnect to get a fresh snapshot.
//!
//! The hub has no lock of its own: it lives inside the store's guarded state,
//! so registration, removal and publishing are serialized with the store's
//! mutations and every observer sees events in the order they were applied.

use sluice_core::event::BroadcastEvent;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, warn};

/// Handle identifying one connected observer
pub type ObserverId = u64;

/// Receiving half handed to an observer
pub type EventReceiver = mpsc::Receiver<Arc<BroadcastEvent>>;

#[derive(Debug)]
pub struct BroadcastHub {
    observers: HashMap<ObserverId, mpsc::Sender<Arc<BroadcastEvent>>>,
    next_id: ObserverId,
    buffer: usize,
}

impl BroadcastHub {
    /// Creates a hub whose observers can each queue `buffer` events
    pub fn new(buffer: usize) -> Self {
        Self {
            observers: HashMap::new(),
            next_id: 0,
            buffer: buffer.max(1),
        }
    }

    /// Registers a new observer; `first` is queued before any later event
    pub fn register(&mut self, first: BroadcastEvent) -> (ObserverId, EventReceiver) {
        let (tx, rx) = mpsc::channel(self.buffer);
        let id = self.next_id;
        self.next_id += 1;

        // A fresh channel always has room for one message
        if tx.try_send(Arc::new(first)).is_ok() {
            self.observers.insert(id, tx);
            debug!("Observer {} connected ({} total)", id, self.observers.len());
        }

        (id, rx)
    }

    /// Removes an observer, returning whether it was still registered
    pub fn remove(&mut self, id: ObserverId) -> bool {
        let removed = self.observers.remove(&id).is_some();
        if removed {
            debug!("Observer {} disconnected ({} left)", id, self.observers.len());
        }
        removed
    }

    /// Delivers an event to every observer, returning how many received it
    pub fn publish(&mut self, event: BroadcastEvent) -> usize {
        let event = Arc::new(event);
        let mut dropped = Vec::new();

        for (id, tx) in &self.observers {
            match tx.try_send(Arc::clone(&event)) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => {
                    warn!("Observer {} is not keeping up, dropping it", id);
                    dropped.push(*id);
                }
                Err(TrySendError::Closed(_)) => {
                    debug!("Observer {} went away", id);
                    dropped.push(*id);
                }
            }
        }

        for id in &dropped {
            self.observers.remove(id);
        }

        self.observers.len()
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }
}

impl Default for BroadcastHub {
    fn default() -> Self {
        Self::new(256)
    }
}
