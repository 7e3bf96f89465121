//! Fan-out broadcaster over bounded per-subscriber channels.
//!
//! # Invariants
//! - The subscriber set is only mutated under the write lock; publishes
//!   share the read lock and never wait on each other.
//! - Delivery uses `try_send`: a full channel drops that message for that
//!   subscriber only, and a publish never blocks or fails its caller.
//! - A subscriber is Closed once unsubscribed or once its receiver is
//!   dropped; closed senders are pruned on the next publish.

use crate::hub::event::HubMessage;
use crate::repo::sql::now_epoch_ms;
use log::{debug, warn};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use tokio::sync::mpsc::error::{TryRecvError, TrySendError};
use tokio::sync::mpsc::{self, Receiver, Sender};
use uuid::Uuid;

/// Default per-subscriber buffer.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 16;

pub type SubscriberId = Uuid;

/// Receiving end handed to one subscriber.
#[derive(Debug)]
pub struct Subscription {
    id: SubscriberId,
    receiver: Receiver<HubMessage>,
}

impl Subscription {
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Waits for the next message. `None` once the hub closed the channel.
    pub async fn recv(&mut self) -> Option<HubMessage> {
        self.receiver.recv().await
    }

    /// Takes a buffered message without waiting.
    pub fn try_recv(&mut self) -> Option<HubMessage> {
        match self.receiver.try_recv() {
            Ok(message) => Some(message),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    /// Blocking variant of [`Subscription::recv`] for non-async consumers.
    ///
    /// Must not be called from inside an async runtime.
    pub fn blocking_recv(&mut self) -> Option<HubMessage> {
        self.receiver.blocking_recv()
    }

    /// Whether the hub side of this channel is gone.
    pub fn is_closed(&self) -> bool {
        self.receiver.is_closed()
    }
}

/// Per-publish delivery counters. Informational only; never an error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublishReport {
    pub delivered: usize,
    /// Subscribers whose channel was full.
    pub dropped: usize,
    /// Subscribers found closed and pruned.
    pub closed: usize,
}

/// Concurrent change-notification hub.
///
/// Construct one per process and share it as `Arc<ChangeHub>` with every
/// component that mutates entities.
#[derive(Debug)]
pub struct ChangeHub {
    subscribers: RwLock<HashMap<SubscriberId, Sender<HubMessage>>>,
    capacity: usize,
}

impl Default for ChangeHub {
    fn default() -> Self {
        Self::new(DEFAULT_CHANNEL_CAPACITY)
    }
}

impl ChangeHub {
    /// Creates an empty hub. `capacity` is clamped to at least 1.
    pub fn new(capacity: usize) -> Self {
        Self {
            subscribers: RwLock::new(HashMap::new()),
            capacity: capacity.max(1),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Registers a new subscriber with its own bounded channel.
    pub fn subscribe(&self) -> Subscription {
        let (sender, receiver) = mpsc::channel(self.capacity);
        let id = Uuid::new_v4();
        let total = {
            let mut subscribers = self
                .subscribers
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            subscribers.insert(id, sender);
            subscribers.len()
        };
        debug!("event=hub_subscribe module=hub status=ok subscriber={id} total={total}");
        Subscription { id, receiver }
    }

    /// Removes the subscriber and closes its channel.
    ///
    /// Returns `false` when the subscriber had already been pruned.
    pub fn unsubscribe(&self, subscription: Subscription) -> bool {
        let Subscription { id, mut receiver } = subscription;
        let removed = self
            .subscribers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id)
            .is_some();
        receiver.close();
        debug!("event=hub_unsubscribe module=hub status=ok subscriber={id} removed={removed}");
        removed
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Serializes `payload` and offers it to every registered subscriber.
    ///
    /// Serialization failures are logged and reported as an empty delivery.
    pub fn publish<T: Serialize + ?Sized>(&self, event_type: &str, payload: &T) -> PublishReport {
        let data = match serde_json::to_string(payload) {
            Ok(data) => data,
            Err(err) => {
                warn!(
                    "event=hub_publish module=hub status=error event_type={event_type} error_code=payload_serialize_failed error={err}"
                );
                return PublishReport::default();
            }
        };

        self.broadcast(HubMessage {
            event: event_type.to_string(),
            data,
            sent_at: now_epoch_ms(),
        })
    }

    fn broadcast(&self, message: HubMessage) -> PublishReport {
        let mut report = PublishReport::default();
        let mut closed = Vec::new();
        {
            let subscribers = self
                .subscribers
                .read()
                .unwrap_or_else(PoisonError::into_inner);
            for (id, sender) in subscribers.iter() {
                match sender.try_send(message.clone()) {
                    Ok(()) => report.delivered += 1,
                    Err(TrySendError::Full(_)) => report.dropped += 1,
                    Err(TrySendError::Closed(_)) => closed.push(*id),
                }
            }
        }

        if !closed.is_empty() {
            let mut subscribers = self
                .subscribers
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            for id in &closed {
                subscribers.remove(id);
            }
            report.closed = closed.len();
        }

        debug!(
            "event=hub_publish module=hub status=ok event_type={} delivered={} dropped={} closed={}",
            message.event, report.delivered, report.dropped, report.closed
        );
        report
    }
}
