/// Broadcast hub - subscriber registry and fan-out
///
/// Each subscriber owns a bounded queue. Publishing never blocks:
/// - a full queue drops the message for that subscriber only
/// - a closed queue removes the subscriber
///
/// All methods are synchronous so the service can publish while holding the
/// ledger lock, which keeps delivery order equal to ledger order.
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::arguments::is_debug_webserver_enabled;
use crate::logger::{self, LogTag};

use super::message::Envelope;
use super::metrics::{HubMetrics, HubMetricsSnapshot};

/// Unique per subscriber
pub type SubscriberId = u64;

pub type SubscriberSender = mpsc::Sender<Envelope>;

pub struct BroadcastHub {
    subscribers: RwLock<HashMap<SubscriberId, SubscriberSender>>,
    next_id: AtomicU64,
    metrics: Arc<HubMetrics>,
    buffer_size: usize,
}

impl BroadcastHub {
    pub fn new(buffer_size: usize) -> Self {
        Self {
            subscribers: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            metrics: Arc::new(HubMetrics::default()),
            buffer_size: buffer_size.max(1),
        }
    }

    /// Register a subscriber whose queue starts with `initial`
    pub fn subscribe(&self, initial: Envelope) -> (SubscriberId, mpsc::Receiver<Envelope>) {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = mpsc::channel(self.buffer_size);

        // Fresh channel with capacity >= 1 always accepts the first message
        if tx.try_send(initial).is_ok() {
            self.metrics.message_sent();
        }

        let active = {
            let mut subscribers = self.subscribers.write();
            subscribers.insert(id, tx);
            subscribers.len()
        };
        self.metrics.connection_opened();

        if is_debug_webserver_enabled() {
            logger::debug(
                LogTag::Broadcast,
                &format!("Subscriber {} registered (active={})", id, active),
            );
        }

        (id, rx)
    }

    pub fn unsubscribe(&self, id: SubscriberId) {
        let removed = self.subscribers.write().remove(&id).is_some();
        if removed {
            self.metrics.connection_closed();
            if is_debug_webserver_enabled() {
                logger::debug(
                    LogTag::Broadcast,
                    &format!("Subscriber {} unregistered", id),
                );
            }
        }
    }

    /// Push one message to every subscriber
    pub fn publish(&self, envelope: &Envelope) {
        let mut sent = 0;
        let mut dropped = 0;
        let mut closed = Vec::new();

        {
            let subscribers = self.subscribers.read();
            if subscribers.is_empty() {
                return;
            }

            for (id, sender) in subscribers.iter() {
                match sender.try_send(envelope.clone()) {
                    Ok(()) => {
                        sent += 1;
                        self.metrics.message_sent();
                    }
                    Err(mpsc::error::TrySendError::Full(_)) => {
                        dropped += 1;
                        self.metrics.message_dropped(1);
                        if is_debug_webserver_enabled() {
                            logger::debug(
                                LogTag::Broadcast,
                                &format!("{} dropped for subscriber {} (queue full)", envelope.kind, id),
                            );
                        }
                    }
                    Err(mpsc::error::TrySendError::Closed(_)) => closed.push(*id),
                }
            }
        }

        for id in closed {
            self.unsubscribe(id);
        }

        if is_debug_webserver_enabled() {
            logger::debug(
                LogTag::Broadcast,
                &format!("Broadcast {} (sent={}, dropped={})", envelope.kind, sent, dropped),
            );
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }

    pub fn metrics(&self) -> HubMetricsSnapshot {
        self.metrics.snapshot()
    }
}
