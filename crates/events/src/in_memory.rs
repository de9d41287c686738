//! Process-local bus backed by std mpsc channels.
//!
//! This is the transport used in tests and single-process deployments: the
//! resolution service publishes on one side, the corrections learner drains
//! on the other. Each subscriber owns a private channel, so fan-out is a
//! clone-per-subscriber broadcast with no shared queue to contend on.

use std::sync::{Mutex, mpsc};

use thiserror::Error;
use tracing::trace;

use crate::bus::{EventBus, Subscription};

#[derive(Debug, Error)]
pub enum InMemoryBusError {
    #[error("event bus subscriber list is poisoned")]
    Poisoned,
}

/// Channel-fanout bus. Messages published before a subscription exists are
/// not replayed; consumers that need history rebuild it from the stores.
#[derive(Debug)]
pub struct InMemoryEventBus<M> {
    senders: Mutex<Vec<mpsc::Sender<M>>>,
}

impl<M> Default for InMemoryEventBus<M> {
    fn default() -> Self {
        Self {
            senders: Mutex::new(Vec::new()),
        }
    }
}

impl<M> InMemoryEventBus<M> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Live subscriptions. Senders whose receiver was dropped are only
    /// discovered (and pruned) on the next publish, so this can briefly
    /// over-count.
    pub fn subscriber_count(&self) -> usize {
        self.senders.lock().map(|s| s.len()).unwrap_or(0)
    }
}

impl<M> EventBus<M> for InMemoryEventBus<M>
where
    M: Clone + Send + 'static,
{
    type Error = InMemoryBusError;

    fn publish(&self, message: M) -> Result<(), Self::Error> {
        let mut senders = self.senders.lock().map_err(|_| InMemoryBusError::Poisoned)?;

        let before = senders.len();
        senders.retain(|tx| tx.send(message.clone()).is_ok());
        let delivered = senders.len();

        trace!(delivered, pruned = before - delivered, "event published");
        Ok(())
    }

    fn subscribe(&self) -> Subscription<M> {
        let (tx, rx) = mpsc::channel();
        if let Ok(mut senders) = self.senders.lock() {
            senders.push(tx);
        }
        Subscription::new(rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn each_subscriber_gets_its_own_copy() {
        let bus = InMemoryEventBus::new();
        let a = bus.subscribe();
        let b = bus.subscribe();

        bus.publish(41u32).unwrap();

        assert_eq!(a.try_recv().unwrap(), 41);
        assert_eq!(b.try_recv().unwrap(), 41);
    }

    #[test]
    fn a_late_subscriber_does_not_see_earlier_messages() {
        let bus = InMemoryEventBus::new();
        bus.publish("early").unwrap();

        let late = bus.subscribe();
        bus.publish("late").unwrap();

        assert_eq!(late.try_recv().unwrap(), "late");
        assert!(late.try_recv().is_err());
    }

    #[test]
    fn dropped_subscriptions_are_pruned_on_the_next_publish() {
        let bus = InMemoryEventBus::new();
        drop(bus.subscribe());
        let live = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);

        bus.publish("x").unwrap();

        assert_eq!(live.try_recv().unwrap(), "x");
        assert_eq!(bus.subscriber_count(), 1);
    }
}
