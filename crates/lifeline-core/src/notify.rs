//! Live state-change fan-out.
//!
//! [`ChangeNotifier`] wraps a [`tokio::sync::broadcast`] channel carrying
//! [`StateChange`] records. Every mutation the core performs -- claims,
//! per-tick movement, orphan recovery, resolutions -- is published here
//! once.
//!
//! Delivery is best-effort by construction: a subscriber that falls more
//! than [`BROADCAST_CAPACITY`] messages behind skips ahead (it observes a
//! `Lagged` error, not stale data), a dropped subscriber affects nobody
//! else, and `publish` never blocks.

use lifeline_types::{Ambulance, Event, StateChange};
use tokio::sync::broadcast;

/// Capacity of the broadcast channel for state changes.
///
/// If a subscriber falls behind by more than this many messages it will
/// receive a [`broadcast::error::RecvError::Lagged`] and skip to the
/// newest message.
pub const BROADCAST_CAPACITY: usize = 256;

/// Fan-out broadcaster for entity state changes.
#[derive(Debug, Clone)]
pub struct ChangeNotifier {
    tx: broadcast::Sender<StateChange>,
}

impl ChangeNotifier {
    /// Create a notifier with the default channel capacity.
    pub fn new() -> Self {
        Self::with_capacity(BROADCAST_CAPACITY)
    }

    /// Create a notifier with an explicit channel capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribe to the change stream.
    ///
    /// Dropping the returned receiver is the unsubscribe operation.
    pub fn subscribe(&self) -> broadcast::Receiver<StateChange> {
        self.tx.subscribe()
    }

    /// Publish a state change to all current subscribers.
    ///
    /// Returns the number of receivers the message reached. Returns 0
    /// when nobody is subscribed (this is not an error).
    pub fn publish(&self, change: StateChange) -> usize {
        // send returns Err only when there are zero receivers, which is
        // normal when no clients are connected.
        self.tx.send(change).unwrap_or(0)
    }

    /// Publish the new state of an ambulance.
    pub fn ambulance_changed(&self, ambulance: &Ambulance) -> usize {
        self.publish(StateChange::Ambulance(ambulance.clone()))
    }

    /// Publish the new state of an event.
    pub fn event_changed(&self, event: &Event) -> usize {
        self.publish(StateChange::Event(event.clone()))
    }

    /// Number of currently attached subscribers.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for ChangeNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use lifeline_types::GeoPoint;
    use tokio::sync::broadcast::error::RecvError;

    use super::*;

    #[tokio::test]
    async fn publish_reaches_every_subscriber() {
        let notifier = ChangeNotifier::new();
        let mut rx1 = notifier.subscribe();
        let mut rx2 = notifier.subscribe();

        let ambulance = Ambulance::idle_at(GeoPoint::new(40.44, -79.99));
        let reached = notifier.ambulance_changed(&ambulance);
        assert_eq!(reached, 2);

        for rx in [&mut rx1, &mut rx2] {
            let change = rx.recv().await.unwrap();
            assert_eq!(change.entity_id(), ambulance.id.into_inner());
        }
    }

    #[tokio::test]
    async fn publish_without_subscribers_is_a_noop() {
        let notifier = ChangeNotifier::new();
        let ambulance = Ambulance::idle_at(GeoPoint::new(40.44, -79.99));
        assert_eq!(notifier.ambulance_changed(&ambulance), 0);
    }

    #[tokio::test]
    async fn dropped_subscriber_does_not_affect_others() {
        let notifier = ChangeNotifier::new();
        let rx_dead = notifier.subscribe();
        let mut rx_live = notifier.subscribe();
        drop(rx_dead);

        let ambulance = Ambulance::idle_at(GeoPoint::new(40.44, -79.99));
        let reached = notifier.ambulance_changed(&ambulance);
        assert_eq!(reached, 1);
        assert!(rx_live.recv().await.is_ok());
    }

    #[tokio::test]
    async fn slow_subscriber_lags_and_skips_ahead() {
        let notifier = ChangeNotifier::with_capacity(2);
        let mut rx = notifier.subscribe();

        // Three publishes into a capacity-2 channel push the oldest out.
        for lat in [1.0, 2.0, 3.0] {
            notifier.ambulance_changed(&Ambulance::idle_at(GeoPoint::new(lat, 0.0)));
        }

        let lagged = rx.recv().await;
        assert!(matches!(lagged, Err(RecvError::Lagged(1))));

        // The subscriber resumes from the oldest retained message.
        assert!(rx.recv().await.is_ok());
        assert!(rx.recv().await.is_ok());
    }

    #[tokio::test]
    async fn receiver_count_tracks_subscribers() {
        let notifier = ChangeNotifier::new();
        assert_eq!(notifier.receiver_count(), 0);
        let rx = notifier.subscribe();
        assert_eq!(notifier.receiver_count(), 1);
        drop(rx);
        assert_eq!(notifier.receiver_count(), 0);
    }
}
