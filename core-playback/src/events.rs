//! # Player Events & Event Bus
//!
//! The normalized event vocabulary hosts consume and the per-streamer
//! broadcast bus that fans it out, built on `tokio::sync::broadcast`.
//!
//! ## Delivery model
//!
//! - Delivery order equals emission order.
//! - Each subscriber lags independently: a slow subscriber observes
//!   `RecvError::Lagged` and never blocks or corrupts delivery to others.
//! - No replay: a subscriber only observes events emitted after it attached.
//! - The bus belongs to one streamer instance. There is no process-global
//!   registry and no stringly-typed notification names.
//!
//! ## Usage
//!
//! ```no_run
//! use core_playback::events::EventBus;
//! use tokio::sync::broadcast::error::RecvError;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let bus = EventBus::new(64);
//! let mut sub = bus.subscribe();
//!
//! tokio::spawn(async move {
//!     loop {
//!         match sub.recv().await {
//!             Ok(event) => println!("event: {:?}", event),
//!             Err(RecvError::Lagged(n)) => eprintln!("missed {} events", n),
//!             Err(RecvError::Closed) => break,
//!         }
//!     }
//! });
//! # }
//! ```

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

pub use tokio::sync::broadcast::error::{RecvError, SendError, TryRecvError};

/// Normalized playback event.
///
/// Serializes with a `type` tag and camelCase payload fields; this JSON
/// shape is the host-facing contract and crosses FFI/JS boundaries
/// unchanged:
///
/// ```json
/// { "type": "timeUpdate", "currentTime": 12.5 }
/// { "type": "buffering", "isBuffering": true }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PlayerEvent {
    /// Playback started or resumed.
    Play,
    /// Playback paused (host command, interruption, or route loss).
    Pause,
    /// Playback stopped (host command or end of media).
    Stop,
    /// Periodic position report while playing or buffering.
    #[serde(rename_all = "camelCase")]
    TimeUpdate { current_time: f64 },
    /// Buffering started (`true`) or ended (`false`).
    #[serde(rename_all = "camelCase")]
    Buffering { is_buffering: bool },
    /// Fatal playback failure.
    Error { message: String },
}

impl PlayerEvent {
    /// Returns a short human-readable description.
    pub fn description(&self) -> &'static str {
        match self {
            PlayerEvent::Play => "Playback started",
            PlayerEvent::Pause => "Playback paused",
            PlayerEvent::Stop => "Playback stopped",
            PlayerEvent::TimeUpdate { .. } => "Position update",
            PlayerEvent::Buffering { .. } => "Buffering state changed",
            PlayerEvent::Error { .. } => "Playback error",
        }
    }
}

/// Broadcast bus for [`PlayerEvent`]s.
///
/// Cloning is cheap and every clone publishes to the same subscribers.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<PlayerEvent>,
    // Swapped out wholesale by remove_all_listeners(); subscriptions hold
    // the token that was current when they attached.
    detach: Arc<Mutex<CancellationToken>>,
}

impl EventBus {
    /// Creates a new event bus with the specified buffer capacity.
    ///
    /// A subscriber that falls behind by more than `capacity` events
    /// observes `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            detach: Arc::new(Mutex::new(CancellationToken::new())),
        }
    }

    /// Publishes an event to all live subscribers.
    ///
    /// Returns the number of subscribers that received it. An error means no
    /// subscriber was attached, which is not a failure for the engine — the
    /// host may simply not be listening yet.
    pub fn emit(&self, event: PlayerEvent) -> Result<usize, SendError<PlayerEvent>> {
        self.sender.send(event)
    }

    /// Attaches a new subscriber.
    ///
    /// The subscription observes every event emitted after this call, in
    /// emission order, until it is dropped or detached by
    /// [`remove_all_listeners`](Self::remove_all_listeners).
    pub fn subscribe(&self) -> EventSubscription {
        EventSubscription {
            receiver: self.sender.subscribe(),
            detached: self.detach.lock().clone(),
        }
    }

    /// Detaches every live subscription.
    ///
    /// Detached subscriptions observe `RecvError::Closed` on their next
    /// receive. Idempotent; subscribers attached afterwards are unaffected.
    pub fn remove_all_listeners(&self) {
        let mut guard = self.detach.lock();
        let old = std::mem::replace(&mut *guard, CancellationToken::new());
        drop(guard);
        old.cancel();
    }

    /// Returns the number of attached subscribers.
    ///
    /// Counts broadcast receivers, including detached subscriptions not yet
    /// dropped.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

/// One attached event subscriber.
pub struct EventSubscription {
    receiver: broadcast::Receiver<PlayerEvent>,
    detached: CancellationToken,
}

impl EventSubscription {
    /// Receives the next event.
    ///
    /// # Errors
    ///
    /// - `RecvError::Lagged(n)` — this subscriber fell behind by `n` events;
    ///   it can keep receiving.
    /// - `RecvError::Closed` — the bus was dropped or this subscription was
    ///   detached via `remove_all_listeners`.
    pub async fn recv(&mut self) -> Result<PlayerEvent, RecvError> {
        if self.detached.is_cancelled() {
            return Err(RecvError::Closed);
        }

        tokio::select! {
            _ = self.detached.cancelled() => Err(RecvError::Closed),
            result = self.receiver.recv() => result,
        }
    }

    /// Attempts to receive an event without waiting.
    pub fn try_recv(&mut self) -> Result<PlayerEvent, TryRecvError> {
        if self.detached.is_cancelled() {
            return Err(TryRecvError::Closed);
        }
        self.receiver.try_recv()
    }
}

impl fmt::Debug for EventSubscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventSubscription")
            .field("detached", &self.detached.is_cancelled())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_json_shape() {
        let json = serde_json::to_value(PlayerEvent::TimeUpdate { current_time: 12.5 }).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "type": "timeUpdate", "currentTime": 12.5 })
        );

        let json = serde_json::to_value(PlayerEvent::Buffering { is_buffering: true }).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "type": "buffering", "isBuffering": true })
        );

        let json = serde_json::to_value(PlayerEvent::Play).unwrap();
        assert_eq!(json, serde_json::json!({ "type": "play" }));

        let json = serde_json::to_value(PlayerEvent::Error {
            message: "network down".into(),
        })
        .unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "type": "error", "message": "network down" })
        );
    }

    #[test]
    fn test_event_roundtrip_from_host_json() {
        let event: PlayerEvent =
            serde_json::from_str(r#"{ "type": "timeUpdate", "currentTime": 3.25 }"#).unwrap();
        assert_eq!(event, PlayerEvent::TimeUpdate { current_time: 3.25 });
    }

    #[tokio::test]
    async fn test_emission_order_preserved() {
        let bus = EventBus::new(16);
        let mut sub = bus.subscribe();

        bus.emit(PlayerEvent::Buffering { is_buffering: false }).ok();
        bus.emit(PlayerEvent::Play).ok();

        assert_eq!(
            sub.recv().await.unwrap(),
            PlayerEvent::Buffering { is_buffering: false }
        );
        assert_eq!(sub.recv().await.unwrap(), PlayerEvent::Play);
    }

    #[tokio::test]
    async fn test_multiple_subscribers_receive_same_event() {
        let bus = EventBus::new(16);
        let mut sub1 = bus.subscribe();
        let mut sub2 = bus.subscribe();

        bus.emit(PlayerEvent::Pause).ok();

        assert_eq!(sub1.recv().await.unwrap(), PlayerEvent::Pause);
        assert_eq!(sub2.recv().await.unwrap(), PlayerEvent::Pause);
    }

    #[tokio::test]
    async fn test_no_replay_for_late_subscriber() {
        let bus = EventBus::new(16);
        let mut early = bus.subscribe();

        bus.emit(PlayerEvent::Play).ok();

        let mut late = bus.subscribe();
        bus.emit(PlayerEvent::Stop).ok();

        assert_eq!(early.recv().await.unwrap(), PlayerEvent::Play);
        assert_eq!(early.recv().await.unwrap(), PlayerEvent::Stop);
        // The late subscriber never sees the event emitted before it attached.
        assert_eq!(late.recv().await.unwrap(), PlayerEvent::Stop);
    }

    #[tokio::test]
    async fn test_lagged_subscriber_does_not_affect_others() {
        let bus = EventBus::new(2);
        let mut slow = bus.subscribe();

        for i in 0..5 {
            bus.emit(PlayerEvent::TimeUpdate {
                current_time: i as f64,
            })
            .ok();
        }

        assert!(matches!(slow.recv().await, Err(RecvError::Lagged(_))));

        // A fresh subscriber still receives normally.
        let mut fresh = bus.subscribe();
        bus.emit(PlayerEvent::Stop).ok();
        assert_eq!(fresh.recv().await.unwrap(), PlayerEvent::Stop);
    }

    #[tokio::test]
    async fn test_remove_all_listeners_detaches() {
        let bus = EventBus::new(16);
        let mut sub = bus.subscribe();

        bus.remove_all_listeners();

        assert!(matches!(sub.recv().await, Err(RecvError::Closed)));
        assert!(matches!(sub.try_recv(), Err(TryRecvError::Closed)));
    }

    #[tokio::test]
    async fn test_remove_all_listeners_idempotent_and_scoped() {
        let bus = EventBus::new(16);
        let mut old = bus.subscribe();

        bus.remove_all_listeners();
        bus.remove_all_listeners();

        // Subscribers attached after the sweep are unaffected.
        let mut fresh = bus.subscribe();
        bus.emit(PlayerEvent::Play).ok();

        assert!(matches!(old.recv().await, Err(RecvError::Closed)));
        assert_eq!(fresh.recv().await.unwrap(), PlayerEvent::Play);
    }
}
