//! # Event Bus System
//!
//! Provides an event-driven architecture for the player using `tokio::sync::broadcast`.
//! This module enables decoupled communication between components through typed events.
//!
//! ## Overview
//!
//! The event bus system consists of:
//! - **[`BusEvent`]**: Trait implemented by each domain's event enum
//! - **[`EventBus`]**: Central broadcast channel for publishing events
//! - **[`EventStream`]**: Wrapper for consuming events with filtering
//!
//! The bus is generic over the event type so that domain crates define their
//! own strongly-typed events (the playback crate carries whole track records
//! in its events) without this crate knowing about them.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     emit      ┌───────────┐
//! │ Controller  ├──────────────>│           │     subscribe    ┌────────────┐
//! └─────────────┘               │ EventBus  ├─────────────────>│ Controller │
//!                               │ (broadcast│                  └────────────┘
//! ┌─────────────┐     emit      │  channel) │     subscribe    ┌────────────┐
//! │   Widget    ├──────────────>│           ├─────────────────>│   Widget   │
//! └─────────────┘               └───────────┘                  └────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{BusEvent, EventBus};
//!
//! #[derive(Debug, Clone, PartialEq)]
//! enum Ping {
//!     Hello,
//! }
//!
//! impl BusEvent for Ping {
//!     fn description(&self) -> &str {
//!         "hello"
//!     }
//! }
//!
//! let bus = EventBus::<Ping>::new(16);
//! let mut stream = bus.stream();
//! bus.emit(Ping::Hello).ok();
//! assert_eq!(stream.try_recv(), Some(Ok(Ping::Hello)));
//! ```
//!
//! ## Error Handling
//!
//! `tokio::sync::broadcast` can produce two types of errors:
//!
//! - **`RecvError::Lagged(n)`**: Subscriber was too slow and missed `n` events.
//!   This is non-fatal; the subscriber can continue receiving new events.
//! - **`RecvError::Closed`**: All senders have been dropped. This indicates shutdown.
//!
//! Subscribers should handle `Lagged` gracefully and treat `Closed` as a signal to exit.
//!
//! ## Single-threaded Use
//!
//! The player drains streams synchronously with [`EventStream::try_recv`],
//! which needs no async runtime. That keeps the bus usable from the browser's
//! event loop as well as from native tasks.

use std::fmt;
use tokio::sync::broadcast;
use tracing::trace;

// Re-export commonly used types
pub use tokio::sync::broadcast::error::{RecvError, SendError};
pub use tokio::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
///
/// Subscribers that can't keep up will receive `RecvError::Lagged`.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

/// Event severity levels for filtering and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum EventSeverity {
    Debug,
    Info,
    Warning,
    Error,
}

/// Behaviour shared by every event type carried on an [`EventBus`].
pub trait BusEvent: Clone + fmt::Debug + Send + 'static {
    /// Short human-readable description, used in trace logs.
    fn description(&self) -> &str;

    /// Severity for filtering; most events are informational.
    fn severity(&self) -> EventSeverity {
        EventSeverity::Info
    }
}

// ============================================================================
// Event Bus
// ============================================================================

/// Central event bus for publishing and subscribing to events.
///
/// Uses `tokio::sync::broadcast` internally, which provides:
/// - Multiple producers (clone the `EventBus`)
/// - Multiple consumers (each `subscribe()` creates a new receiver)
/// - Non-blocking sends (events are cloned for each subscriber)
/// - Lagging detection (slow subscribers get `RecvError::Lagged`)
pub struct EventBus<E: BusEvent> {
    sender: broadcast::Sender<E>,
}

impl<E: BusEvent> EventBus<E> {
    /// Creates a new event bus with the specified buffer size.
    ///
    /// # Arguments
    ///
    /// * `capacity` - Maximum number of events to buffer per subscriber.
    ///   When a subscriber falls behind by more than this amount, it will
    ///   receive a `RecvError::Lagged` error.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of subscribers that received the event.
    /// Returns an error if there are no active subscribers.
    pub fn emit(&self, event: E) -> Result<usize, SendError<E>> {
        trace!(event = event.description(), "Emitting event");
        self.sender.send(event)
    }

    /// Creates a new raw subscriber. Past events are not replayed.
    pub fn subscribe(&self) -> Receiver<E> {
        self.sender.subscribe()
    }

    /// Creates a new subscriber wrapped in an [`EventStream`].
    pub fn stream(&self) -> EventStream<E> {
        EventStream::new(self.subscribe())
    }

    /// Returns the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl<E: BusEvent> Clone for EventBus<E> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

impl<E: BusEvent> Default for EventBus<E> {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}

impl<E: BusEvent> fmt::Debug for EventBus<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ============================================================================
// Event Stream Wrapper
// ============================================================================

/// Type alias for event filter functions.
type EventFilter<E> = Box<dyn Fn(&E) -> bool + Send + Sync>;

/// A wrapper around `broadcast::Receiver` with additional filtering capabilities.
pub struct EventStream<E: BusEvent> {
    receiver: Receiver<E>,
    filter: Option<EventFilter<E>>,
}

impl<E: BusEvent> EventStream<E> {
    /// Creates a new event stream from a receiver.
    pub fn new(receiver: Receiver<E>) -> Self {
        Self {
            receiver,
            filter: None,
        }
    }

    /// Adds a filter function to this stream.
    ///
    /// Only events that match the filter will be returned.
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&E) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(predicate));
        self
    }

    fn accepts(&self, event: &E) -> bool {
        self.filter.as_ref().map_or(true, |filter| filter(event))
    }

    /// Receives the next event that passes the filter (if any).
    ///
    /// # Errors
    ///
    /// Returns `RecvError::Lagged(n)` if the subscriber fell behind by `n` events.
    /// Returns `RecvError::Closed` if all senders have been dropped.
    pub async fn recv(&mut self) -> Result<E, RecvError> {
        loop {
            let event = self.receiver.recv().await?;
            if self.accepts(&event) {
                return Ok(event);
            }
        }
    }

    /// Attempts to receive an event without blocking.
    ///
    /// Returns `None` if no events are currently available.
    pub fn try_recv(&mut self) -> Option<Result<E, RecvError>> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => {
                    if self.accepts(&event) {
                        return Some(Ok(event));
                    }
                }
                Err(broadcast::error::TryRecvError::Empty) => return None,
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    return Some(Err(RecvError::Lagged(n)))
                }
                Err(broadcast::error::TryRecvError::Closed) => return Some(Err(RecvError::Closed)),
            }
        }
    }

    /// Drains every event currently queued, skipping over lag gaps.
    ///
    /// Returns the events in order plus the number of events lost to lagging.
    pub fn drain(&mut self) -> (Vec<E>, u64) {
        let mut events = Vec::new();
        let mut missed = 0;
        while let Some(result) = self.try_recv() {
            match result {
                Ok(event) => events.push(event),
                Err(RecvError::Lagged(n)) => missed += n,
                Err(RecvError::Closed) => break,
            }
        }
        (events, missed)
    }
}

impl<E: BusEvent> fmt::Debug for EventStream<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("has_filter", &self.filter.is_some())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    enum TestEvent {
        Started(u32),
        Stopped,
        Failed(String),
    }

    impl BusEvent for TestEvent {
        fn description(&self) -> &str {
            match self {
                TestEvent::Started(_) => "started",
                TestEvent::Stopped => "stopped",
                TestEvent::Failed(_) => "failed",
            }
        }

        fn severity(&self) -> EventSeverity {
            match self {
                TestEvent::Failed(_) => EventSeverity::Error,
                _ => EventSeverity::Info,
            }
        }
    }

    #[test]
    fn test_event_bus_subscription() {
        let bus = EventBus::<TestEvent>::new(10);
        assert_eq!(bus.subscriber_count(), 0);

        let _sub1 = bus.subscribe();
        let _sub2 = bus.stream();
        assert_eq!(bus.subscriber_count(), 2);
    }

    #[test]
    fn test_event_emission_no_subscribers() {
        let bus = EventBus::<TestEvent>::default();
        assert!(bus.emit(TestEvent::Stopped).is_err());
    }

    #[tokio::test]
    async fn test_multiple_subscribers_receive_same_event() {
        let bus = EventBus::new(10);
        let mut sub1 = bus.stream();
        let mut sub2 = bus.stream();

        assert_eq!(bus.emit(TestEvent::Started(1)).unwrap(), 2);

        assert_eq!(sub1.recv().await.unwrap(), TestEvent::Started(1));
        assert_eq!(sub2.recv().await.unwrap(), TestEvent::Started(1));
    }

    #[tokio::test]
    async fn test_event_stream_with_filter() {
        let bus = EventBus::new(10);
        let mut stream = bus
            .stream()
            .filter(|event| matches!(event, TestEvent::Started(_)));

        bus.emit(TestEvent::Stopped).ok();
        bus.emit(TestEvent::Started(7)).ok();

        assert_eq!(stream.recv().await.unwrap(), TestEvent::Started(7));
    }

    #[test]
    fn test_try_recv_without_runtime() {
        let bus = EventBus::new(10);
        let mut stream = bus.stream();
        assert!(stream.try_recv().is_none());

        bus.emit(TestEvent::Started(3)).ok();
        assert_eq!(stream.try_recv(), Some(Ok(TestEvent::Started(3))));
        assert!(stream.try_recv().is_none());
    }

    #[test]
    fn test_lagged_stream_drains_remaining() {
        let bus = EventBus::new(2);
        let mut stream = bus.stream();

        for i in 0..5 {
            bus.emit(TestEvent::Started(i)).ok();
        }

        let (events, missed) = stream.drain();
        assert_eq!(missed, 3);
        assert_eq!(events, vec![TestEvent::Started(3), TestEvent::Started(4)]);
    }

    #[test]
    fn test_event_severity() {
        assert_eq!(
            TestEvent::Failed("boom".into()).severity(),
            EventSeverity::Error
        );
        assert_eq!(TestEvent::Stopped.severity(), EventSeverity::Info);
        assert_eq!(TestEvent::Stopped.description(), "stopped");
    }

    #[tokio::test]
    async fn test_concurrent_publishers() {
        let bus = EventBus::new(100);
        let mut stream = bus.stream();

        let bus1 = bus.clone();
        let bus2 = bus.clone();

        let handle1 = tokio::spawn(async move {
            for i in 0..10 {
                bus1.emit(TestEvent::Started(i)).ok();
            }
        });
        let handle2 = tokio::spawn(async move {
            for _ in 0..10 {
                bus2.emit(TestEvent::Stopped).ok();
            }
        });

        handle1.await.ok();
        handle2.await.ok();

        let (events, missed) = stream.drain();
        assert_eq!(events.len(), 20);
        assert_eq!(missed, 0);
    }
}
