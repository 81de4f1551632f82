//! # Player Events
//!
//! Signals exchanged between the controller, the widget and the page over
//! the shared [`EventBus`](core_runtime::events::EventBus).
//!
//! The widget never calls the controller for navigation; it emits
//! [`PlayerEvent::AdvanceRequested`] / [`PlayerEvent::RetreatRequested`] and
//! the controller answers with [`PlayerEvent::LoadTrack`] addressed to the
//! active output.

use core_runtime::events::{BusEvent, EventBus, EventSeverity, EventStream};
use serde::{Deserialize, Serialize};

use crate::track::Track;

/// Bus type used by the player.
pub type PlayerEventBus = EventBus<PlayerEvent>;

/// Stream type used by the player.
pub type PlayerEventStream = EventStream<PlayerEvent>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "detail", rename_all = "kebab-case")]
pub enum PlayerEvent {
    /// An output became the active, audible source.
    PlaybackStarted { source: String, track_id: String },
    /// The active output paused.
    PlaybackPaused { source: String },
    /// Move to the next playlist entry.
    AdvanceRequested,
    /// Move to the previous playlist entry.
    RetreatRequested,
    /// Fetch a track by id and play it.
    TrackSelected { track_id: String },
    /// The controller delegates a load to one output.
    LoadTrack {
        output_id: String,
        index: usize,
        track: Track,
    },
}

impl BusEvent for PlayerEvent {
    fn description(&self) -> &str {
        match self {
            PlayerEvent::PlaybackStarted { .. } => "playback-started",
            PlayerEvent::PlaybackPaused { .. } => "playback-paused",
            PlayerEvent::AdvanceRequested => "advance-requested",
            PlayerEvent::RetreatRequested => "retreat-requested",
            PlayerEvent::TrackSelected { .. } => "track-selected",
            PlayerEvent::LoadTrack { .. } => "load-track",
        }
    }

    fn severity(&self) -> EventSeverity {
        match self {
            PlayerEvent::LoadTrack { .. } | PlayerEvent::TrackSelected { .. } => EventSeverity::Info,
            _ => EventSeverity::Debug,
        }
    }
}

impl PlayerEvent {
    /// Navigation signals the controller consumes.
    pub fn is_navigation(&self) -> bool {
        matches!(
            self,
            PlayerEvent::AdvanceRequested | PlayerEvent::RetreatRequested
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptions_match_dom_signal_names() {
        assert_eq!(PlayerEvent::AdvanceRequested.description(), "advance-requested");
        assert_eq!(
            PlayerEvent::TrackSelected { track_id: "3".into() }.description(),
            "track-selected"
        );
        assert!(PlayerEvent::RetreatRequested.is_navigation());
        assert!(!PlayerEvent::PlaybackPaused { source: "a".into() }.is_navigation());
    }

    #[test]
    fn test_wire_shape() {
        let json = serde_json::to_value(PlayerEvent::PlaybackStarted {
            source: "mini-player".into(),
            track_id: "9".into(),
        })
        .unwrap();
        assert_eq!(json["type"], "playback-started");
        assert_eq!(json["detail"]["track_id"], "9");
    }

    #[test]
    fn test_navigation_filter_on_stream() {
        let bus = PlayerEventBus::default();
        let mut stream = bus.stream().filter(PlayerEvent::is_navigation);

        bus.emit(PlayerEvent::PlaybackPaused { source: "a".into() }).unwrap();
        bus.emit(PlayerEvent::AdvanceRequested).unwrap();

        let (events, missed) = stream.drain();
        assert_eq!(events, vec![PlayerEvent::AdvanceRequested]);
        assert_eq!(missed, 0);
    }
}
