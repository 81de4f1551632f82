//! # Player Page
//!
//! Per-page bootstrap: builds the controller and the mini-player from host
//! capabilities, wires them together and pumps the event bus.
//!
//! Hosts forward raw inputs (media events, gestures, timer ticks, clicks) to
//! the page; after each input the page drains the bus until neither the
//! controller nor the widget has anything left to handle.

use bridge_traits::http::HttpClient;
use bridge_traits::media::{MediaElement, MediaEvent};
use bridge_traits::storage::KeyValueStore;
use bridge_traits::time::Clock;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::api::{TrackApi, TrackDetails};
use crate::config::PlayerConfig;
use crate::controller::PlaybackController;
use crate::error::Result;
use crate::events::{PlayerEvent, PlayerEventBus, PlayerEventStream};
use crate::persistence::PlaybackStore;
use crate::track::{playlist_from_annotations, TrackAnnotations};
use crate::widget::{Gesture, MiniPlayerWidget, RestoreOutcome};

/// Upper bound on bus round-trips per input.
const MAX_PUMP_ROUNDS: usize = 32;

/// Host capabilities the page is built from.
pub struct PlayerHost {
    pub store: Arc<dyn KeyValueStore>,
    pub clock: Arc<dyn Clock>,
    pub media: Arc<dyn MediaElement>,
    /// Needed only for selecting tracks by id.
    pub http: Option<Arc<dyn HttpClient>>,
}

/// Controller plus mini-player for one page view.
pub struct PlayerPage {
    config: PlayerConfig,
    controller: Arc<PlaybackController>,
    widget: MiniPlayerWidget,
    api: Option<TrackApi>,
    selections: PlayerEventStream,
}

impl PlayerPage {
    pub fn new(config: PlayerConfig, host: PlayerHost) -> Result<Self> {
        config.validate()?;

        let bus = PlayerEventBus::default();
        let store = PlaybackStore::new(host.store, host.clock.clone());
        let controller = Arc::new(PlaybackController::new(bus.clone(), store.clone()));
        let widget = MiniPlayerWidget::new(
            config.clone(),
            host.media,
            store,
            host.clock,
            bus.clone(),
        );
        let api = host.http.map(|http| TrackApi::new(http, config.clone()));
        let selections = bus
            .stream()
            .filter(|event| matches!(event, PlayerEvent::TrackSelected { .. }));

        Ok(Self {
            config,
            controller,
            widget,
            api,
            selections,
        })
    }

    /// Attach the widget to the controller and restore the last session.
    pub fn start(&mut self) -> Option<RestoreOutcome> {
        self.widget.attach_controller(self.controller.clone());
        let outcome = self.widget.initialize();
        info!(?outcome, "Player page started");
        self.pump();
        outcome
    }

    pub fn controller(&self) -> &Arc<PlaybackController> {
        &self.controller
    }

    pub fn widget(&self) -> &MiniPlayerWidget {
        &self.widget
    }

    pub fn widget_mut(&mut self) -> &mut MiniPlayerWidget {
        &mut self.widget
    }

    pub fn bus(&self) -> &PlayerEventBus {
        self.controller.bus()
    }

    // ========================================================================
    // Track Entry Points
    // ========================================================================

    /// A click on an annotated track element: play the page's tracks from
    /// the clicked one.
    pub fn click_track(&mut self, elements: &[TrackAnnotations], clicked_id: &str) -> bool {
        match playlist_from_annotations(elements, clicked_id) {
            Some((tracks, start)) => {
                debug!(clicked_id, tracks = tracks.len(), start, "Track clicked");
                self.controller.load_playlist(tracks, start);
                self.pump();
                true
            }
            None => {
                debug!(clicked_id, "No annotated tracks on page");
                false
            }
        }
    }

    /// Track API client, if the host provided HTTP.
    pub fn api(&self) -> Option<TrackApi> {
        self.api.clone()
    }

    /// Fetch a track by id and play it. On failure nothing changes.
    pub async fn select_track(&mut self, track_id: &str) -> bool {
        let Some(api) = self.api.clone() else {
            warn!(track_id, "Track selected but no HTTP client configured");
            return false;
        };
        let fetched = api.fetch_track(track_id).await;
        self.apply_selection(track_id, fetched)
    }

    /// Load the outcome of a track fetch. Errors are logged and abandoned.
    pub fn apply_selection(&mut self, track_id: &str, fetched: Result<TrackDetails>) -> bool {
        match fetched {
            Ok(details) => {
                let (tracks, start) = details.into_playlist(self.config.select_loads_album);
                self.controller.load_playlist(tracks, start);
                self.pump();
                true
            }
            Err(e) => {
                warn!(track_id, error = %e, network = e.is_network_error(), "Failed to load selected track");
                false
            }
        }
    }

    /// Take queued `track-selected` signals, oldest first.
    pub fn take_selections(&mut self) -> Vec<String> {
        let (events, _) = self.selections.drain();
        events
            .into_iter()
            .filter_map(|event| match event {
                PlayerEvent::TrackSelected { track_id } => Some(track_id),
                _ => None,
            })
            .collect()
    }

    /// Serve every queued `track-selected` signal.
    pub async fn process_selections(&mut self) -> usize {
        let selected = self.take_selections();
        for track_id in &selected {
            self.select_track(track_id).await;
        }
        selected.len()
    }

    // ========================================================================
    // Host Inputs
    // ========================================================================

    pub fn media_event(&mut self, event: MediaEvent) {
        self.widget.handle_media_event(event);
        self.pump();
    }

    pub fn user_gesture(&mut self, gesture: Gesture) -> bool {
        let consumed = self.widget.on_user_gesture(gesture);
        self.pump();
        consumed
    }

    pub fn tick(&mut self) {
        self.widget.tick();
        self.pump();
    }

    pub fn toggle_play_pause(&mut self) {
        self.widget.toggle_play_pause();
        self.pump();
    }

    pub fn next(&mut self) {
        self.widget.request_next();
        self.pump();
    }

    pub fn previous(&mut self) {
        self.widget.request_previous();
        self.pump();
    }

    /// Drain the bus until quiescent.
    pub fn pump(&mut self) {
        for _ in 0..MAX_PUMP_ROUNDS {
            let handled = self.controller.process_signals() + self.widget.process_events();
            if handled == 0 {
                return;
            }
        }
        warn!("Player event pump did not settle");
    }
}
