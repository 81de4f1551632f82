//! # Playback Controller
//!
//! Single authority over which output plays, what the playlist is, and where
//! traversal stands.
//!
//! ## Overview
//!
//! One controller exists per page. The page bootstrap constructs it and hands
//! an `Arc` to every widget; there is no global instance. Outputs register a
//! [`MediaElement`] handle, which the controller only ever uses to pause a
//! superseded source. Loading media is delegated to the owning output through
//! [`PlayerEvent::LoadTrack`].
//!
//! ## State
//!
//! - playlist and current index, persisted as an independent pair
//! - active source and its track, plus whether it is audibly playing
//! - album context of the first playlist entry
//!
//! ## Usage
//!
//! ```ignore
//! let controller = Arc::new(PlaybackController::new(bus.clone(), store));
//! controller.register_output("mini-player", media);
//! controller.load_playlist(tracks, 0);
//! // later, whenever the widget emitted navigation signals:
//! controller.process_signals();
//! ```

use bridge_traits::media::MediaElement;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::events::{PlayerEvent, PlayerEventBus, PlayerEventStream};
use crate::persistence::{warn_on_failure, wrap_index, PlaybackSession, PlaybackStore};
use crate::track::{AlbumType, Track};

/// A registered output capability.
#[derive(Clone)]
pub struct OutputHandle {
    pub media: Arc<dyn MediaElement>,
}

#[derive(Default)]
struct ControllerState {
    outputs: HashMap<String, OutputHandle>,
    /// First registered output; receives loads while nothing is active.
    primary_output: Option<String>,
    playlist: Vec<Track>,
    index: usize,
    active_source: Option<String>,
    active_track: Option<String>,
    is_playing: bool,
    album_title: Option<String>,
    album_type: AlbumType,
}

impl ControllerState {
    fn set_playlist(&mut self, tracks: Vec<Track>, index: usize) {
        if let Some(first) = tracks.first() {
            self.album_title = Some(first.album_title.clone());
            self.album_type = first.album_type;
        }
        self.playlist = tracks;
        self.index = index;
    }

    fn load_target(&self) -> Option<String> {
        self.active_source
            .clone()
            .or_else(|| self.primary_output.clone())
    }
}

/// Play/pause arbitration and playlist traversal.
pub struct PlaybackController {
    state: Mutex<ControllerState>,
    navigation: Mutex<Option<PlayerEventStream>>,
    bus: PlayerEventBus,
    store: PlaybackStore,
}

impl PlaybackController {
    /// Create the page's controller, picking up any persisted playlist.
    pub fn new(bus: PlayerEventBus, store: PlaybackStore) -> Self {
        let controller = Self {
            state: Mutex::new(ControllerState::default()),
            navigation: Mutex::new(None),
            bus,
            store,
        };

        if let Some((tracks, index)) = controller.store.saved_playlist() {
            info!(tracks = tracks.len(), index, "Restored playlist");
            controller.state.lock().set_playlist(tracks, index);
            controller.ensure_signal_subscription();
        }

        controller
    }

    pub fn bus(&self) -> &PlayerEventBus {
        &self.bus
    }

    pub fn store(&self) -> &PlaybackStore {
        &self.store
    }

    // ========================================================================
    // Outputs
    // ========================================================================

    /// Register (or replace) an output under `output_id`.
    pub fn register_output(&self, output_id: &str, media: Arc<dyn MediaElement>) {
        let mut state = self.state.lock();
        let replaced = state
            .outputs
            .insert(output_id.to_string(), OutputHandle { media })
            .is_some();
        if state.primary_output.is_none() {
            state.primary_output = Some(output_id.to_string());
        }
        debug!(output_id, replaced, "Registered output");
    }

    pub fn is_registered(&self, output_id: &str) -> bool {
        self.state.lock().outputs.contains_key(output_id)
    }

    // ========================================================================
    // Play / Pause Arbitration
    // ========================================================================

    /// Make `output_id` the active source.
    ///
    /// A different output that was active and playing is paused first, then
    /// `playback-started` is emitted and the session is persisted as playing.
    pub fn request_play(&self, output_id: &str, track: &Track, media: &dyn MediaElement) {
        let superseded = {
            let mut state = self.state.lock();
            let superseded = match state.active_source.as_deref() {
                Some(previous) if previous != output_id && state.is_playing => {
                    state.outputs.get(previous).map(|handle| handle.media.clone())
                }
                _ => None,
            };
            state.active_source = Some(output_id.to_string());
            state.active_track = Some(track.id.clone());
            state.is_playing = true;
            superseded
        };

        if let Some(previous) = superseded {
            debug!(output_id, "Pausing superseded output");
            previous.pause();
        }

        self.emit(PlayerEvent::PlaybackStarted {
            source: output_id.to_string(),
            track_id: track.id.clone(),
        });

        let mut session = PlaybackSession::for_track(track);
        if let Some(src) = media.source().filter(|src| !src.is_empty()) {
            session.src = src;
        }
        session.current_time_seconds = Some(media.current_time());
        warn_on_failure(self.store.save_session(&session), "session on play");
    }

    /// Mark the active source paused. Ignored for any other output.
    pub fn request_pause(&self, output_id: &str) {
        {
            let mut state = self.state.lock();
            if state.active_source.as_deref() != Some(output_id) {
                debug!(output_id, "Ignoring pause from inactive output");
                return;
            }
            state.is_playing = false;
        }

        self.emit(PlayerEvent::PlaybackPaused {
            source: output_id.to_string(),
        });
        warn_on_failure(self.store.set_session_playing(false), "session on pause");
    }

    // ========================================================================
    // Playlist
    // ========================================================================

    /// Replace the playlist and start playing at `start_index`.
    ///
    /// Empty playlists are ignored. Out-of-range start indices wrap.
    pub fn load_playlist(&self, tracks: Vec<Track>, start_index: usize) {
        if tracks.is_empty() {
            debug!("Ignoring empty playlist");
            return;
        }

        let tracks: Vec<Track> = tracks.iter().map(Track::canonicalized).collect();
        let index = wrap_index(start_index as i64, tracks.len());
        info!(tracks = tracks.len(), index, "Loading playlist");

        warn_on_failure(self.store.save_playlist(&tracks, index), "playlist");
        self.state.lock().set_playlist(tracks, index);
        self.ensure_signal_subscription();
        self.load_current();
    }

    /// Move forward one entry, wrapping at the end.
    pub fn advance(&self) {
        self.step(1);
    }

    /// Move back one entry, wrapping at the start.
    pub fn retreat(&self) {
        self.step(-1);
    }

    fn step(&self, delta: i64) {
        let needs_fallback = self.state.lock().playlist.is_empty();
        if needs_fallback {
            match self.store.saved_playlist() {
                Some((tracks, index)) => {
                    debug!(tracks = tracks.len(), "Falling back to persisted playlist");
                    self.state.lock().set_playlist(tracks, index);
                }
                None => {
                    debug!("No playlist to navigate");
                    return;
                }
            }
        }

        let index = {
            let mut state = self.state.lock();
            let index = wrap_index(state.index as i64 + delta, state.playlist.len());
            state.index = index;
            index
        };
        debug!(index, delta, "Playlist position changed");

        warn_on_failure(self.store.save_playlist_index(index), "playlist index");
        self.load_current();
    }

    fn load_current(&self) {
        let delegated = {
            let state = self.state.lock();
            let track = state.playlist.get(state.index).cloned();
            track.zip(state.load_target()).map(|(track, output)| (output, state.index, track))
        };

        match delegated {
            Some((output_id, index, track)) => {
                debug!(output_id = %output_id, index, track_id = %track.id, "Delegating load");
                self.emit(PlayerEvent::LoadTrack {
                    output_id,
                    index,
                    track,
                });
            }
            None => warn!("No output registered to load the current track"),
        }
    }

    // ========================================================================
    // Navigation Signals
    // ========================================================================

    /// Subscribe to advance/retreat signals; later calls are no-ops.
    fn ensure_signal_subscription(&self) {
        let mut navigation = self.navigation.lock();
        if navigation.is_none() {
            *navigation = Some(self.bus.stream().filter(PlayerEvent::is_navigation));
            debug!("Playlist navigation listeners initialized");
        }
    }

    pub fn listens_for_signals(&self) -> bool {
        self.navigation.lock().is_some()
    }

    /// Handle every queued advance/retreat signal, in order.
    ///
    /// Returns how many signals were handled.
    pub fn process_signals(&self) -> usize {
        let (signals, missed) = match self.navigation.lock().as_mut() {
            Some(stream) => stream.drain(),
            None => return 0,
        };
        if missed > 0 {
            warn!(missed, "Navigation signals lagged");
        }

        for signal in &signals {
            match signal {
                PlayerEvent::AdvanceRequested => self.advance(),
                PlayerEvent::RetreatRequested => self.retreat(),
                _ => {}
            }
        }
        signals.len()
    }

    fn emit(&self, event: PlayerEvent) {
        if self.bus.emit(event).is_err() {
            debug!("No listeners for player event");
        }
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn playlist(&self) -> Vec<Track> {
        self.state.lock().playlist.clone()
    }

    pub fn current_index(&self) -> usize {
        self.state.lock().index
    }

    pub fn current_track(&self) -> Option<Track> {
        let state = self.state.lock();
        state.playlist.get(state.index).cloned()
    }

    pub fn active_source(&self) -> Option<String> {
        self.state.lock().active_source.clone()
    }

    pub fn active_track_id(&self) -> Option<String> {
        self.state.lock().active_track.clone()
    }

    pub fn is_playing(&self) -> bool {
        self.state.lock().is_playing
    }

    /// Album title and type of the current playlist's first entry.
    pub fn album_context(&self) -> (Option<String>, AlbumType) {
        let state = self.state.lock();
        (state.album_title.clone(), state.album_type)
    }
}

impl std::fmt::Debug for PlaybackController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("PlaybackController")
            .field("outputs", &state.outputs.len())
            .field("playlist_len", &state.playlist.len())
            .field("index", &state.index)
            .field("active_source", &state.active_source)
            .field("is_playing", &state.is_playing)
            .finish()
    }
}
