//! # Mini-Player Widget
//!
//! Owns the physical audio output and its transport UI. Translates
//! controller decisions into media loads and media events into controller
//! notifications.
//!
//! ## State Machine
//!
//! ```text
//! Empty ──load/restore──> Loading ──metadata──> Ready(paused) <──> Ready(playing)
//!   ^                        ^                                         │
//!   │ error                  └──────── next LoadTrack ── Ended <───────┘
//! ```
//!
//! `Ended` immediately emits an advance signal; the controller answers with a
//! load for the next track.
//!
//! ## Timers
//!
//! The widget never sleeps. The host calls [`MiniPlayerWidget::tick`]
//! periodically, and every deadline (restore safety timeout, controller
//! retry, attention cue expiry, position persistence) is evaluated against
//! the injected [`Clock`].
//!
//! ## Autoplay
//!
//! Play requests are best-effort. When the platform refuses one, the play
//! control gets an attention cue and the first user gesture resumes from the
//! persisted offset.

mod view;

pub use view::{format_time, AttentionCue, MiniPlayerView, PlayIcon, VolumeIcon};

use bridge_traits::media::{MediaElement, MediaEvent};
use bridge_traits::time::Clock;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::config::PlayerConfig;
use crate::controller::PlaybackController;
use crate::events::{PlayerEvent, PlayerEventBus, PlayerEventStream};
use crate::persistence::{
    warn_on_failure, LastLoadedMeta, PlaybackSession, PlaybackStore, PlayerState,
};
use crate::track::Track;

/// Lifecycle state of the widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidgetState {
    Empty,
    Loading,
    Ready { playing: bool },
    Ended,
}

/// Result of looking for a persisted session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestoreOutcome {
    NothingToRestore,
    Restored { track_id: String },
}

/// What caused a restore completion attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoreTrigger {
    Immediate,
    MetadataLoaded,
    SafetyTimeout,
    Retry,
}

/// User interactions that count as a gesture for autoplay purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gesture {
    Click,
    KeyPress,
    Touch,
}

/// Who asked for the outstanding play request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PlayOrigin {
    Load,
    Restore,
    Gesture,
    User,
}

struct PendingRestore {
    session: PlaybackSession,
    resume: bool,
    safety_deadline: DateTime<Utc>,
    next_retry: Option<DateTime<Utc>>,
}

/// The mini-player.
pub struct MiniPlayerWidget {
    config: PlayerConfig,
    media: Arc<dyn MediaElement>,
    store: PlaybackStore,
    clock: Arc<dyn Clock>,
    bus: PlayerEventBus,
    events: PlayerEventStream,
    controller: Option<Arc<PlaybackController>>,

    state: WidgetState,
    track: Option<Track>,
    view: MiniPlayerView,

    initialized_at: Option<DateTime<Utc>>,
    pending_restore: Option<PendingRestore>,
    play_origin: Option<PlayOrigin>,
    awaiting_gesture: bool,
    seek_fraction: Option<f64>,
    last_position_write: Option<DateTime<Utc>>,
}

impl MiniPlayerWidget {
    pub fn new(
        config: PlayerConfig,
        media: Arc<dyn MediaElement>,
        store: PlaybackStore,
        clock: Arc<dyn Clock>,
        bus: PlayerEventBus,
    ) -> Self {
        let events = bus.stream().filter(|event| {
            matches!(
                event,
                PlayerEvent::LoadTrack { .. } | PlayerEvent::PlaybackStarted { .. }
            )
        });

        Self {
            config,
            media,
            store,
            clock,
            bus,
            events,
            controller: None,
            state: WidgetState::Empty,
            track: None,
            view: MiniPlayerView::default(),
            initialized_at: None,
            pending_restore: None,
            play_origin: None,
            awaiting_gesture: false,
            seek_fraction: None,
            last_position_write: None,
        }
    }

    pub fn output_id(&self) -> &str {
        &self.config.output_id
    }

    pub fn state(&self) -> WidgetState {
        self.state
    }

    pub fn view(&self) -> &MiniPlayerView {
        &self.view
    }

    pub fn current_track(&self) -> Option<&Track> {
        self.track.as_ref()
    }

    pub fn media(&self) -> &Arc<dyn MediaElement> {
        &self.media
    }

    /// Whether a blocked play request is waiting for a user gesture.
    pub fn awaiting_gesture(&self) -> bool {
        self.awaiting_gesture
    }

    pub fn restore_pending(&self) -> bool {
        self.pending_restore.is_some()
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Start the cooldown window, apply the saved volume and restore any
    /// persisted session. Returns `None` when already initialized.
    pub fn initialize(&mut self) -> Option<RestoreOutcome> {
        if self.initialized_at.is_some() {
            debug!("Widget already initialized");
            return None;
        }
        self.initialized_at = Some(self.clock.now());

        let volume = self.store.volume();
        self.media.set_volume(volume);
        self.view.set_volume(volume);

        Some(self.restore_session())
    }

    /// Show the persisted session and schedule its completion.
    ///
    /// Display and media source are applied synchronously; offset and resume
    /// wait until the controller is attached.
    pub fn restore_session(&mut self) -> RestoreOutcome {
        let Some(mut session) = self.store.session() else {
            debug!("No session to restore");
            return RestoreOutcome::NothingToRestore;
        };
        session.patch_album(&self.store.last_loaded_meta());

        let resume = session
            .is_playing_intent
            .or_else(|| {
                self.store
                    .player_state()
                    .map(|state| state == PlayerState::Playing)
            })
            .unwrap_or(false);

        let track = session.to_track();
        self.media.set_source(&session.src);
        self.view.show_track(&track);
        self.view.set_progress(session.offset(), None);
        self.state = WidgetState::Loading;
        info!(track_id = %track.id, resume, offset = session.offset(), "Restoring session");

        let track_id = track.id.clone();
        self.track = Some(track);

        let now = self.clock.now();
        self.pending_restore = Some(PendingRestore {
            session,
            resume,
            safety_deadline: deadline(now, self.config.restore_safety_timeout),
            next_retry: None,
        });
        self.complete_restore(RestoreTrigger::Immediate);

        RestoreOutcome::Restored { track_id }
    }

    /// Finish a pending restore: seek to the saved offset and, if it was
    /// playing, try to resume.
    ///
    /// Only the first trigger that finds the controller attached has an
    /// effect. Returns whether this call completed the restore.
    pub fn complete_restore(&mut self, trigger: RestoreTrigger) -> bool {
        if self.pending_restore.is_none() {
            return false;
        }

        if self.controller.is_none() {
            let retry_at = deadline(self.clock.now(), self.config.controller_retry_interval);
            if let Some(pending) = self.pending_restore.as_mut() {
                pending.next_retry = Some(retry_at);
            }
            debug!(?trigger, "Controller not available, retrying restore later");
            return false;
        }

        let Some(pending) = self.pending_restore.take() else {
            return false;
        };

        let offset = pending.session.offset();
        if offset > 0.0 {
            self.media.set_current_time(offset);
        }
        self.view.set_progress(offset, self.media.duration());
        self.view.set_playing(false);
        info!(?trigger, offset, resume = pending.resume, "Restore completed");

        if pending.resume {
            self.request_play(PlayOrigin::Restore);
        }
        true
    }

    // ========================================================================
    // Controller Wiring
    // ========================================================================

    /// Register this widget's output with the controller.
    pub fn attach_controller(&mut self, controller: Arc<PlaybackController>) {
        controller.register_output(&self.config.output_id, self.media.clone());
        self.controller = Some(controller);
    }

    /// Load and try to play a track.
    pub fn load_track(&mut self, track: Track) {
        let track = track.canonicalized();
        info!(track_id = %track.id, title = %track.title, "Loading track");

        self.pending_restore = None;
        self.awaiting_gesture = false;
        self.seek_fraction = None;
        self.view.attention = None;

        self.media.set_source(&track.audio_url);
        self.view.show_track(&track);
        self.view.set_progress(0.0, None);
        self.view.set_playing(false);
        self.state = WidgetState::Loading;

        warn_on_failure(
            self.store.save_last_loaded_meta(&LastLoadedMeta {
                album_type: Some(track.album_type),
                album_title: Some(track.album_title.clone()),
            }),
            "last loaded meta",
        );
        warn_on_failure(
            self.store.save_session(&PlaybackSession::for_track(&track)),
            "session on load",
        );
        warn_on_failure(
            self.store.save_player_state(PlayerState::Playing),
            "player state",
        );

        self.track = Some(track);
        self.request_play(PlayOrigin::Load);
    }

    fn request_play(&mut self, origin: PlayOrigin) {
        self.play_origin = Some(origin);
        self.media.request_play();
    }

    // ========================================================================
    // Media Events
    // ========================================================================

    pub fn handle_media_event(&mut self, event: MediaEvent) {
        match event {
            MediaEvent::MetadataLoaded { duration } => {
                self.view.set_progress(self.media.current_time(), duration);
                if self.state == WidgetState::Loading {
                    self.state = WidgetState::Ready { playing: false };
                }
                self.complete_restore(RestoreTrigger::MetadataLoaded);
            }
            MediaEvent::CanPlay => {
                if self.state == WidgetState::Loading {
                    self.state = WidgetState::Ready { playing: false };
                }
            }
            MediaEvent::Playing => self.on_playing(),
            MediaEvent::PlayBlocked { reason } => self.on_play_blocked(&reason),
            MediaEvent::Paused => self.on_paused(),
            MediaEvent::TimeUpdate => {
                if self.seek_fraction.is_none() {
                    self.view
                        .set_progress(self.media.current_time(), self.media.duration());
                }
                self.persist_position();
            }
            MediaEvent::Ended => {
                debug!("Track ended, requesting advance");
                self.state = WidgetState::Ended;
                self.view.set_playing(false);
                self.emit(PlayerEvent::AdvanceRequested);
            }
            MediaEvent::Error => self.on_error(),
        }
    }

    fn on_playing(&mut self) {
        self.play_origin = None;
        self.awaiting_gesture = false;
        self.view.attention = None;
        self.view.set_playing(true);
        self.state = WidgetState::Ready { playing: true };
        warn_on_failure(
            self.store.save_player_state(PlayerState::Playing),
            "player state",
        );

        if let (Some(controller), Some(track)) = (&self.controller, &self.track) {
            controller.request_play(&self.config.output_id, track, self.media.as_ref());
        }
    }

    fn on_play_blocked(&mut self, reason: &str) {
        let origin = self.play_origin.take();
        warn!(reason, ?origin, "Playback blocked, waiting for user gesture");
        self.view.set_playing(false);
        if matches!(self.state, WidgetState::Loading | WidgetState::Ready { .. }) {
            self.state = WidgetState::Ready { playing: false };
        }

        match origin {
            Some(PlayOrigin::Load) => {
                let until = deadline(self.clock.now(), self.config.attention_duration);
                self.view.attention = Some(AttentionCue::Flash { until });
                self.awaiting_gesture = true;
            }
            Some(PlayOrigin::Restore) | Some(PlayOrigin::Gesture) => {
                self.view.attention = Some(AttentionCue::Pulse);
                self.awaiting_gesture = true;
            }
            Some(PlayOrigin::User) | None => {}
        }
    }

    fn on_paused(&mut self) {
        self.view.set_playing(false);
        if self.state != (WidgetState::Ready { playing: true }) {
            return;
        }
        self.state = WidgetState::Ready { playing: false };

        warn_on_failure(
            self.store.save_player_state(PlayerState::Paused),
            "player state",
        );
        self.write_position();
        if let Some(controller) = &self.controller {
            controller.request_pause(&self.config.output_id);
        }
    }

    fn on_error(&mut self) {
        let source = self.media.source().unwrap_or_default();
        let diagnostic = match self.media.error() {
            Some(info) => {
                error!(source = %source, code = info.code.code(), message = %info.message, "Media error");
                format!("{info} ({source})")
            }
            None => {
                error!(source = %source, "Media error without details");
                format!("media error ({source})")
            }
        };
        self.view.diagnostic = Some(diagnostic);
        self.view.set_playing(false);
        self.state = WidgetState::Empty;
        self.play_origin = None;
        self.pending_restore = None;
    }

    // ========================================================================
    // Timers & Gestures
    // ========================================================================

    /// Evaluate every timer against the clock.
    pub fn tick(&mut self) {
        let now = self.clock.now();

        let (retry_due, safety_due) = match &self.pending_restore {
            Some(pending) => (
                pending.next_retry.is_some_and(|at| now >= at),
                now >= pending.safety_deadline,
            ),
            None => (false, false),
        };
        if safety_due {
            self.complete_restore(RestoreTrigger::SafetyTimeout);
        } else if retry_due {
            self.complete_restore(RestoreTrigger::Retry);
        }

        if let Some(AttentionCue::Flash { until }) = self.view.attention {
            if now >= until {
                self.view.attention = None;
            }
        }

        self.persist_position();
    }

    /// Feed a user gesture. The first one after a blocked play resumes from
    /// the persisted offset; returns whether it was consumed.
    pub fn on_user_gesture(&mut self, gesture: Gesture) -> bool {
        if !self.awaiting_gesture {
            return false;
        }
        self.awaiting_gesture = false;
        debug!(?gesture, "Resuming playback after user gesture");

        self.seek_to_saved_offset();
        self.request_play(PlayOrigin::Gesture);
        true
    }

    fn seek_to_saved_offset(&self) {
        let Some(track) = &self.track else {
            return;
        };
        if let Some(session) = self.store.session() {
            if session.track_id() == track.id && session.offset() > 0.0 {
                self.media.set_current_time(session.offset());
            }
        }
    }

    // ========================================================================
    // Transport Controls
    // ========================================================================

    /// Play/pause button. Ignored during the post-initialization cooldown.
    pub fn toggle_play_pause(&mut self) {
        if let Some(started) = self.initialized_at {
            if elapsed(started, self.clock.now()) < self.config.play_button_cooldown {
                debug!("Play button on cooldown, ignoring click");
                return;
            }
        }
        if self.track.is_none() || self.state == WidgetState::Empty {
            debug!("Nothing loaded, ignoring play/pause");
            return;
        }

        if self.media.is_paused() {
            self.seek_to_saved_offset();
            self.request_play(PlayOrigin::User);
        } else {
            self.media.pause();
            self.on_paused();
        }
    }

    pub fn request_next(&self) {
        self.emit(PlayerEvent::AdvanceRequested);
    }

    pub fn request_previous(&self) {
        self.emit(PlayerEvent::RetreatRequested);
    }

    pub fn begin_seek(&mut self) {
        let fraction = match self.media.duration() {
            Some(duration) if duration > 0.0 => self.media.current_time() / duration,
            _ => 0.0,
        };
        self.seek_fraction = Some(fraction.clamp(0.0, 1.0));
    }

    /// While dragging only the displayed time moves.
    pub fn update_seek(&mut self, fraction: f64) {
        if self.seek_fraction.is_none() {
            return;
        }
        let fraction = if fraction.is_finite() {
            fraction.clamp(0.0, 1.0)
        } else {
            0.0
        };
        self.seek_fraction = Some(fraction);
        let duration = self.media.duration();
        self.view
            .set_progress(fraction * duration.unwrap_or(0.0), duration);
    }

    /// Commit the drag with a single seek.
    pub fn end_seek(&mut self) {
        let Some(fraction) = self.seek_fraction.take() else {
            return;
        };
        match self.media.duration().filter(|d| d.is_finite() && *d > 0.0) {
            Some(duration) => {
                let target = fraction * duration;
                debug!(target, "Seeking");
                self.media.set_current_time(target);
                self.view.set_progress(target, Some(duration));
            }
            None => debug!("Seek released before duration was known"),
        }
    }

    pub fn set_volume(&mut self, volume: f64) {
        let volume = if volume.is_finite() {
            volume.clamp(0.0, 1.0)
        } else {
            1.0
        };
        self.media.set_volume(volume);
        self.view.set_volume(volume);
        warn_on_failure(self.store.save_volume(volume), "volume");
    }

    // ========================================================================
    // Bus
    // ========================================================================

    /// Handle loads addressed to this output and playback started elsewhere.
    pub fn process_events(&mut self) -> usize {
        let (events, missed) = self.events.drain();
        if missed > 0 {
            warn!(missed, "Widget event stream lagged");
        }

        for event in &events {
            match event {
                PlayerEvent::LoadTrack {
                    output_id, track, ..
                } if *output_id == self.config.output_id => self.load_track(track.clone()),
                PlayerEvent::PlaybackStarted { source, .. }
                    if *source != self.config.output_id && !self.media.is_paused() =>
                {
                    debug!(source = %source, "Another output started, pausing");
                    self.media.pause();
                    self.on_paused();
                }
                _ => {}
            }
        }
        events.len()
    }

    fn emit(&self, event: PlayerEvent) {
        if self.bus.emit(event).is_err() {
            debug!("No listeners for player event");
        }
    }

    // ========================================================================
    // Position Persistence
    // ========================================================================

    /// Write the playhead into the session at most once per interval while
    /// playing.
    fn persist_position(&mut self) {
        if self.media.is_paused() {
            return;
        }
        let now = self.clock.now();
        if let Some(last) = self.last_position_write {
            if elapsed(last, now) < self.config.position_persist_interval {
                return;
            }
        }
        self.last_position_write = Some(now);
        self.write_position();
    }

    fn write_position(&self) {
        let Some(mut session) = self.store.session() else {
            return;
        };
        if self.track.as_ref().is_some_and(|track| track.id != session.track_id()) {
            return;
        }
        session.current_time_seconds = Some(self.media.current_time());
        session.patch_album(&self.store.last_loaded_meta());
        warn_on_failure(self.store.save_session(&session), "playback position");
    }
}

fn deadline(now: DateTime<Utc>, after: Duration) -> DateTime<Utc> {
    chrono::Duration::from_std(after)
        .ok()
        .and_then(|delta| now.checked_add_signed(delta))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

fn elapsed(since: DateTime<Utc>, now: DateTime<Utc>) -> Duration {
    (now - since).to_std().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_deadline_and_elapsed() {
        let start = Utc.timestamp_millis_opt(1_000).unwrap();
        let due = deadline(start, Duration::from_millis(500));

        assert_eq!(elapsed(start, due), Duration::from_millis(500));
        // clock moving backwards reads as no time passed
        assert_eq!(elapsed(due, start), Duration::ZERO);
        assert_eq!(deadline(start, Duration::MAX), DateTime::<Utc>::MAX_UTC);
    }
}
