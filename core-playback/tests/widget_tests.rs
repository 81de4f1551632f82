//! Mini-player behaviour against a fake audio output

mod common;

use bridge_traits::media::{MediaElement, MediaErrorCode, MediaErrorInfo, MediaEvent};
use common::{playlist, track, FakeMedia, Harness};
use core_playback::persistence::keys;
use core_playback::widget::{AttentionCue, PlayIcon};
use core_playback::{Gesture, RestoreOutcome, WidgetState};
use std::sync::Arc;

const PLAYING_SESSION: &str =
    r#"{"id":"9","src":"/track/9","title":"Nine","artist":"Band","currentTime":30.0,"isPlaying":true}"#;

fn blocked() -> MediaEvent {
    MediaEvent::PlayBlocked {
        reason: "NotAllowedError".to_string(),
    }
}

/// A page with one track loaded and playing.
fn playing_harness() -> Harness {
    let mut h = Harness::new();
    h.page.start();
    h.page.controller().load_playlist(playlist(&["One", "Two"]), 0);
    h.page.pump();
    h.media.start_playing();
    h.page.media_event(MediaEvent::Playing);
    h
}

// ============================================================================
// Session Restore
// ============================================================================

#[test]
fn restore_resumes_at_saved_offset_then_waits_for_gesture() {
    let mut h = Harness::with_entries(&[(keys::CURRENT_TRACK, PLAYING_SESSION)]);
    let outcome = h.page.start();

    assert_eq!(
        outcome,
        Some(RestoreOutcome::Restored {
            track_id: "9".to_string()
        })
    );
    assert!(h.page.widget().view().visible);
    assert_eq!(h.page.widget().view().title, "Nine");
    assert_eq!(h.media.source().as_deref(), Some("/track/9"));
    assert_eq!(h.media.seeks(), vec![30.0]);
    assert_eq!(h.media.play_requests(), 1);

    h.page.media_event(blocked());
    assert_eq!(h.page.widget().view().attention, Some(AttentionCue::Pulse));
    assert!(h.page.widget().awaiting_gesture());

    assert!(h.page.user_gesture(Gesture::Click));
    assert_eq!(h.media.seeks(), vec![30.0, 30.0]);
    assert_eq!(h.media.play_requests(), 2);

    // only the first gesture resumes
    assert!(!h.page.user_gesture(Gesture::KeyPress));
    assert_eq!(h.media.play_requests(), 2);

    h.media.start_playing();
    h.page.media_event(MediaEvent::Playing);
    assert_eq!(h.page.widget().view().attention, None);
    assert_eq!(h.page.widget().state(), WidgetState::Ready { playing: true });
}

#[test]
fn restore_waits_for_controller_and_completes_once() {
    let mut h = Harness::with_entries(&[(keys::CURRENT_TRACK, PLAYING_SESSION)]);
    let controller = h.page.controller().clone();

    let outcome = h.page.widget_mut().initialize();
    assert!(matches!(outcome, Some(RestoreOutcome::Restored { .. })));
    assert!(h.page.widget().restore_pending());
    assert!(h.media.seeks().is_empty());

    // retry fires but the controller is still missing
    h.clock.advance_millis(500);
    h.page.tick();
    assert!(h.page.widget().restore_pending());
    assert_eq!(h.media.play_requests(), 0);

    h.page.widget_mut().attach_controller(controller);
    h.page.media_event(MediaEvent::MetadataLoaded {
        duration: Some(200.0),
    });
    assert!(!h.page.widget().restore_pending());
    assert_eq!(h.media.seeks(), vec![30.0]);
    assert_eq!(h.media.play_requests(), 1);

    // safety timeout after completion is a no-op
    h.clock.advance_millis(2_500);
    h.page.tick();
    assert_eq!(h.media.seeks(), vec![30.0]);
    assert_eq!(h.media.play_requests(), 1);
}

#[test]
fn paused_session_restores_without_play_request() {
    let mut h = Harness::with_entries(&[
        (
            keys::CURRENT_TRACK,
            r#"{"id":"4","src":"/track/4","currentTime":65}"#,
        ),
        (keys::PLAYER_STATE, "paused"),
    ]);
    h.page.start();

    assert_eq!(h.media.seeks(), vec![65.0]);
    assert_eq!(h.media.play_requests(), 0);
    assert_eq!(h.page.widget().view().current_time_label, "1:05");
    assert_eq!(h.page.widget().view().play_icon, PlayIcon::Play);
}

#[test]
fn session_without_id_still_restores() {
    let mut h = Harness::with_entries(&[(
        keys::CURRENT_TRACK,
        r#"{"src":"/track/5","title":"Five","currentTime":12.5,"isPlaying":false}"#,
    )]);
    let outcome = h.page.start();

    assert_eq!(
        outcome,
        Some(RestoreOutcome::Restored {
            track_id: "unknown".to_string()
        })
    );
    assert!(h.page.widget().view().visible);
    assert_eq!(h.page.widget().view().title, "Five");
    assert_eq!(h.media.source().as_deref(), Some("/track/5"));
    assert_eq!(h.media.seeks(), vec![12.5]);
    assert_eq!(h.store.json(keys::CURRENT_TRACK)["src"], "/track/5");

    // pressing play resumes from the saved offset
    h.clock.advance_millis(2_000);
    h.page.toggle_play_pause();
    assert_eq!(h.media.seeks(), vec![12.5, 12.5]);
    assert_eq!(h.media.play_requests(), 1);
}

// ============================================================================
// Load & Media Events
// ============================================================================

#[test]
fn blocked_autoplay_on_load_flashes_for_two_seconds() {
    let mut h = Harness::new();
    h.page.start();
    h.page.controller().load_playlist(playlist(&["Fresh"]), 0);
    h.page.pump();
    assert_eq!(h.media.play_requests(), 1);

    h.page.media_event(blocked());
    assert!(matches!(
        h.page.widget().view().attention,
        Some(AttentionCue::Flash { .. })
    ));

    h.clock.advance_millis(1_999);
    h.page.tick();
    assert!(h.page.widget().view().attention.is_some());

    h.clock.advance_millis(1);
    h.page.tick();
    assert_eq!(h.page.widget().view().attention, None);

    // the gesture gate outlives the cue
    assert!(h.page.user_gesture(Gesture::Touch));
    assert_eq!(h.media.play_requests(), 2);
}

#[test]
fn load_persists_session_meta_and_state() {
    let mut h = Harness::new();
    h.page.start();
    let mut tracks = playlist(&["Opener"]);
    tracks[0].album_title = "Debut".to_string();
    h.page.controller().load_playlist(tracks, 0);
    h.page.pump();

    let session = h.store.json(keys::CURRENT_TRACK);
    assert_eq!(session["id"], "1");
    assert_eq!(session["src"], "/track/1");
    assert_eq!(h.store.json(keys::LAST_LOADED_TRACK_META)["albumTitle"], "Debut");
    assert_eq!(h.store.raw(keys::PLAYER_STATE).as_deref(), Some("playing"));
    assert_eq!(h.page.widget().view().title_href.as_deref(), Some("/a/album/Test%20Artist/Debut"));
}

#[test]
fn media_error_empties_widget_with_diagnostic() {
    let mut h = Harness::new();
    h.page.start();
    h.page.controller().load_playlist(playlist(&["Broken"]), 0);
    h.page.pump();

    h.media
        .fail_with(MediaErrorInfo::new(MediaErrorCode::Network, "connection reset"));
    h.page.media_event(MediaEvent::Error);

    assert_eq!(h.page.widget().state(), WidgetState::Empty);
    let diagnostic = h.page.widget().view().diagnostic.clone().unwrap();
    assert!(diagnostic.contains("/track/1"), "{diagnostic}");

    h.clock.advance_millis(2_000);
    let before = h.media.play_requests();
    h.page.toggle_play_pause();
    assert_eq!(h.media.play_requests(), before);
}

#[test]
fn ended_track_advances_to_next() {
    let mut h = playing_harness();
    h.page.media_event(MediaEvent::Ended);

    assert_eq!(h.page.controller().current_index(), 1);
    assert_eq!(h.page.widget().current_track().unwrap().id, "2");
    assert_eq!(h.media.source().as_deref(), Some("/track/2"));
    assert_eq!(h.media.play_requests(), 2);
    assert_eq!(h.page.widget().state(), WidgetState::Loading);
}

// ============================================================================
// Transport Controls
// ============================================================================

#[test]
fn drag_seek_commits_a_single_seek() {
    let mut h = playing_harness();
    h.media.set_duration(200.0);
    h.media.set_position(20.0);

    let widget = h.page.widget_mut();
    widget.begin_seek();
    widget.update_seek(0.25);
    widget.update_seek(0.5);
    assert_eq!(widget.view().current_time_label, "1:40");
    assert!(h.media.seeks().is_empty());

    // playhead updates do not fight the drag
    h.page.media_event(MediaEvent::TimeUpdate);
    assert_eq!(h.page.widget().view().current_time_label, "1:40");

    h.page.widget_mut().end_seek();
    assert_eq!(h.media.seeks(), vec![100.0]);
    assert_eq!(h.page.widget().view().progress_percent, 50.0);
}

#[test]
fn toggle_pause_persists_paused_session() {
    let mut h = playing_harness();
    h.clock.advance_millis(2_000);
    h.media.set_position(42.0);

    h.page.toggle_play_pause();

    assert!(h.media.is_paused());
    assert_eq!(h.page.widget().state(), WidgetState::Ready { playing: false });
    assert_eq!(h.page.widget().view().play_icon, PlayIcon::Play);
    assert_eq!(h.store.raw(keys::PLAYER_STATE).as_deref(), Some("paused"));
    let session = h.store.json(keys::CURRENT_TRACK);
    assert_eq!(session["isPlaying"], false);
    assert_eq!(session["currentTime"], 42.0);
    assert!(!h.page.controller().is_playing());
}

#[test]
fn volume_is_persisted_and_applied_after_reload() {
    let mut h = Harness::new();
    h.page.start();
    h.page.widget_mut().set_volume(0.3);
    assert_eq!(h.media.volume(), 0.3);
    assert_eq!(h.store.raw(keys::PLAYER_VOLUME).as_deref(), Some("0.3"));

    let mut reloaded = h.reload();
    reloaded.page.start();
    assert_eq!(reloaded.media.volume(), 0.3);
    assert_eq!(reloaded.page.widget().view().volume, 0.3);
}

#[test]
fn another_output_starting_pauses_this_one() {
    let mut h = playing_harness();
    let other = Arc::new(FakeMedia::new());
    let controller = h.page.controller().clone();
    controller.register_output("preview", other.clone());

    let preview = track(5, "Preview");
    other.set_source(&preview.audio_url);
    controller.request_play("preview", &preview, other.as_ref());
    h.page.pump();

    assert!(h.media.is_paused());
    assert_eq!(h.media.pauses(), 1);
    assert_eq!(controller.active_source().as_deref(), Some("preview"));

    // the platform reports the pause back
    h.page.media_event(MediaEvent::Paused);
    assert_eq!(h.page.widget().state(), WidgetState::Ready { playing: false });
    assert_eq!(controller.active_source().as_deref(), Some("preview"));
    assert_eq!(h.store.json(keys::CURRENT_TRACK)["id"], "5");
}
