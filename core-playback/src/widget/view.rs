//! Render model for the mini-player.
//!
//! The host draws this however it likes (DOM, native widgets, a test
//! assertion); the widget only ever mutates the model.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::track::Track;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayIcon {
    Play,
    Pause,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VolumeIcon {
    Mute,
    Down,
    Up,
}

impl VolumeIcon {
    pub fn for_volume(volume: f64) -> Self {
        if volume <= 0.0 {
            VolumeIcon::Mute
        } else if volume < 0.5 {
            VolumeIcon::Down
        } else {
            VolumeIcon::Up
        }
    }
}

/// Visual hint that the play control needs a user gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum AttentionCue {
    /// Continuous pulse until playback resumes (restored session).
    Pulse,
    /// Short flash after a blocked autoplay on load.
    Flash { until: DateTime<Utc> },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MiniPlayerView {
    pub visible: bool,
    pub title: String,
    pub title_href: Option<String>,
    pub artist: String,
    pub artist_href: Option<String>,
    pub cover_url: Option<String>,
    pub play_icon: PlayIcon,
    pub attention: Option<AttentionCue>,
    pub progress_percent: f64,
    pub current_time_label: String,
    pub duration_label: String,
    pub volume: f64,
    pub volume_icon: VolumeIcon,
    pub prev_enabled: bool,
    pub next_enabled: bool,
    /// Last media failure, shown instead of crashing.
    pub diagnostic: Option<String>,
}

impl Default for MiniPlayerView {
    fn default() -> Self {
        Self {
            visible: false,
            title: String::new(),
            title_href: None,
            artist: String::new(),
            artist_href: None,
            cover_url: None,
            play_icon: PlayIcon::Play,
            attention: None,
            progress_percent: 0.0,
            current_time_label: format_time(0.0),
            duration_label: format_time(0.0),
            volume: 1.0,
            volume_icon: VolumeIcon::Up,
            prev_enabled: false,
            next_enabled: false,
            diagnostic: None,
        }
    }
}

impl MiniPlayerView {
    pub(crate) fn show_track(&mut self, track: &Track) {
        self.visible = true;
        self.title = track.title.clone();
        self.title_href = Some(track.album_href());
        self.artist = track.artist.clone();
        self.artist_href = Some(track.artist_href());
        self.cover_url = Some(track.cover_image_url.clone());
        self.prev_enabled = true;
        self.next_enabled = true;
        self.diagnostic = None;
    }

    pub(crate) fn set_progress(&mut self, current: f64, duration: Option<f64>) {
        self.current_time_label = format_time(current);
        match duration.filter(|d| d.is_finite() && *d > 0.0) {
            Some(duration) => {
                self.duration_label = format_time(duration);
                self.progress_percent = if current.is_finite() {
                    (current / duration * 100.0).clamp(0.0, 100.0)
                } else {
                    0.0
                };
            }
            None => {
                self.duration_label = format_time(0.0);
                self.progress_percent = 0.0;
            }
        }
    }

    pub(crate) fn set_volume(&mut self, volume: f64) {
        self.volume = volume;
        self.volume_icon = VolumeIcon::for_volume(volume);
    }

    pub(crate) fn set_playing(&mut self, playing: bool) {
        self.play_icon = if playing {
            PlayIcon::Pause
        } else {
            PlayIcon::Play
        };
    }
}

/// `m:ss`; anything that is not a finite, non-negative number shows `0:00`.
pub fn format_time(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };
    format!("{}:{:02}", total / 60, total % 60)
}
