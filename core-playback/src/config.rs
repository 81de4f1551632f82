//! # Player Configuration
//!
//! Timing and wiring knobs for the controller and the mini-player widget.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{PlaybackError, Result};

/// Player configuration.
///
/// All timers are evaluated against the injected clock, so tests can drive
/// them deterministically.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerConfig {
    /// Output id the mini-player registers under.
    ///
    /// Default: `"mini-player"`.
    #[serde(default = "default_output_id")]
    pub output_id: String,

    /// Window after widget initialisation during which play/pause clicks
    /// are swallowed.
    ///
    /// Default: 1.5 seconds.
    #[serde(default = "default_play_button_cooldown")]
    pub play_button_cooldown: Duration,

    /// Minimum spacing between playback-offset writes while playing.
    ///
    /// Default: 500 ms.
    #[serde(default = "default_position_persist_interval")]
    pub position_persist_interval: Duration,

    /// Fallback trigger for completing a restore when metadata never loads.
    ///
    /// Default: 2 seconds.
    #[serde(default = "default_restore_safety_timeout")]
    pub restore_safety_timeout: Duration,

    /// Polling interval while a restore waits for the controller.
    ///
    /// Default: 500 ms.
    #[serde(default = "default_controller_retry_interval")]
    pub controller_retry_interval: Duration,

    /// How long the play control flashes after an autoplay block.
    ///
    /// Default: 2 seconds.
    #[serde(default = "default_attention_duration")]
    pub attention_duration: Duration,

    /// Base path of the track metadata API.
    ///
    /// Default: `"/api/track"`.
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// When a track is selected by id, load the whole returned album list
    /// instead of a single-track playlist.
    ///
    /// Default: false.
    #[serde(default)]
    pub select_loads_album: bool,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            output_id: default_output_id(),
            play_button_cooldown: default_play_button_cooldown(),
            position_persist_interval: default_position_persist_interval(),
            restore_safety_timeout: default_restore_safety_timeout(),
            controller_retry_interval: default_controller_retry_interval(),
            attention_duration: default_attention_duration(),
            api_base: default_api_base(),
            select_loads_album: false,
        }
    }
}

impl PlayerConfig {
    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        if self.output_id.trim().is_empty() {
            return Err(PlaybackError::InvalidConfig(
                "output_id must not be empty".to_string(),
            ));
        }

        if self.position_persist_interval.is_zero() {
            return Err(PlaybackError::InvalidConfig(
                "position_persist_interval must be > 0".to_string(),
            ));
        }

        if self.controller_retry_interval.is_zero() {
            return Err(PlaybackError::InvalidConfig(
                "controller_retry_interval must be > 0".to_string(),
            ));
        }

        if !self.api_base.starts_with('/') && !self.api_base.contains("://") {
            return Err(PlaybackError::InvalidConfig(format!(
                "api_base must be an absolute path or URL, got '{}'",
                self.api_base
            )));
        }

        Ok(())
    }

    /// URL of the metadata endpoint for one track.
    pub fn track_url(&self, track_id: &str) -> String {
        format!(
            "{}/{}",
            self.api_base.trim_end_matches('/'),
            urlencoding::encode(track_id)
        )
    }
}

// ============================================================================
// Default Functions (for serde)
// ============================================================================

fn default_output_id() -> String {
    "mini-player".to_string()
}

fn default_play_button_cooldown() -> Duration {
    Duration::from_millis(1500)
}

fn default_position_persist_interval() -> Duration {
    Duration::from_millis(500)
}

fn default_restore_safety_timeout() -> Duration {
    Duration::from_secs(2)
}

fn default_controller_retry_interval() -> Duration {
    Duration::from_millis(500)
}

fn default_attention_duration() -> Duration {
    Duration::from_secs(2)
}

fn default_api_base() -> String {
    "/api/track".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = PlayerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.output_id, "mini-player");
        assert_eq!(config.play_button_cooldown, Duration::from_millis(1500));
    }

    #[test]
    fn test_missing_fields_take_defaults() {
        let config: PlayerConfig =
            serde_json::from_str(r#"{"api_base":"https://music.example/api/track"}"#).unwrap();

        assert_eq!(config.api_base, "https://music.example/api/track");
        assert_eq!(config.position_persist_interval, Duration::from_millis(500));
        assert!(!config.select_loads_album);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_config() {
        let config = PlayerConfig {
            position_persist_interval: Duration::ZERO,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(PlaybackError::InvalidConfig(_))
        ));

        let config = PlayerConfig {
            api_base: "api/track".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_track_url_encodes_id() {
        let config = PlayerConfig::default();
        assert_eq!(config.track_url("42"), "/api/track/42");
        assert_eq!(config.track_url("a b"), "/api/track/a%20b");
    }
}
