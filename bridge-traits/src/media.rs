//! Media output bridge trait and supporting types.
//!
//! A [`MediaElement`] is one physical audio output, modelled on the browser
//! `HTMLAudioElement`: it owns a source URL, a playhead, a volume and a
//! paused flag. Control calls return immediately; their asynchronous outcome
//! (playback actually starting, a play request being refused, the end of the
//! stream) is reported back to the owner as a [`MediaEvent`] by the host's
//! event plumbing.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::platform::PlatformSendSync;

/// Media error codes reported by the output, matching `MediaError.code`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaErrorCode {
    /// Fetching was aborted by the user agent.
    Aborted,
    /// A network error interrupted the download.
    Network,
    /// The resource could not be decoded.
    Decode,
    /// The source URL or its format is not supported.
    SourceNotSupported,
    /// Code not recognised by this bridge.
    Unknown(u16),
}

impl MediaErrorCode {
    /// Map a numeric `MediaError.code` value.
    pub fn from_code(code: u16) -> Self {
        match code {
            1 => Self::Aborted,
            2 => Self::Network,
            3 => Self::Decode,
            4 => Self::SourceNotSupported,
            other => Self::Unknown(other),
        }
    }

    /// Numeric value as exposed by the platform.
    pub fn code(&self) -> u16 {
        match self {
            Self::Aborted => 1,
            Self::Network => 2,
            Self::Decode => 3,
            Self::SourceNotSupported => 4,
            Self::Unknown(code) => *code,
        }
    }
}

/// Diagnostic detail for a failed load or decode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaErrorInfo {
    pub code: MediaErrorCode,
    pub message: String,
}

impl MediaErrorInfo {
    pub fn new(code: MediaErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for MediaErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "media error {}: {}", self.code.code(), self.message)
    }
}

/// Events raised by a media output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum MediaEvent {
    /// Duration and dimensions are known.
    MetadataLoaded {
        /// Stream duration in seconds, when finite.
        duration: Option<f64>,
    },
    /// Enough data is buffered to start playback.
    CanPlay,
    /// Playback actually started (play request fulfilled).
    Playing,
    /// A play request was refused by the platform, typically an autoplay
    /// policy waiting for a user gesture.
    PlayBlocked {
        /// Platform-provided reason.
        reason: String,
    },
    /// Playback paused.
    Paused,
    /// Periodic playhead update.
    TimeUpdate,
    /// The stream played to its end.
    Ended,
    /// Loading or decoding failed; details via [`MediaElement::error`].
    Error,
}

/// One physical audio output.
///
/// All methods are infallible from the caller's point of view: a broken
/// output surfaces through [`MediaEvent::Error`] and [`MediaElement::error`],
/// never through a panic or a returned error.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::media::MediaElement;
///
/// fn resume_at(media: &dyn MediaElement, url: &str, seconds: f64) {
///     media.set_source(url);
///     media.set_current_time(seconds);
///     media.request_play();
/// }
/// ```
pub trait MediaElement: PlatformSendSync {
    /// Replace the media source. Supersedes any load in flight.
    fn set_source(&self, url: &str);

    /// Currently assigned source, if any.
    fn source(&self) -> Option<String>;

    /// Ask the platform to start playback. The outcome arrives later as
    /// [`MediaEvent::Playing`] or [`MediaEvent::PlayBlocked`].
    fn request_play(&self);

    /// Pause playback.
    fn pause(&self);

    /// Whether the output is currently paused.
    fn is_paused(&self) -> bool;

    /// Playhead position in seconds.
    fn current_time(&self) -> f64;

    /// Move the playhead.
    fn set_current_time(&self, seconds: f64);

    /// Stream duration in seconds, `None` until metadata is known.
    fn duration(&self) -> Option<f64>;

    /// Output volume in `0.0..=1.0`.
    fn volume(&self) -> f64;

    /// Set output volume in `0.0..=1.0`.
    fn set_volume(&self, volume: f64);

    /// Last load/decode error, if any.
    fn error(&self) -> Option<MediaErrorInfo>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn media_error_code_mapping() {
        assert_eq!(MediaErrorCode::from_code(3), MediaErrorCode::Decode);
        assert_eq!(MediaErrorCode::from_code(4).code(), 4);
        assert_eq!(MediaErrorCode::from_code(9), MediaErrorCode::Unknown(9));
    }

    #[test]
    fn media_error_display_includes_code() {
        let info = MediaErrorInfo::new(MediaErrorCode::Network, "connection reset");
        assert_eq!(info.to_string(), "media error 2: connection reset");
    }

    #[test]
    fn media_event_serializes_tagged() {
        let json = serde_json::to_string(&MediaEvent::PlayBlocked {
            reason: "NotAllowedError".into(),
        })
        .unwrap();
        assert!(json.contains(r#""event":"PlayBlocked""#));
    }
}
