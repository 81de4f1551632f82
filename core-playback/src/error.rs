//! # Playback Error Types
//!
//! Error types for the player's fallible internals. Public controller and
//! widget operations never surface these; they log and degrade instead.

use bridge_traits::error::BridgeError;
use thiserror::Error;

/// Errors that can occur inside playback operations.
#[derive(Error, Debug)]
pub enum PlaybackError {
    // ========================================================================
    // Track Metadata Errors
    // ========================================================================
    /// The track API has no track with this id.
    #[error("Track not found: {0}")]
    TrackNotFound(String),

    /// Fetching track metadata failed at the transport or HTTP level.
    #[error("Network error: {0}")]
    Network(String),

    /// The track API answered with a body we cannot decode.
    #[error("Invalid track API response: {0}")]
    InvalidResponse(String),

    // ========================================================================
    // Persisted State Errors
    // ========================================================================
    /// A persisted record could not be decoded or lacks a required field.
    #[error("Malformed persisted state under '{key}': {reason}")]
    MalformedState { key: String, reason: String },

    // ========================================================================
    // Platform/Adapter Errors
    // ========================================================================
    /// A host bridge (storage, HTTP) reported a failure.
    #[error("Bridge error: {0}")]
    Bridge(#[from] BridgeError),

    // ========================================================================
    // Generic Errors
    // ========================================================================
    /// Player configuration failed validation.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Internal error (should not occur in normal operation).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PlaybackError {
    /// Returns `true` if this error is due to network issues.
    pub fn is_network_error(&self) -> bool {
        matches!(self, PlaybackError::Network(_))
    }

    /// Returns `true` if this error came from unreadable persisted state.
    pub fn is_malformed_state(&self) -> bool {
        matches!(self, PlaybackError::MalformedState { .. })
    }

    pub(crate) fn malformed(key: &str, reason: impl Into<String>) -> Self {
        PlaybackError::MalformedState {
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result type for playback operations.
pub type Result<T> = std::result::Result<T, PlaybackError>;
