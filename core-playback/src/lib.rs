//! # Persistent Playback Module
//!
//! A page-scoped playback controller and mini-player whose state survives
//! full-page navigation through a host key-value store.
//!
//! ## Overview
//!
//! This module handles:
//! - Track canonicalisation for every producer shape (DOM, API, storage)
//! - Play/pause arbitration across registered outputs
//! - Playlist traversal with wrap-around, persisted as playlist + index
//! - The mini-player state machine, session restore and autoplay fallback
//! - Throttled persistence of the playback offset
//!
//! ## Components
//!
//! - [`PlaybackController`]: one per page, shared through an `Arc`
//! - [`MiniPlayerWidget`]: owns the physical audio output
//! - [`PlaybackStore`]: typed access to the persisted keys
//! - [`PlayerPage`]: bootstrap that wires the two and pumps the event bus
//!
//! Components talk over a typed [`EventBus`](core_runtime::events::EventBus)
//! of [`PlayerEvent`]s rather than calling each other directly.

pub mod api;
pub mod config;
pub mod controller;
pub mod error;
pub mod events;
pub mod page;
pub mod persistence;
pub mod track;
pub mod widget;

#[cfg(target_arch = "wasm32")]
pub mod wasm;

pub use api::{TrackApi, TrackDetails};
pub use config::PlayerConfig;
pub use controller::PlaybackController;
pub use error::{PlaybackError, Result};
pub use events::{PlayerEvent, PlayerEventBus};
pub use page::{PlayerHost, PlayerPage};
pub use persistence::{PlaybackSession, PlaybackStore, PlayerState};
pub use track::{playlist_from_annotations, AlbumType, Track, TrackAnnotations};
pub use widget::{Gesture, MiniPlayerView, MiniPlayerWidget, RestoreOutcome, RestoreTrigger, WidgetState};
