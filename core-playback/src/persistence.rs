//! # Playback Persistence
//!
//! Typed access to the player state that survives full-page navigation.
//!
//! | Key                    | Value                                   |
//! |------------------------|-----------------------------------------|
//! | `currentTrack`         | JSON [`PlaybackSession`]                |
//! | `currentPlaylist`      | JSON array of canonical [`Track`]s      |
//! | `currentPlaylistIndex` | integer string                          |
//! | `lastLoadedTrackMeta`  | JSON `{albumType, albumTitle}`          |
//! | `playerState`          | `playing` or `paused`                   |
//! | `playerVolume`         | float string in `[0, 1]`                |
//!
//! Every write replaces the whole value under its key. Reads never fail:
//! undecodable records are logged, and an unreadable session is removed so
//! the next page starts clean.

use bridge_traits::storage::KeyValueStore;
use bridge_traits::time::Clock;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::{PlaybackError, Result};
use crate::track::{id_text, AlbumType, Track, UNKNOWN_ID};

/// Storage keys.
pub mod keys {
    pub const CURRENT_TRACK: &str = "currentTrack";
    pub const CURRENT_PLAYLIST: &str = "currentPlaylist";
    pub const CURRENT_PLAYLIST_INDEX: &str = "currentPlaylistIndex";
    pub const LAST_LOADED_TRACK_META: &str = "lastLoadedTrackMeta";
    pub const PLAYER_STATE: &str = "playerState";
    pub const PLAYER_VOLUME: &str = "playerVolume";
}

pub const DEFAULT_VOLUME: f64 = 1.0;

// ============================================================================
// Records
// ============================================================================

/// Resumable snapshot of what is loaded in the physical player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackSession {
    /// Older pages could write a session without an id; `src` alone is
    /// enough to restore.
    #[serde(default, deserialize_with = "lenient_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub src: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artist: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album_type: Option<AlbumType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album_title: Option<String>,
    /// Whether audio was playing when last observed.
    #[serde(rename = "isPlaying", default, skip_serializing_if = "Option::is_none")]
    pub is_playing_intent: Option<bool>,
    /// Playback offset in seconds, full precision.
    #[serde(rename = "currentTime", default, skip_serializing_if = "Option::is_none")]
    pub current_time_seconds: Option<f64>,
    /// Last write, unix millis.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

impl PlaybackSession {
    /// Fresh session for a track that was just loaded.
    pub fn for_track(track: &Track) -> Self {
        Self {
            id: Some(track.id.clone()),
            src: track.audio_url.clone(),
            title: Some(track.title.clone()),
            artist: Some(track.artist.clone()),
            cover_url: Some(track.cover_image_url.clone()),
            album_type: Some(track.album_type),
            album_title: Some(track.album_title.clone()),
            is_playing_intent: Some(true),
            current_time_seconds: Some(0.0),
            timestamp: None,
        }
    }

    /// Id of the saved track, `unknown` when none was recorded.
    pub fn track_id(&self) -> &str {
        self.id.as_deref().unwrap_or(UNKNOWN_ID)
    }

    /// Offset to resume from; non-finite or negative values count as 0.
    pub fn offset(&self) -> f64 {
        match self.current_time_seconds {
            Some(seconds) if seconds.is_finite() && seconds > 0.0 => seconds,
            _ => 0.0,
        }
    }

    /// Display track rebuilt from the snapshot.
    pub fn to_track(&self) -> Track {
        Track {
            id: self.track_id().to_string(),
            title: self.title.clone().unwrap_or_default(),
            artist: self.artist.clone().unwrap_or_default(),
            audio_url: self.src.clone(),
            album_title: self.album_title.clone().unwrap_or_default(),
            album_type: self.album_type.unwrap_or_default(),
            cover_image_url: self.cover_url.clone().unwrap_or_default(),
        }
        .canonicalized()
    }

    /// Fill missing album fields from the redundancy cache.
    pub fn patch_album(&mut self, meta: &LastLoadedMeta) {
        if self.album_type.is_none() {
            self.album_type = meta.album_type;
        }
        if self.album_title.as_deref().map_or(true, str::is_empty) {
            self.album_title = meta.album_title.clone();
        }
    }
}

/// Strings and numbers are ids; anything else reads as no id.
fn lenient_id<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Option<String>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(id_text(&value))
}

/// Album context of the last loaded track.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LastLoadedMeta {
    #[serde(default)]
    pub album_type: Option<AlbumType>,
    #[serde(default)]
    pub album_title: Option<String>,
}

/// Last observed transport intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerState {
    Playing,
    Paused,
}

impl PlayerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlayerState::Playing => "playing",
            PlayerState::Paused => "paused",
        }
    }

    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().trim_matches('"') {
            "playing" => Some(PlayerState::Playing),
            "paused" => Some(PlayerState::Paused),
            _ => None,
        }
    }
}

// ============================================================================
// Store
// ============================================================================

/// Typed façade over the host key-value store.
#[derive(Clone)]
pub struct PlaybackStore {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
}

impl PlaybackStore {
    pub fn new(store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    fn read(&self, key: &str) -> Option<String> {
        match self.store.get(key) {
            Ok(value) => value,
            Err(e) => {
                warn!(key, error = %e, "Failed to read persisted state");
                None
            }
        }
    }

    fn discard(&self, key: &str, reason: &PlaybackError) {
        warn!(key, error = %reason, "Discarding malformed persisted state");
        if let Err(e) = self.store.remove(key) {
            warn!(key, error = %e, "Failed to remove malformed persisted state");
        }
    }

    // ------------------------------------------------------------------------
    // currentTrack
    // ------------------------------------------------------------------------

    /// Persisted session, if present and usable.
    ///
    /// A record that does not decode, or lacks `src`, is removed.
    pub fn session(&self) -> Option<PlaybackSession> {
        let raw = self.read(keys::CURRENT_TRACK)?;
        match decode_session(&raw) {
            Ok(session) => Some(session),
            Err(e) => {
                self.discard(keys::CURRENT_TRACK, &e);
                None
            }
        }
    }

    /// Replace the persisted session, stamping it with the current time.
    pub fn save_session(&self, session: &PlaybackSession) -> Result<()> {
        let mut stamped = session.clone();
        stamped.timestamp = Some(self.clock.unix_timestamp_millis());
        let json = serde_json::to_string(&stamped)
            .map_err(|e| PlaybackError::Internal(format!("session encode failed: {e}")))?;
        self.store.set(keys::CURRENT_TRACK, &json)?;
        Ok(())
    }

    /// Rewrite the persisted session's play intent. No-op without a session.
    pub fn set_session_playing(&self, playing: bool) -> Result<()> {
        match self.session() {
            Some(mut session) => {
                session.is_playing_intent = Some(playing);
                self.save_session(&session)
            }
            None => Ok(()),
        }
    }

    // ------------------------------------------------------------------------
    // currentPlaylist / currentPlaylistIndex
    // ------------------------------------------------------------------------

    /// Persisted playlist, canonicalised. `None` when absent or empty.
    pub fn playlist(&self) -> Option<Vec<Track>> {
        let raw = self.read(keys::CURRENT_PLAYLIST)?;
        match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Array(items)) => {
                let tracks: Vec<Track> = items.iter().map(Track::from_value).collect();
                (!tracks.is_empty()).then_some(tracks)
            }
            Ok(_) => {
                self.discard(
                    keys::CURRENT_PLAYLIST,
                    &PlaybackError::malformed(keys::CURRENT_PLAYLIST, "expected an array"),
                );
                None
            }
            Err(e) => {
                self.discard(
                    keys::CURRENT_PLAYLIST,
                    &PlaybackError::malformed(keys::CURRENT_PLAYLIST, e.to_string()),
                );
                None
            }
        }
    }

    /// Raw persisted index; unparsable or absent reads as 0.
    pub fn playlist_index(&self) -> i64 {
        self.read(keys::CURRENT_PLAYLIST_INDEX)
            .and_then(|raw| raw.trim().parse::<i64>().ok())
            .unwrap_or(0)
    }

    /// Persisted playlist with its index wrapped into `[0, len)`.
    pub fn saved_playlist(&self) -> Option<(Vec<Track>, usize)> {
        let tracks = self.playlist()?;
        let index = wrap_index(self.playlist_index(), tracks.len());
        Some((tracks, index))
    }

    pub fn save_playlist(&self, tracks: &[Track], index: usize) -> Result<()> {
        let json = serde_json::to_string(tracks)
            .map_err(|e| PlaybackError::Internal(format!("playlist encode failed: {e}")))?;
        self.store.set(keys::CURRENT_PLAYLIST, &json)?;
        self.save_playlist_index(index)
    }

    pub fn save_playlist_index(&self, index: usize) -> Result<()> {
        self.store
            .set(keys::CURRENT_PLAYLIST_INDEX, &index.to_string())?;
        Ok(())
    }

    // ------------------------------------------------------------------------
    // lastLoadedTrackMeta / playerState / playerVolume
    // ------------------------------------------------------------------------

    pub fn last_loaded_meta(&self) -> LastLoadedMeta {
        self.read(keys::LAST_LOADED_TRACK_META)
            .and_then(|raw| serde_json::from_str(&raw).ok())
            .unwrap_or_default()
    }

    pub fn save_last_loaded_meta(&self, meta: &LastLoadedMeta) -> Result<()> {
        let json = serde_json::to_string(meta)
            .map_err(|e| PlaybackError::Internal(format!("meta encode failed: {e}")))?;
        self.store.set(keys::LAST_LOADED_TRACK_META, &json)?;
        Ok(())
    }

    pub fn player_state(&self) -> Option<PlayerState> {
        self.read(keys::PLAYER_STATE)
            .and_then(|raw| PlayerState::parse(&raw))
    }

    pub fn save_player_state(&self, state: PlayerState) -> Result<()> {
        self.store.set(keys::PLAYER_STATE, state.as_str())?;
        Ok(())
    }

    /// Persisted volume clamped to `[0, 1]`, default full volume.
    pub fn volume(&self) -> f64 {
        self.read(keys::PLAYER_VOLUME)
            .and_then(|raw| raw.trim().parse::<f64>().ok())
            .filter(|volume| volume.is_finite())
            .map(|volume| volume.clamp(0.0, 1.0))
            .unwrap_or(DEFAULT_VOLUME)
    }

    pub fn save_volume(&self, volume: f64) -> Result<()> {
        let volume = if volume.is_finite() {
            volume.clamp(0.0, 1.0)
        } else {
            DEFAULT_VOLUME
        };
        self.store.set(keys::PLAYER_VOLUME, &volume.to_string())?;
        Ok(())
    }
}

fn decode_session(raw: &str) -> Result<PlaybackSession> {
    let session: PlaybackSession = serde_json::from_str(raw)
        .map_err(|e| PlaybackError::malformed(keys::CURRENT_TRACK, e.to_string()))?;
    if session.src.trim().is_empty() {
        return Err(PlaybackError::malformed(keys::CURRENT_TRACK, "missing src"));
    }
    Ok(session)
}

/// Wrap any index, including negative or stale ones, into `[0, len)`.
pub fn wrap_index(index: i64, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    index.rem_euclid(len as i64) as usize
}

/// Log a failed write and carry on; persistence is best-effort.
pub(crate) fn warn_on_failure(result: Result<()>, what: &str) {
    match result {
        Ok(()) => debug!(what, "Persisted player state"),
        Err(e) => warn!(what, error = %e, "Failed to persist player state"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::storage::MemoryKeyValueStore;
    use bridge_traits::time::ManualClock;
    use serde_json::json;

    fn store_with(entries: &[(&str, &str)]) -> (PlaybackStore, Arc<MemoryKeyValueStore>) {
        let kv = Arc::new(MemoryKeyValueStore::with_entries(entries.iter().copied()));
        let store = PlaybackStore::new(kv.clone(), Arc::new(ManualClock::default()));
        (store, kv)
    }

    #[test]
    fn test_session_roundtrip_uses_wire_names() {
        let (store, kv) = store_with(&[]);
        let track = Track::from_value(&json!({ "id": 4, "title": "Four", "albumType": "ep" }));
        let mut session = PlaybackSession::for_track(&track);
        session.current_time_seconds = Some(12.345678);
        store.save_session(&session).unwrap();

        let raw = kv.snapshot()[keys::CURRENT_TRACK].clone();
        let value: Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["currentTime"], json!(12.345678));
        assert_eq!(value["isPlaying"], json!(true));
        assert_eq!(value["coverUrl"], json!("/images/default-cover.jpg"));
        assert!(value["timestamp"].is_i64());

        let restored = store.session().unwrap();
        assert_eq!(restored.offset(), 12.345678);
        assert_eq!(restored.to_track(), track);
    }

    #[test]
    fn test_malformed_session_is_removed() {
        for raw in ["{not json", r#"{"id":"1"}"#, r#"{"id":1,"src":""}"#, r#"[1, 2]"#] {
            let (store, kv) = store_with(&[(keys::CURRENT_TRACK, raw)]);
            assert!(store.session().is_none(), "accepted {raw}");
            assert!(!kv.snapshot().contains_key(keys::CURRENT_TRACK));
        }
    }

    #[test]
    fn test_session_without_id_is_kept() {
        for raw in [
            r#"{"src":"/track/5","title":"Five","currentTime":12.5,"isPlaying":false}"#,
            r#"{"id":"","src":"/track/5","title":"Five","currentTime":12.5}"#,
        ] {
            let (store, kv) = store_with(&[(keys::CURRENT_TRACK, raw)]);
            let session = store.session().expect("session with src restores");

            assert_eq!(session.id, None);
            assert_eq!(session.offset(), 12.5);
            let track = session.to_track();
            assert_eq!(track.id, UNKNOWN_ID);
            assert_eq!(track.audio_url, "/track/5");
            assert_eq!(track.title, "Five");
            assert!(kv.snapshot().contains_key(keys::CURRENT_TRACK));
        }
    }

    #[test]
    fn test_numeric_session_id_is_accepted() {
        let (store, _) = store_with(&[(keys::CURRENT_TRACK, r#"{"id":17,"src":"/track/17","currentTime":null}"#)]);
        let session = store.session().unwrap();
        assert_eq!(session.id.as_deref(), Some("17"));
        assert_eq!(session.offset(), 0.0);
        assert_eq!(session.is_playing_intent, None);
    }

    #[test]
    fn test_set_session_playing_keeps_other_fields() {
        let (store, _) = store_with(&[(
            keys::CURRENT_TRACK,
            r#"{"id":"2","src":"/track/2","currentTime":31.5,"isPlaying":true,"title":"Two"}"#,
        )]);
        store.set_session_playing(false).unwrap();

        let session = store.session().unwrap();
        assert_eq!(session.is_playing_intent, Some(false));
        assert_eq!(session.current_time_seconds, Some(31.5));
        assert_eq!(session.title.as_deref(), Some("Two"));
    }

    #[test]
    fn test_playlist_index_edge_cases() {
        let playlist = r#"[{"id":1},{"id":2},{"id":3}]"#;
        let (store, _) = store_with(&[(keys::CURRENT_PLAYLIST, playlist), (keys::CURRENT_PLAYLIST_INDEX, "7")]);
        assert_eq!(store.saved_playlist().unwrap().1, 1);

        let (store, _) = store_with(&[(keys::CURRENT_PLAYLIST, playlist), (keys::CURRENT_PLAYLIST_INDEX, "abc")]);
        assert_eq!(store.saved_playlist().unwrap().1, 0);

        let (store, _) = store_with(&[(keys::CURRENT_PLAYLIST, playlist), (keys::CURRENT_PLAYLIST_INDEX, "-1")]);
        assert_eq!(store.saved_playlist().unwrap().1, 2);
    }

    #[test]
    fn test_bad_playlist_reads_as_absent() {
        let (store, kv) = store_with(&[(keys::CURRENT_PLAYLIST, r#"{"id":1}"#)]);
        assert!(store.playlist().is_none());
        assert!(!kv.snapshot().contains_key(keys::CURRENT_PLAYLIST));

        let (store, _) = store_with(&[(keys::CURRENT_PLAYLIST, "[]")]);
        assert!(store.saved_playlist().is_none());
    }

    #[test]
    fn test_volume_is_clamped() {
        let (store, _) = store_with(&[]);
        assert_eq!(store.volume(), DEFAULT_VOLUME);

        store.save_volume(1.7).unwrap();
        assert_eq!(store.volume(), 1.0);

        let (store, _) = store_with(&[(keys::PLAYER_VOLUME, "-0.2")]);
        assert_eq!(store.volume(), 0.0);
    }

    #[test]
    fn test_player_state_and_meta() {
        let (store, _) = store_with(&[
            (keys::PLAYER_STATE, "paused"),
            (keys::LAST_LOADED_TRACK_META, r#"{"albumType":"single","albumTitle":"Solo"}"#),
        ]);
        assert_eq!(store.player_state(), Some(PlayerState::Paused));

        let meta = store.last_loaded_meta();
        let mut session = PlaybackSession {
            album_type: None,
            album_title: None,
            ..PlaybackSession::for_track(&Track::from_value(&json!({ "id": 1 })))
        };
        session.patch_album(&meta);
        assert_eq!(session.album_type, Some(AlbumType::Single));
        assert_eq!(session.album_title.as_deref(), Some("Solo"));
    }

    #[test]
    fn test_wrap_index() {
        assert_eq!(wrap_index(7, 3), 1);
        assert_eq!(wrap_index(-1, 3), 2);
        assert_eq!(wrap_index(5, 0), 0);
    }
}
