//! # Track Model
//!
//! The canonical track record and the normalisation applied wherever a track
//! enters the player: DOM annotations, track API responses and persisted
//! playlists.
//!
//! Producers disagree on field names (`name` vs `title`, `path` vs
//! `audioUrl`, `album_title` vs `albumTitle`, ...). [`Track::from_value`]
//! accepts all of them and fills every missing field with a display
//! fallback, so a canonical track never renders blank.
//!
//! ```
//! use core_playback::track::{AlbumType, Track};
//! use serde_json::json;
//!
//! let track = Track::from_value(&json!({ "id": 7, "name": "Intro", "album_type": "EP" }));
//! assert_eq!(track.id, "7");
//! assert_eq!(track.title, "Intro");
//! assert_eq!(track.album_type, AlbumType::Ep);
//! assert_eq!(track.audio_url, "/track/7");
//! ```

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;

/// Identifier used when a producer supplies no id at all.
pub const UNKNOWN_ID: &str = "unknown";
pub const UNKNOWN_TITLE: &str = "Unknown Track";
pub const UNKNOWN_ARTIST: &str = "Unknown Artist";
pub const UNKNOWN_ALBUM: &str = "Unknown Album";
pub const DEFAULT_COVER_URL: &str = "/images/default-cover.jpg";

const STREAM_PREFIX: &str = "/track/";
const COVER_DIR: &str = "/images/";

// ============================================================================
// Album Type
// ============================================================================

/// Release kind, used to build the album page link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AlbumType {
    #[default]
    Album,
    Ep,
    Single,
}

impl AlbumType {
    /// Parse a release kind; case-insensitive, unknown values map to `Album`.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "ep" => AlbumType::Ep,
            "single" => AlbumType::Single,
            _ => AlbumType::Album,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AlbumType::Album => "album",
            AlbumType::Ep => "ep",
            AlbumType::Single => "single",
        }
    }
}

impl fmt::Display for AlbumType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for AlbumType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for AlbumType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(AlbumType::parse(&raw))
    }
}

// ============================================================================
// Track
// ============================================================================

/// A single playable unit in canonical shape.
///
/// Serialises to the persisted playlist shape
/// (`id, title, artist, audioUrl, albumTitle, albumType, image`).
/// Deserialising accepts any producer shape and canonicalises it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    pub id: String,
    pub title: String,
    pub artist: String,
    pub audio_url: String,
    pub album_title: String,
    pub album_type: AlbumType,
    #[serde(rename = "image")]
    pub cover_image_url: String,
}

/// Partially-known track fields before fallbacks are applied.
#[derive(Default)]
struct RawTrack {
    id: Option<String>,
    title: Option<String>,
    artist: Option<String>,
    audio_url: Option<String>,
    album_title: Option<String>,
    album_type: Option<AlbumType>,
    cover_image_url: Option<String>,
}

impl RawTrack {
    fn finish(self) -> Track {
        let id = self.id.unwrap_or_else(|| UNKNOWN_ID.to_string());
        let audio_url = self
            .audio_url
            .unwrap_or_else(|| format!("{STREAM_PREFIX}{id}"));

        Track {
            title: self.title.unwrap_or_else(|| UNKNOWN_TITLE.to_string()),
            artist: self.artist.unwrap_or_else(|| UNKNOWN_ARTIST.to_string()),
            audio_url,
            album_title: self
                .album_title
                .unwrap_or_else(|| UNKNOWN_ALBUM.to_string()),
            album_type: self.album_type.unwrap_or_default(),
            cover_image_url: self
                .cover_image_url
                .unwrap_or_else(|| DEFAULT_COVER_URL.to_string()),
            id,
        }
    }
}

impl Track {
    /// Canonicalise a track record of any known producer shape.
    ///
    /// Total: a non-object value yields a track made entirely of fallbacks.
    pub fn from_value(value: &Value) -> Self {
        let empty = Map::new();
        let obj = value.as_object().unwrap_or(&empty);

        let cover_image_url = first_text(obj, &["image", "coverUrl", "cover"]).or_else(|| {
            first_text(obj, &["image_cover_filename"]).map(|file| format!("{COVER_DIR}{file}"))
        });

        RawTrack {
            id: first_id(obj, &["id", "trackId"]),
            title: first_text(obj, &["title", "name"]),
            artist: first_text(obj, &["artist"]),
            audio_url: first_text(obj, &["audioUrl", "path"]),
            album_title: album_title(obj),
            album_type: first_text(obj, &["albumType", "album_type", "type"])
                .map(|raw| AlbumType::parse(&raw)),
            cover_image_url,
        }
        .finish()
    }

    /// Re-apply the fallbacks to an already-typed track.
    ///
    /// Canonicalising a canonical track returns an identical record.
    pub fn canonicalized(&self) -> Self {
        RawTrack {
            id: non_empty(&self.id),
            title: non_empty(&self.title),
            artist: non_empty(&self.artist),
            audio_url: non_empty(&self.audio_url),
            album_title: non_empty(&self.album_title),
            album_type: Some(self.album_type),
            cover_image_url: non_empty(&self.cover_image_url),
        }
        .finish()
    }

    /// Link target for the album page: `/a/{type}/{artist}/{album}`.
    ///
    /// Tracks without a known album link through their own title.
    pub fn album_href(&self) -> String {
        let album = if self.album_title == UNKNOWN_ALBUM {
            &self.title
        } else {
            &self.album_title
        };
        format!(
            "/a/{}/{}/{}",
            self.album_type,
            urlencoding::encode(&self.artist),
            urlencoding::encode(album)
        )
    }

    /// Link target for the artist page: `/a/{artist}`.
    pub fn artist_href(&self) -> String {
        format!("/a/{}", urlencoding::encode(&self.artist))
    }
}

impl<'de> Deserialize<'de> for Track {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(Track::from_value(&value))
    }
}

fn non_empty(text: &str) -> Option<String> {
    if text.trim().is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

fn first_text(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| obj.get(*key))
        .find_map(|value| value.as_str().and_then(non_empty))
}

/// Ids arrive as strings from the DOM and as numbers from the API.
pub(crate) fn id_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => non_empty(text),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

fn first_id(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| obj.get(*key))
        .find_map(id_text)
}

fn album_title(obj: &Map<String, Value>) -> Option<String> {
    ["albumTitle", "album_title", "album"]
        .iter()
        .filter_map(|key| obj.get(*key))
        .find_map(|value| match value {
            Value::Object(album) => first_text(album, &["title"]),
            other => other.as_str().and_then(non_empty),
        })
}

// ============================================================================
// DOM Annotations
// ============================================================================

/// The `data-track-*` attributes of one clickable track element.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackAnnotations {
    /// `data-track-id`
    pub id: Option<String>,
    /// `data-title`
    pub title: Option<String>,
    /// `data-artist`
    pub artist: Option<String>,
    /// `data-album`
    pub album: Option<String>,
    /// `data-type`
    pub album_type: Option<String>,
    /// `data-cover`
    pub cover: Option<String>,
}

impl TrackAnnotations {
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Default::default()
        }
    }

    /// Canonical track for an annotated element; `None` without an id.
    pub fn to_track(&self) -> Option<Track> {
        let id = self.id.as_deref().and_then(non_empty)?;
        let mut obj = Map::new();
        obj.insert("id".into(), Value::String(id));
        for (key, value) in [
            ("title", &self.title),
            ("artist", &self.artist),
            ("album_title", &self.album),
            ("album_type", &self.album_type),
            ("image", &self.cover),
        ] {
            if let Some(value) = value {
                obj.insert(key.into(), Value::String(value.clone()));
            }
        }
        Some(Track::from_value(&Value::Object(obj)))
    }
}

/// Build a playlist from every annotated element on the page, starting at
/// the clicked one.
///
/// Elements without an id are skipped. An unknown `clicked_id` starts at 0.
/// Returns `None` when no element carries an id.
pub fn playlist_from_annotations(
    elements: &[TrackAnnotations],
    clicked_id: &str,
) -> Option<(Vec<Track>, usize)> {
    let tracks: Vec<Track> = elements.iter().filter_map(TrackAnnotations::to_track).collect();
    if tracks.is_empty() {
        return None;
    }
    let start = tracks
        .iter()
        .position(|track| track.id == clicked_id)
        .unwrap_or(0);
    Some((tracks, start))
}
