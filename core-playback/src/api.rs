//! # Track API Client
//!
//! Fetches single-track metadata (`GET {api_base}/{id}`) through the host's
//! [`HttpClient`]. Tracks in the response are canonicalised here, at the
//! boundary.

use bridge_traits::http::{HttpClient, HttpRequest, RetryPolicy};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::config::PlayerConfig;
use crate::error::{PlaybackError, Result};
use crate::persistence::wrap_index;
use crate::track::Track;

/// Track metadata plus the album context it was requested in.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackDetails {
    pub track: Track,
    pub track_list: Vec<Track>,
    pub current_track_index: Option<usize>,
}

impl TrackDetails {
    /// Decode an API response body.
    pub fn from_value(value: &Value) -> Result<Self> {
        if !value.is_object() {
            return Err(PlaybackError::InvalidResponse(
                "expected a JSON object".to_string(),
            ));
        }

        let track_list = match value.get("trackList") {
            Some(Value::Array(items)) => items.iter().map(Track::from_value).collect(),
            Some(Value::Null) | None => Vec::new(),
            Some(_) => {
                return Err(PlaybackError::InvalidResponse(
                    "trackList must be an array".to_string(),
                ))
            }
        };

        Ok(Self {
            track: Track::from_value(value),
            track_list,
            current_track_index: value
                .get("currentTrackIndex")
                .and_then(Value::as_u64)
                .map(|index| index as usize),
        })
    }

    /// Playlist to load for this selection.
    ///
    /// With `whole_album` and a non-empty track list, the album list starting
    /// at the selected track; otherwise the single track.
    pub fn into_playlist(self, whole_album: bool) -> (Vec<Track>, usize) {
        if whole_album && !self.track_list.is_empty() {
            let index = self
                .current_track_index
                .or_else(|| self.track_list.iter().position(|t| t.id == self.track.id))
                .unwrap_or(0);
            let index = wrap_index(index as i64, self.track_list.len());
            (self.track_list, index)
        } else {
            (vec![self.track], 0)
        }
    }
}

/// Client for the track metadata endpoint.
#[derive(Clone)]
pub struct TrackApi {
    http: Arc<dyn HttpClient>,
    config: PlayerConfig,
}

impl TrackApi {
    pub fn new(http: Arc<dyn HttpClient>, config: PlayerConfig) -> Self {
        Self { http, config }
    }

    /// Fetch one track. Failures are not retried.
    #[instrument(skip(self))]
    pub async fn fetch_track(&self, track_id: &str) -> Result<TrackDetails> {
        let url = self.config.track_url(track_id);
        let response = self
            .http
            .execute_with_retry(HttpRequest::get_json(url.as_str()), RetryPolicy::no_retry())
            .await
            .map_err(|e| PlaybackError::Network(e.to_string()))?;

        if response.status == 404 {
            return Err(PlaybackError::TrackNotFound(track_id.to_string()));
        }
        if !response.is_success() {
            return Err(PlaybackError::Network(format!(
                "GET {url} returned HTTP {}",
                response.status
            )));
        }

        let body: Value = serde_json::from_slice(&response.body)
            .map_err(|e| PlaybackError::InvalidResponse(e.to_string()))?;
        let details = TrackDetails::from_value(&body)?;
        debug!(track_id = %details.track.id, album_tracks = details.track_list.len(), "Fetched track");
        Ok(details)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::error::{BridgeError, Result as BridgeResult};
    use bridge_traits::http::HttpResponse;
    use bytes::Bytes;
    use mockall::mock;
    use serde_json::json;
    use std::collections::HashMap;

    mock! {
        Http {}

        #[async_trait::async_trait]
        impl HttpClient for Http {
            async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse>;
        }
    }

    fn respond(status: u16, body: &'static str) -> MockHttp {
        let mut http = MockHttp::new();
        http.expect_execute()
            .withf(|req| req.url == "/api/track/42")
            .times(1)
            .returning(move |_| {
                Ok(HttpResponse {
                    status,
                    headers: HashMap::new(),
                    body: Bytes::from_static(body.as_bytes()),
                })
            });
        http
    }

    fn api(http: MockHttp) -> TrackApi {
        TrackApi::new(Arc::new(http), PlayerConfig::default())
    }

    #[tokio::test]
    async fn test_fetch_track_canonicalises_response() {
        let body = r#"{
            "id": 42, "title": "Answer", "artist": "Deep Thought",
            "audioUrl": "/track/42", "albumType": "single", "albumTitle": "Life",
            "trackList": [{"id": 41, "name": "Question"}, {"id": 42, "title": "Answer"}],
            "currentTrackIndex": 1
        }"#;
        let details = api(respond(200, body)).fetch_track("42").await.unwrap();

        assert_eq!(details.track.id, "42");
        assert_eq!(details.track.album_title, "Life");
        assert_eq!(details.track_list[0].title, "Question");
        assert_eq!(details.current_track_index, Some(1));
    }

    #[tokio::test]
    async fn test_fetch_track_error_mapping() {
        let err = api(respond(404, "{}")).fetch_track("42").await.unwrap_err();
        assert!(matches!(err, PlaybackError::TrackNotFound(id) if id == "42"));

        let err = api(respond(500, "oops")).fetch_track("42").await.unwrap_err();
        assert!(err.is_network_error());

        let err = api(respond(200, "<html>")).fetch_track("42").await.unwrap_err();
        assert!(matches!(err, PlaybackError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_transport_failure_is_network_error() {
        let mut http = MockHttp::new();
        http.expect_execute()
            .returning(|_| Err(BridgeError::OperationFailed("connection refused".into())));

        let err = api(http).fetch_track("42").await.unwrap_err();
        assert!(err.is_network_error());
    }

    #[test]
    fn test_into_playlist() {
        let details = TrackDetails::from_value(&json!({
            "id": 2,
            "trackList": [{"id": 1}, {"id": 2}, {"id": 3}],
        }))
        .unwrap();

        let (single, index) = details.clone().into_playlist(false);
        assert_eq!(single.len(), 1);
        assert_eq!(index, 0);

        let (album, index) = details.into_playlist(true);
        assert_eq!(album.len(), 3);
        assert_eq!(index, 1);

        assert!(TrackDetails::from_value(&json!([1, 2])).is_err());
    }
}
