//! Shared fakes for the integration suites.

#![allow(dead_code)]

use bridge_traits::error::Result as BridgeResult;
use bridge_traits::http::HttpClient;
use bridge_traits::media::{MediaElement, MediaErrorInfo};
use bridge_traits::storage::{KeyValueStore, MemoryKeyValueStore};
use bridge_traits::time::ManualClock;
use core_playback::{PlayerConfig, PlayerHost, PlayerPage, Track};
use parking_lot::Mutex;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;

// ============================================================================
// Fake Media Output
// ============================================================================

#[derive(Debug)]
struct MediaState {
    source: Option<String>,
    paused: bool,
    current_time: f64,
    duration: Option<f64>,
    volume: f64,
    error: Option<MediaErrorInfo>,
    play_requests: usize,
    pauses: usize,
    seeks: Vec<f64>,
}

/// Records every call; playback outcomes are driven by the test.
#[derive(Debug)]
pub struct FakeMedia {
    state: Mutex<MediaState>,
}

impl FakeMedia {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MediaState {
                source: None,
                paused: true,
                current_time: 0.0,
                duration: None,
                volume: 1.0,
                error: None,
                play_requests: 0,
                pauses: 0,
                seeks: Vec::new(),
            }),
        }
    }

    /// Simulate the platform fulfilling a play request.
    pub fn start_playing(&self) {
        self.state.lock().paused = false;
    }

    pub fn set_position(&self, seconds: f64) {
        self.state.lock().current_time = seconds;
    }

    pub fn set_duration(&self, seconds: f64) {
        self.state.lock().duration = Some(seconds);
    }

    pub fn fail_with(&self, info: MediaErrorInfo) {
        self.state.lock().error = Some(info);
    }

    pub fn play_requests(&self) -> usize {
        self.state.lock().play_requests
    }

    pub fn pauses(&self) -> usize {
        self.state.lock().pauses
    }

    pub fn seeks(&self) -> Vec<f64> {
        self.state.lock().seeks.clone()
    }
}

impl MediaElement for FakeMedia {
    fn set_source(&self, url: &str) {
        let mut state = self.state.lock();
        state.source = Some(url.to_string());
        state.current_time = 0.0;
        state.paused = true;
        state.error = None;
    }

    fn source(&self) -> Option<String> {
        self.state.lock().source.clone()
    }

    fn request_play(&self) {
        self.state.lock().play_requests += 1;
    }

    fn pause(&self) {
        let mut state = self.state.lock();
        state.paused = true;
        state.pauses += 1;
    }

    fn is_paused(&self) -> bool {
        self.state.lock().paused
    }

    fn current_time(&self) -> f64 {
        self.state.lock().current_time
    }

    fn set_current_time(&self, seconds: f64) {
        let mut state = self.state.lock();
        state.current_time = seconds;
        state.seeks.push(seconds);
    }

    fn duration(&self) -> Option<f64> {
        self.state.lock().duration
    }

    fn volume(&self) -> f64 {
        self.state.lock().volume
    }

    fn set_volume(&self, volume: f64) {
        self.state.lock().volume = volume;
    }

    fn error(&self) -> Option<MediaErrorInfo> {
        self.state.lock().error.clone()
    }
}

// ============================================================================
// Counting Store
// ============================================================================

/// In-memory store that counts writes per key.
#[derive(Default)]
pub struct CountingStore {
    inner: MemoryKeyValueStore,
    writes: Mutex<HashMap<String, usize>>,
}

impl CountingStore {
    pub fn with_entries(entries: &[(&str, &str)]) -> Self {
        Self {
            inner: MemoryKeyValueStore::with_entries(entries.iter().copied()),
            writes: Mutex::new(HashMap::new()),
        }
    }

    pub fn writes(&self, key: &str) -> usize {
        self.writes.lock().get(key).copied().unwrap_or(0)
    }

    pub fn raw(&self, key: &str) -> Option<String> {
        self.inner.get(key).unwrap()
    }

    pub fn json(&self, key: &str) -> serde_json::Value {
        serde_json::from_str(&self.raw(key).unwrap()).unwrap()
    }
}

impl KeyValueStore for CountingStore {
    fn get(&self, key: &str) -> BridgeResult<Option<String>> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> BridgeResult<()> {
        *self.writes.lock().entry(key.to_string()).or_insert(0) += 1;
        self.inner.set(key, value)
    }

    fn remove(&self, key: &str) -> BridgeResult<()> {
        self.inner.remove(key)
    }

    fn keys(&self) -> BridgeResult<Vec<String>> {
        self.inner.keys()
    }
}

// ============================================================================
// Page Harness
// ============================================================================

pub struct Harness {
    pub store: Arc<CountingStore>,
    pub clock: Arc<ManualClock>,
    pub media: Arc<FakeMedia>,
    pub page: PlayerPage,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_store(Arc::new(CountingStore::default()))
    }

    pub fn with_entries(entries: &[(&str, &str)]) -> Self {
        Self::with_store(Arc::new(CountingStore::with_entries(entries)))
    }

    /// A fresh page view over an existing store, as after a navigation.
    pub fn with_store(store: Arc<CountingStore>) -> Self {
        Self::build(store, PlayerConfig::default(), None)
    }

    pub fn with_http(config: PlayerConfig, http: Arc<dyn HttpClient>) -> Self {
        Self::build(Arc::new(CountingStore::default()), config, Some(http))
    }

    fn build(
        store: Arc<CountingStore>,
        config: PlayerConfig,
        http: Option<Arc<dyn HttpClient>>,
    ) -> Self {
        let clock = Arc::new(ManualClock::default());
        let media = Arc::new(FakeMedia::new());
        let page = PlayerPage::new(
            config,
            PlayerHost {
                store: store.clone(),
                clock: clock.clone(),
                media: media.clone(),
                http,
            },
        )
        .unwrap();

        Self {
            store,
            clock,
            media,
            page,
        }
    }

    pub fn reload(&self) -> Self {
        Self::with_store(self.store.clone())
    }
}

pub fn track(id: u32, title: &str) -> Track {
    Track::from_value(&json!({ "id": id, "title": title, "artist": "Test Artist" }))
}

pub fn playlist(titles: &[&str]) -> Vec<Track> {
    titles
        .iter()
        .enumerate()
        .map(|(i, title)| track(i as u32 + 1, title))
        .collect()
}
