//! # Player Session Demo
//!
//! Walks through two page views sharing one store: the first plays an album
//! from a click, the second restores the session after "navigation" and
//! resumes on the first gesture once autoplay is refused. With
//! `MINITUNE_API` set to a running site (e.g. `http://localhost:3000`), a
//! third view selects a track by id through the desktop HTTP client.
//!
//! Run with: `cargo run --example player_demo --package core-playback`

use bridge_traits::http::HttpClient;
use bridge_traits::media::{MediaElement, MediaErrorInfo, MediaEvent};
use bridge_traits::storage::MemoryKeyValueStore;
use bridge_traits::time::{LogLevel, ManualClock};
use core_playback::persistence::keys;
use core_playback::{Gesture, PlayerConfig, PlayerHost, PlayerPage, TrackAnnotations};
use core_runtime::logging::{init_logging, LogFormat, LoggingConfig};
use parking_lot::Mutex;
use std::sync::Arc;

// ============================================================================
// Console Audio Output
// ============================================================================

/// Prints what a real audio element would be asked to do.
#[derive(Default)]
struct ConsoleOutput {
    source: Mutex<Option<String>>,
    paused: Mutex<bool>,
    position: Mutex<f64>,
    volume: Mutex<f64>,
}

impl MediaElement for ConsoleOutput {
    fn set_source(&self, url: &str) {
        println!("  [audio] load {url}");
        *self.source.lock() = Some(url.to_string());
        *self.position.lock() = 0.0;
        *self.paused.lock() = true;
    }

    fn source(&self) -> Option<String> {
        self.source.lock().clone()
    }

    fn request_play(&self) {
        println!("  [audio] play requested");
    }

    fn pause(&self) {
        println!("  [audio] pause");
        *self.paused.lock() = true;
    }

    fn is_paused(&self) -> bool {
        *self.paused.lock()
    }

    fn current_time(&self) -> f64 {
        *self.position.lock()
    }

    fn set_current_time(&self, seconds: f64) {
        println!("  [audio] seek {seconds:.1}s");
        *self.position.lock() = seconds;
    }

    fn duration(&self) -> Option<f64> {
        Some(180.0)
    }

    fn volume(&self) -> f64 {
        *self.volume.lock()
    }

    fn set_volume(&self, volume: f64) {
        *self.volume.lock() = volume;
    }

    fn error(&self) -> Option<MediaErrorInfo> {
        None
    }
}

impl ConsoleOutput {
    fn playing_at(&self, seconds: f64) {
        *self.paused.lock() = false;
        *self.position.lock() = seconds;
    }
}

fn open_page(
    store: &Arc<MemoryKeyValueStore>,
    clock: &Arc<ManualClock>,
    http: Option<Arc<dyn HttpClient>>,
) -> (PlayerPage, Arc<ConsoleOutput>) {
    let output = Arc::new(ConsoleOutput::default());
    let page = PlayerPage::new(
        PlayerConfig::default(),
        PlayerHost {
            store: store.clone(),
            clock: clock.clone(),
            media: output.clone(),
            http,
        },
    )
    .expect("default config is valid");
    (page, output)
}

fn annotated(id: &str, title: &str) -> TrackAnnotations {
    TrackAnnotations {
        title: Some(title.to_string()),
        artist: Some("The Examples".to_string()),
        album: Some("Demo Tape".to_string()),
        album_type: Some("ep".to_string()),
        ..TrackAnnotations::with_id(id)
    }
}

fn main() {
    let _ = init_logging(
        LoggingConfig::default()
            .with_format(LogFormat::Compact)
            .with_level(LogLevel::Info),
    );

    let store = Arc::new(MemoryKeyValueStore::new());
    let clock = Arc::new(ManualClock::default());

    println!("== Page view 1: album page ==");
    let (mut page, output) = open_page(&store, &clock, None);
    page.start();

    let album = [
        annotated("101", "Intro"),
        annotated("102", "Groove"),
        annotated("103", "Outro"),
    ];
    page.click_track(&album, "102");

    output.playing_at(0.0);
    page.media_event(MediaEvent::Playing);
    for second in 1..=42 {
        clock.advance_millis(1_000);
        output.playing_at(second as f64);
        page.media_event(MediaEvent::TimeUpdate);
        page.tick();
    }
    let view = page.widget().view();
    println!("  now showing: {} by {} at {}", view.title, view.artist, view.current_time_label);
    println!("  stored session: {}", store.snapshot()[keys::CURRENT_TRACK]);

    println!("\n== Page view 2: after navigation ==");
    let (mut page, _output) = open_page(&store, &clock, None);
    let outcome = page.start();
    println!("  restore outcome: {outcome:?}");

    page.media_event(MediaEvent::PlayBlocked {
        reason: "autoplay refused".to_string(),
    });
    println!("  attention cue: {:?}", page.widget().view().attention);

    let resumed = page.user_gesture(Gesture::Click);
    println!("  first click resumed playback: {resumed}");

    page.next();
    println!(
        "  skipped to: {}",
        page.widget().current_track().map(|t| t.title.as_str()).unwrap_or("-")
    );

    if let Ok(base_url) = std::env::var("MINITUNE_API") {
        let track_id = std::env::var("MINITUNE_TRACK").unwrap_or_else(|_| "1".to_string());
        select_from_server(&store, &clock, &base_url, &track_id);
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn select_from_server(
    store: &Arc<MemoryKeyValueStore>,
    clock: &Arc<ManualClock>,
    base_url: &str,
    track_id: &str,
) {
    println!("\n== Page view 3: select track {track_id} from {base_url} ==");
    let http = bridge_desktop::ReqwestHttpClient::new().with_base_url(base_url);
    let (mut page, _output) = open_page(store, clock, Some(Arc::new(http)));
    page.start();

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            println!("  no runtime: {e}");
            return;
        }
    };
    if runtime.block_on(page.select_track(track_id)) {
        let view = page.widget().view();
        println!("  now showing: {} by {}", view.title, view.artist);
    } else {
        println!("  selection failed, player untouched");
    }
}

#[cfg(target_arch = "wasm32")]
fn select_from_server(_: &Arc<MemoryKeyValueStore>, _: &Arc<ManualClock>, _: &str, _: &str) {}
