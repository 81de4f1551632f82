//! WebAssembly bindings for core-playback
//!
//! Boots a [`PlayerPage`] on browser capabilities and exposes it to the
//! page's JavaScript. The page script calls `poll()` from a short interval;
//! media events and timers are processed there.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use bridge_traits::time::{LogLevel, SystemClock};
use bridge_wasm::{HtmlAudioOutput, LocalStorageStore, WasmHttpClient};
use tracing::{debug, warn};
use wasm_bindgen::prelude::*;
use wasm_bindgen::{closure::Closure, JsCast};
use wasm_bindgen_futures::future_to_promise;
use web_sys::{Document, Element, EventTarget};

use crate::config::PlayerConfig;
use crate::page::{PlayerHost, PlayerPage};
use crate::track::TrackAnnotations;
use crate::widget::Gesture;

/// Enable Rust logging to browser console
/// Call this once at startup to see tracing logs in DevTools
#[wasm_bindgen(js_name = enableConsoleLogging)]
pub fn enable_console_logging() {
    use core_runtime::logging::{init_logging, LogFormat, LoggingConfig};

    let config = LoggingConfig::default()
        .with_format(LogFormat::Compact)
        .with_level(LogLevel::Debug);

    if let Err(e) = init_logging(config) {
        web_sys::console::warn_1(&format!("logging already initialized: {e}").into());
    }
}

fn js_err(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

fn document() -> Result<Document, JsValue> {
    web_sys::window()
        .and_then(|w| w.document())
        .ok_or_else(|| js_err("document not available"))
}

// =============================================================================
// DOM Annotations
// =============================================================================

fn annotations_of(element: &Element) -> TrackAnnotations {
    TrackAnnotations {
        id: element.get_attribute("data-track-id"),
        title: element.get_attribute("data-title"),
        artist: element.get_attribute("data-artist"),
        album: element.get_attribute("data-album"),
        album_type: element.get_attribute("data-type"),
        cover: element.get_attribute("data-cover"),
    }
}

/// Every `[data-track-id]` element on the page, in document order.
pub fn scrape_track_annotations(document: &Document) -> Result<Vec<TrackAnnotations>, JsValue> {
    let nodes = document.query_selector_all("[data-track-id]")?;
    let annotations = (0..nodes.length())
        .filter_map(|i| nodes.item(i))
        .filter_map(|node| node.dyn_into::<Element>().ok())
        .map(|element| annotations_of(&element))
        .collect();
    Ok(annotations)
}

// =============================================================================
// Gesture Listeners
// =============================================================================

/// Gestures seen by the document listeners, oldest first.
pub type GestureQueue = Rc<RefCell<Vec<Gesture>>>;

type Registered = Rc<RefCell<Vec<(&'static str, js_sys::Function)>>>;

/// One-shot document-level click/keydown/touchstart listeners.
///
/// Installed while a blocked play waits for a gesture. The first gesture of
/// any kind removes all three from inside its own callback; drop removes
/// whatever is still attached.
pub struct GestureListeners {
    target: EventTarget,
    registered: Registered,
    _callbacks: Vec<Closure<dyn FnMut()>>,
}

impl GestureListeners {
    pub fn install(target: EventTarget, queue: GestureQueue) -> Result<Self, JsValue> {
        let registered: Registered = Rc::new(RefCell::new(Vec::new()));
        let mut callbacks = Vec::new();

        for (name, gesture) in [
            ("click", Gesture::Click),
            ("keydown", Gesture::KeyPress),
            ("touchstart", Gesture::Touch),
        ] {
            let queue = queue.clone();
            let owner = target.clone();
            let siblings = registered.clone();
            let callback = Closure::wrap(Box::new(move || {
                queue.borrow_mut().push(gesture);
                disarm(&owner, &siblings);
            }) as Box<dyn FnMut()>);

            let function: js_sys::Function = callback.as_ref().unchecked_ref::<js_sys::Function>().clone();
            target.add_event_listener_with_callback(name, &function)?;
            registered.borrow_mut().push((name, function));
            callbacks.push(callback);
        }

        Ok(Self {
            target,
            registered,
            _callbacks: callbacks,
        })
    }

    /// Whether the listeners are still attached.
    pub fn is_armed(&self) -> bool {
        !self.registered.borrow().is_empty()
    }
}

fn disarm(target: &EventTarget, registered: &Registered) {
    for (name, function) in registered.borrow_mut().drain(..) {
        let _ = target.remove_event_listener_with_callback(name, &function);
    }
}

impl Drop for GestureListeners {
    fn drop(&mut self) {
        disarm(&self.target, &self.registered);
    }
}

// =============================================================================
// Web Player
// =============================================================================

/// The mini-player as seen from page JavaScript.
#[wasm_bindgen]
pub struct WebPlayer {
    page: Rc<RefCell<PlayerPage>>,
    output: Arc<HtmlAudioOutput>,
    gestures: GestureQueue,
    listeners: Option<GestureListeners>,
}

#[wasm_bindgen]
impl WebPlayer {
    /// Build the player around the `<audio>` element with `audio_element_id`.
    #[wasm_bindgen(constructor)]
    pub fn new(audio_element_id: &str, config_json: Option<String>) -> Result<WebPlayer, JsValue> {
        let config: PlayerConfig = match config_json {
            Some(json) => serde_json::from_str(&json).map_err(js_err)?,
            None => PlayerConfig::default(),
        };

        let output = Arc::new(HtmlAudioOutput::attach_or_create(audio_element_id).map_err(js_err)?);
        let host = PlayerHost {
            store: Arc::new(LocalStorageStore::new().map_err(js_err)?),
            clock: Arc::new(SystemClock),
            media: output.clone(),
            http: Some(Arc::new(WasmHttpClient::new().map_err(js_err)?)),
        };
        let page = PlayerPage::new(config, host).map_err(js_err)?;

        Ok(WebPlayer {
            page: Rc::new(RefCell::new(page)),
            output,
            gestures: Rc::new(RefCell::new(Vec::new())),
            listeners: None,
        })
    }

    /// Restore the last session. Returns whether anything was restored.
    pub fn start(&mut self) -> Result<bool, JsValue> {
        let outcome = self.page.borrow_mut().start();
        self.arm_gesture_listeners()?;
        Ok(matches!(
            outcome,
            Some(crate::widget::RestoreOutcome::Restored { .. })
        ))
    }

    /// Forward queued media events and gestures, then run timers.
    pub fn poll(&mut self) {
        {
            let mut page = self.page.borrow_mut();
            for event in self.output.take_events() {
                page.media_event(event);
            }

            let gestures: Vec<Gesture> = self.gestures.borrow_mut().drain(..).collect();
            for gesture in gestures {
                if page.user_gesture(gesture) {
                    debug!(?gesture, "Gesture resumed playback");
                    self.listeners = None;
                    break;
                }
            }
            page.tick();
        }

        if let Err(e) = self.arm_gesture_listeners() {
            warn!(error = ?e, "Failed to install gesture listeners");
        }
    }

    /// A click on an annotated track element.
    #[wasm_bindgen(js_name = clickTrack)]
    pub fn click_track(&self, track_id: &str) -> Result<bool, JsValue> {
        let annotations = scrape_track_annotations(&document()?)?;
        Ok(self.page.borrow_mut().click_track(&annotations, track_id))
    }

    /// The `track-selected` entry point: fetch by id, then play.
    ///
    /// Resolves to whether a playlist was loaded.
    #[wasm_bindgen(js_name = selectTrack)]
    pub fn select_track(&self, track_id: String) -> js_sys::Promise {
        let page = self.page.clone();
        future_to_promise(async move {
            let Some(api) = page.borrow().api() else {
                warn!("selectTrack called without an HTTP client");
                return Ok(JsValue::FALSE);
            };
            let fetched = api.fetch_track(&track_id).await;
            let loaded = page.borrow_mut().apply_selection(&track_id, fetched);
            Ok(JsValue::from_bool(loaded))
        })
    }

    #[wasm_bindgen(js_name = togglePlayPause)]
    pub fn toggle_play_pause(&self) {
        self.page.borrow_mut().toggle_play_pause();
    }

    pub fn next(&self) {
        self.page.borrow_mut().next();
    }

    pub fn previous(&self) {
        self.page.borrow_mut().previous();
    }

    #[wasm_bindgen(js_name = setVolume)]
    pub fn set_volume(&self, volume: f64) {
        self.page.borrow_mut().widget_mut().set_volume(volume);
    }

    #[wasm_bindgen(js_name = beginSeek)]
    pub fn begin_seek(&self) {
        self.page.borrow_mut().widget_mut().begin_seek();
    }

    #[wasm_bindgen(js_name = updateSeek)]
    pub fn update_seek(&self, fraction: f64) {
        self.page.borrow_mut().widget_mut().update_seek(fraction);
    }

    #[wasm_bindgen(js_name = endSeek)]
    pub fn end_seek(&self) {
        self.page.borrow_mut().widget_mut().end_seek();
    }

    /// Current render model as JSON.
    #[wasm_bindgen(js_name = viewJson)]
    pub fn view_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(self.page.borrow().widget().view()).map_err(js_err)
    }
}

impl WebPlayer {
    /// Keep document listeners installed exactly while a gesture is awaited.
    fn arm_gesture_listeners(&mut self) -> Result<(), JsValue> {
        let awaiting = self.page.borrow().widget().awaiting_gesture();
        let armed = self.listeners.as_ref().is_some_and(GestureListeners::is_armed);
        match (awaiting, armed) {
            (true, false) => {
                let target: EventTarget = document()?.into();
                self.listeners = Some(GestureListeners::install(target, self.gestures.clone())?);
            }
            (false, _) => {
                self.listeners = None;
                self.gestures.borrow_mut().clear();
            }
            _ => {}
        }
        Ok(())
    }
}
