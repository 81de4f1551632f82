//! `HTMLAudioElement` implementation of the media output bridge.
//!
//! DOM media events are captured by listeners installed at construction and
//! queued; the host drains them with [`HtmlAudioOutput::take_events`] and
//! forwards each one to the player. The outcome of `play()` (a promise) is
//! queued the same way: a rejection becomes [`MediaEvent::PlayBlocked`].

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use bridge_traits::media::{MediaElement, MediaErrorCode, MediaErrorInfo, MediaEvent};
use tracing::debug;
use wasm_bindgen::{closure::Closure, JsCast};
use wasm_bindgen_futures::{spawn_local, JsFuture};
use web_sys::{EventTarget, HtmlAudioElement};

use crate::error::{dom_exception_name, js_message, WasmError, WasmResult};

type EventQueue = Rc<RefCell<VecDeque<MediaEvent>>>;

/// One `<audio>` element acting as a player output.
pub struct HtmlAudioOutput {
    audio: HtmlAudioElement,
    events: EventQueue,
    // Dropping a Closure detaches the JS function, so they live as long as the output.
    _listeners: Vec<(&'static str, Closure<dyn FnMut()>)>,
}

impl HtmlAudioOutput {
    /// Wrap the `<audio>` element with the given DOM id, creating and
    /// appending it to `<body>` when it does not exist yet.
    pub fn attach_or_create(element_id: &str) -> WasmResult<Self> {
        let document = web_sys::window()
            .and_then(|w| w.document())
            .ok_or_else(|| WasmError::NotAvailable("document".into()))?;

        let audio = match document.get_element_by_id(element_id) {
            Some(existing) => existing
                .dyn_into::<HtmlAudioElement>()
                .map_err(|_| WasmError::UnexpectedElement(element_id.to_string()))?,
            None => {
                let audio: HtmlAudioElement = document
                    .create_element("audio")?
                    .dyn_into()
                    .map_err(|_| WasmError::UnexpectedElement("audio".into()))?;
                audio.set_id(element_id);
                audio.set_attribute("preload", "metadata")?;
                document
                    .body()
                    .ok_or_else(|| WasmError::NotAvailable("document.body".into()))?
                    .append_child(&audio)?;
                audio
            }
        };

        Self::wrap(audio)
    }

    /// Wrap an existing element and start listening to its media events.
    pub fn wrap(audio: HtmlAudioElement) -> WasmResult<Self> {
        let events: EventQueue = Rc::new(RefCell::new(VecDeque::new()));
        let target: &EventTarget = audio.as_ref();
        let mut listeners = Vec::new();

        for name in [
            "loadedmetadata",
            "canplay",
            "playing",
            "pause",
            "timeupdate",
            "ended",
            "error",
        ] {
            let queue = events.clone();
            let element = audio.clone();
            let callback = Closure::wrap(Box::new(move || {
                if let Some(event) = translate(name, &element) {
                    queue.borrow_mut().push_back(event);
                }
            }) as Box<dyn FnMut()>);
            target.add_event_listener_with_callback(name, callback.as_ref().unchecked_ref())?;
            listeners.push((name, callback));
        }

        Ok(Self {
            audio,
            events,
            _listeners: listeners,
        })
    }

    /// Remove and return every media event observed since the last call.
    pub fn take_events(&self) -> Vec<MediaEvent> {
        self.events.borrow_mut().drain(..).collect()
    }

    /// Underlying DOM element.
    pub fn element(&self) -> &HtmlAudioElement {
        &self.audio
    }
}

impl Drop for HtmlAudioOutput {
    fn drop(&mut self) {
        let target: &EventTarget = self.audio.as_ref();
        for (name, callback) in &self._listeners {
            let _ = target
                .remove_event_listener_with_callback(name, callback.as_ref().unchecked_ref());
        }
    }
}

fn translate(name: &str, audio: &HtmlAudioElement) -> Option<MediaEvent> {
    Some(match name {
        "loadedmetadata" => MediaEvent::MetadataLoaded {
            duration: finite(audio.duration()),
        },
        "canplay" => MediaEvent::CanPlay,
        "playing" => MediaEvent::Playing,
        "pause" => MediaEvent::Paused,
        "timeupdate" => MediaEvent::TimeUpdate,
        "ended" => MediaEvent::Ended,
        "error" => MediaEvent::Error,
        _ => return None,
    })
}

fn finite(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

impl MediaElement for HtmlAudioOutput {
    fn set_source(&self, url: &str) {
        self.audio.set_src(url);
    }

    fn source(&self) -> Option<String> {
        let src = self.audio.src();
        (!src.is_empty()).then_some(src)
    }

    fn request_play(&self) {
        let queue = self.events.clone();
        match self.audio.play() {
            Ok(promise) => spawn_local(async move {
                if let Err(err) = JsFuture::from(promise).await {
                    let reason = dom_exception_name(&err).unwrap_or_else(|| js_message(&err));
                    debug!(reason = %reason, "play() rejected");
                    queue
                        .borrow_mut()
                        .push_back(MediaEvent::PlayBlocked { reason });
                }
            }),
            Err(err) => queue.borrow_mut().push_back(MediaEvent::PlayBlocked {
                reason: js_message(&err),
            }),
        }
    }

    fn pause(&self) {
        let _ = self.audio.pause();
    }

    fn is_paused(&self) -> bool {
        self.audio.paused()
    }

    fn current_time(&self) -> f64 {
        self.audio.current_time()
    }

    fn set_current_time(&self, seconds: f64) {
        self.audio.set_current_time(seconds);
    }

    fn duration(&self) -> Option<f64> {
        finite(self.audio.duration())
    }

    fn volume(&self) -> f64 {
        self.audio.volume()
    }

    fn set_volume(&self, volume: f64) {
        self.audio.set_volume(volume.clamp(0.0, 1.0));
    }

    fn error(&self) -> Option<MediaErrorInfo> {
        self.audio.error().map(|err| {
            MediaErrorInfo::new(MediaErrorCode::from_code(err.code()), err.message())
        })
    }
}
