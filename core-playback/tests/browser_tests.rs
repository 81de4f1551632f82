#![cfg(target_arch = "wasm32")]
//! Browser tests for DOM scraping and gesture listeners.

use core_playback::wasm::{scrape_track_annotations, GestureListeners, GestureQueue};
use core_playback::Gesture;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen_test::*;
use web_sys::{Document, Event, EventTarget};

wasm_bindgen_test_configure!(run_in_browser);

fn document() -> Document {
    web_sys::window().unwrap().document().unwrap()
}

fn fire(target: &EventTarget, name: &str) {
    target.dispatch_event(&Event::new(name).unwrap()).unwrap();
}

#[wasm_bindgen_test]
fn test_annotated_elements_scraped_in_document_order() {
    let document = document();
    let section = document.create_element("section").unwrap();
    section.set_inner_html(
        r#"<a data-track-id="scrape-7" data-title="Seven" data-type="single"></a>
           <span>not a track</span>
           <a data-track-id="scrape-8" data-album="LP" data-cover="/images/8.png"></a>"#,
    );
    document.document_element().unwrap().append_child(&section).unwrap();

    let scraped: Vec<_> = scrape_track_annotations(&document)
        .unwrap()
        .into_iter()
        .filter(|a| a.id.as_deref().is_some_and(|id| id.starts_with("scrape-")))
        .collect();
    section.remove();

    assert_eq!(scraped.len(), 2);
    assert_eq!(scraped[0].title.as_deref(), Some("Seven"));
    assert_eq!(scraped[0].album_type.as_deref(), Some("single"));
    assert_eq!(scraped[1].album.as_deref(), Some("LP"));
    assert_eq!(scraped[1].cover.as_deref(), Some("/images/8.png"));
    assert_eq!(scraped[1].title, None);
}

#[wasm_bindgen_test]
fn test_first_gesture_removes_all_listeners() {
    let target: EventTarget = document().create_element("div").unwrap().into();
    let queue: GestureQueue = Rc::new(RefCell::new(Vec::new()));
    let listeners = GestureListeners::install(target.clone(), queue.clone()).unwrap();
    assert!(listeners.is_armed());

    fire(&target, "keydown");
    assert_eq!(*queue.borrow(), vec![Gesture::KeyPress]);
    assert!(!listeners.is_armed());

    fire(&target, "click");
    fire(&target, "touchstart");
    assert_eq!(queue.borrow().len(), 1);
}

#[wasm_bindgen_test]
fn test_dropped_listeners_ignore_gestures() {
    let target: EventTarget = document().create_element("div").unwrap().into();
    let queue: GestureQueue = Rc::new(RefCell::new(Vec::new()));
    drop(GestureListeners::install(target.clone(), queue.clone()).unwrap());

    fire(&target, "click");
    assert!(queue.borrow().is_empty());
}
