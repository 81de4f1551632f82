//! WebAssembly Bridge Implementations
//!
//! Browser implementations of the traits defined in `bridge-traits`, built on
//! `web-sys` and `wasm-bindgen`.
//!
//! # Platform Support
//!
//! This crate is designed exclusively for the `wasm32-unknown-unknown` target.
//! It compiles to nothing on native targets.
//!
//! # Implementations
//!
//! - [`LocalStorageStore`]: `KeyValueStore` over `window.localStorage`
//! - [`HtmlAudioOutput`]: `MediaElement` over an `<audio>` element
//! - [`WasmHttpClient`]: `HttpClient` over `fetch`
//!
//! # Examples
//!
//! ```ignore
//! use bridge_wasm::{HtmlAudioOutput, LocalStorageStore};
//!
//! let store = LocalStorageStore::new()?;
//! let output = HtmlAudioOutput::attach_or_create("mini-player-audio")?;
//! for event in output.take_events() {
//!     page.handle_media_event(event);
//! }
//! ```

#![cfg(target_arch = "wasm32")]
#![warn(missing_docs)]

pub mod error;
pub mod http;
pub mod media;
pub mod storage;

// Re-export commonly used types
pub use error::{WasmError, WasmResult};
pub use http::WasmHttpClient;
pub use media::HtmlAudioOutput;
pub use storage::LocalStorageStore;
