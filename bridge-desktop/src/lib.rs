//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for desktop shells
//! (macOS, Windows, Linux).
//!
//! ## Overview
//!
//! - `KeyValueStore` backed by a JSON file in the user data directory
//! - `HttpClient` using `reqwest`
//!
//! Desktop shells bring their own `MediaElement` (whatever audio backend the
//! shell embeds); the core only needs the trait.
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{JsonFileKeyValueStore, ReqwestHttpClient};
//!
//! let store = JsonFileKeyValueStore::open_default("minitune")?;
//! let http = ReqwestHttpClient::new().with_base_url("http://localhost:3000");
//! ```

mod http;
mod storage;

pub use http::ReqwestHttpClient;
pub use storage::JsonFileKeyValueStore;
