//! # Host Bridge Traits
//!
//! Platform abstraction traits that each host must implement for the player
//! core.
//!
//! ## Overview
//!
//! This crate defines the contract between the playback core and the page or
//! shell it runs in. Each trait is a capability the core requires but that
//! is implemented differently per platform (browser, desktop, tests).
//!
//! ## Traits
//!
//! ### Playback
//! - [`MediaElement`](media::MediaElement) - One physical audio output
//!
//! ### Storage & Networking
//! - [`KeyValueStore`](storage::KeyValueStore) - Durable per-origin string store
//! - [`HttpClient`](http::HttpClient) - Async HTTP for the track metadata API
//!
//! ### Utilities
//! - [`Clock`](time::Clock) - Time source for deterministic timers in tests
//! - [`LoggerSink`](time::LoggerSink) - Forward structured logs to host logging
//!
//! ## Platform Requirements
//!
//! | Platform | Implementation Crate |
//! |----------|---------------------|
//! | Desktop  | `bridge-desktop`    |
//! | Web      | `bridge-wasm`       |
//!
//! ## Error Handling
//!
//! Fallible bridge operations use [`BridgeError`](error::BridgeError).
//! Platform implementations should convert platform-specific errors and keep
//! the context (key name, URL) in the message.
//!
//! ## Thread Safety
//!
//! On native targets every trait requires `Send + Sync` so one instance can be
//! shared through an `Arc`. On `wasm32` the bounds are dropped; see
//! [`platform`].

pub mod error;
pub mod http;
pub mod media;
pub mod platform;
pub mod storage;
pub mod time;

pub use error::BridgeError;

// Re-export commonly used types
pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, RetryPolicy};
pub use media::{MediaElement, MediaErrorCode, MediaErrorInfo, MediaEvent};
pub use storage::{KeyValueStore, MemoryKeyValueStore};
pub use time::{Clock, ConsoleLogger, LogEntry, LogLevel, LoggerSink, ManualClock, SystemClock};
