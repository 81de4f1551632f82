//! # Core Runtime Module
//!
//! Provides foundational runtime infrastructure for the player:
//! - Logging and tracing infrastructure
//! - A generic, typed event bus
//!
//! ## Overview
//!
//! This crate contains the runtime utilities that the playback crate depends
//! on. It establishes the logging conventions and the event broadcasting
//! mechanism used between the playback controller and its widgets.

pub mod error;
pub mod events;
pub mod logging;

pub use error::{Error, Result};
pub use events::{BusEvent, EventBus, EventSeverity, EventStream};
