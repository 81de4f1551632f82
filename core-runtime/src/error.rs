use thiserror::Error;

/// Runtime setup failures.
#[derive(Error, Debug)]
pub enum Error {
    /// The `RUST_LOG`-style directive string could not be parsed.
    #[error("Invalid log filter `{filter}`: {reason}")]
    InvalidFilter { filter: String, reason: String },

    /// A global subscriber is already installed, or installing one failed.
    #[error("Logging already initialized or unavailable: {0}")]
    LoggingInit(String),
}

pub type Result<T> = std::result::Result<T, Error>;
