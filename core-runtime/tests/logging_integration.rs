//! Integration tests for logging system

use bridge_traits::time::{ConsoleLogger, LogLevel, LoggerSink};
use core_runtime::logging::{init_logging, redact_if_sensitive, LogFormat, LoggingConfig};
use core_runtime::Error;
use std::sync::Arc;

#[test]
fn test_config_chaining() {
    let config = LoggingConfig::default()
        .with_format(LogFormat::Compact)
        .with_level(LogLevel::Warn)
        .with_pii_redaction(false)
        .with_spans(false)
        .with_target(false)
        .with_thread_info(true);

    assert_eq!(config.format, LogFormat::Compact);
    assert_eq!(config.level, LogLevel::Warn);
    assert!(!config.redact_pii);
    assert!(!config.enable_spans);
    assert!(!config.display_target);
    assert!(config.display_thread_info);
}

#[test]
fn test_sensitive_fields_are_redacted() {
    assert_eq!(redact_if_sensitive("session_token", "abc"), "[REDACTED]");
    assert_eq!(redact_if_sensitive("cookie", "sid=1"), "[REDACTED]");
    assert_eq!(redact_if_sensitive("title", "Song Name"), "Song Name");
    assert_eq!(redact_if_sensitive("track_id", "12345"), "12345");
}

#[test]
fn test_init_logging_only_once() {
    let sink: Arc<dyn LoggerSink> = Arc::new(ConsoleLogger {
        min_level: LogLevel::Error,
    });
    let config = LoggingConfig::default()
        .with_format(LogFormat::Compact)
        .with_level(LogLevel::Warn)
        .with_logger_sink(sink);

    assert!(init_logging(config.clone()).is_ok());
    tracing::warn!(target: "core_playback", "logging initialized in test");

    // A second global subscriber is refused
    assert!(matches!(init_logging(config), Err(Error::LoggingInit(_))));
}
