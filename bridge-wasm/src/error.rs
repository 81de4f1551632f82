//! Error types for WebAssembly bridge implementations

use bridge_traits::error::BridgeError;
use thiserror::Error;
use wasm_bindgen::{JsCast, JsValue};

/// Result type for WebAssembly bridge operations
pub type WasmResult<T> = Result<T, WasmError>;

/// Errors that can occur in WebAssembly bridge implementations
#[derive(Error, Debug)]
pub enum WasmError {
    /// JavaScript error from web-sys
    #[error("JavaScript error: {0}")]
    JavaScript(String),

    /// A browser API the bridge depends on is missing
    #[error("Browser API not available: {0}")]
    NotAvailable(String),

    /// A DOM element did not have the expected type
    #[error("Unexpected element type: {0}")]
    UnexpectedElement(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<WasmError> for BridgeError {
    fn from(err: WasmError) -> Self {
        match err {
            WasmError::NotAvailable(what) => BridgeError::NotAvailable(what),
            other => BridgeError::OperationFailed(other.to_string()),
        }
    }
}

impl From<JsValue> for WasmError {
    fn from(js_value: JsValue) -> Self {
        WasmError::JavaScript(js_message(&js_value))
    }
}

/// Best-effort human readable message for a thrown JS value.
pub(crate) fn js_message(err: &JsValue) -> String {
    if err.is_string() {
        err.as_string().unwrap_or_default()
    } else if let Some(js_err) = err.dyn_ref::<js_sys::Error>() {
        js_err.message().into()
    } else if let Some(dom_err) = err.dyn_ref::<web_sys::DomException>() {
        format!("{}: {}", dom_err.name(), dom_err.message())
    } else {
        format!("{err:?}")
    }
}

/// Name of a thrown `DOMException`, e.g. `QuotaExceededError` or `NotAllowedError`.
pub(crate) fn dom_exception_name(err: &JsValue) -> Option<String> {
    err.dyn_ref::<web_sys::DomException>().map(|e| e.name())
}

pub(crate) fn js_error(component: &str, context: &str, err: JsValue) -> BridgeError {
    BridgeError::OperationFailed(format!("{component} {context}: {}", js_message(&err)))
}
