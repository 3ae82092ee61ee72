//! Unwrapping of the server's nested RPC result envelope.
//!
//! Successful RPC responses usually arrive double-encoded: the HTTP body is a
//! JSON object whose actual payload is a *JSON string* nested inside it:
//!
//! ```json
//! { "result": { "content": [ { "text": "[1,2,3]" } ], "isError": false } }
//! ```
//!
//! Callers want the inner value (`[1,2,3]`), not the wrapper.  The double
//! encoding is a fixed wire contract of the remote server and is preserved
//! here exactly: when the body matches the envelope shape, the inner string
//! is parsed and returned; any other body is returned unchanged.  Some
//! procedures (notably `set_window_bounds`) also report failures in-band via
//! `result.isError` plus a human-readable `text` — helpers for both live
//! here so the shape is spelled out in one module only.

use serde_json::Value;
use thiserror::Error;

/// Errors that can occur while unwrapping an envelope.
#[derive(Debug, Error)]
pub enum EnvelopeError {
    /// The body matched the envelope shape but the inner `text` was not
    /// valid JSON.
    #[error("envelope inner text is not valid JSON: {0}")]
    InnerJson(#[source] serde_json::Error),
}

/// Extracts the payload from an RPC response body.
///
/// If `body` has the shape `{ result: { content: [ { text: <string> } ] } }`,
/// the inner string is parsed as JSON and its value returned.  Any body that
/// does not match the shape is returned unchanged.
///
/// # Errors
///
/// Returns [`EnvelopeError::InnerJson`] when the envelope shape matches but
/// the inner string does not parse.
pub fn unwrap_envelope(body: Value) -> Result<Value, EnvelopeError> {
    if let Some(text) = inner_text(&body) {
        return serde_json::from_str(text).map_err(EnvelopeError::InnerJson);
    }
    Ok(body)
}

/// `true` when the response flags an in-band procedure failure.
pub fn is_error(body: &Value) -> bool {
    body.pointer("/result/isError")
        .and_then(Value::as_bool)
        .unwrap_or(false)
}

/// The first `result.content[].text` entry, when present.
///
/// For error responses this carries the human-readable message.
pub fn inner_text(body: &Value) -> Option<&str> {
    body.pointer("/result/content/0/text").and_then(Value::as_str)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
