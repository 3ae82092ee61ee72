//! The RPC seam: traits the session and capture loop depend on.
//!
//! The application layer never talks HTTP directly.  It calls the traits
//! below; the infrastructure layer implements them on the real `RpcClient`,
//! and tests implement them on recording fakes.  Errors are expressed in
//! application terms ([`ApiError`]) so nothing above this line needs to know
//! about the transport.
//!
//! The control plane ([`WindowApi`]) and the data plane ([`SnapshotSource`])
//! are separate traits because the capture loop only ever needs the latter.

use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use windeck_core::{BoundsDraft, ContentCommand, MouseButton, WindowCommand, WindowDescriptor};

// ── Error type ────────────────────────────────────────────────────────────────

/// Errors surfaced by the RPC seam.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The server rejected the credential with HTTP 401.
    ///
    /// By the time this error is observed the token store has already been
    /// cleared — the caller's only job is to send the operator back to login.
    #[error("unauthorized: session token rejected")]
    Unauthorized,

    /// The request never completed (connection refused, DNS, timeout, …).
    #[error("transport error: {0}")]
    Transport(String),

    /// The procedure returned a non-success HTTP status.
    #[error("rpc/{procedure} returned status {status}")]
    Procedure { procedure: String, status: u16 },

    /// The response body did not match the expected envelope or schema.
    #[error("malformed response: {0}")]
    Envelope(String),
}

// ── Request / outcome types ───────────────────────────────────────────────────

/// Arguments for the `open_window` procedure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenWindowRequest {
    pub url: String,
    /// Which stored account profile the new window uses.
    pub account_idx: u32,
    /// `false` always — the console does its own reuse-by-host check first.
    pub reuse_window: bool,
    pub width: u32,
    pub height: u32,
}

impl OpenWindowRequest {
    /// A request with the console's standard window size.
    pub fn new(url: &str, account_idx: u32) -> Self {
        Self {
            url: url.to_string(),
            account_idx,
            reuse_window: false,
            width: 1200,
            height: 800,
        }
    }
}

/// Result of a `set_window_bounds` call.
///
/// Bounds failures are reported in-band by the server (`result.isError`) and
/// surfaced to the operator as a message, not raised as an [`ApiError`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundsOutcome {
    /// `false` when the server flagged the request via `result.isError`.
    pub applied: bool,
    /// "applied" on success, otherwise the server's error text.
    pub message: String,
}

// ── Traits ────────────────────────────────────────────────────────────────────

/// Control-plane operations against the remote window manager.
pub trait WindowApi: Send + Sync + 'static {
    /// Lists all windows.  The server is authoritative; the result is never
    /// cached beyond the caller's own state.
    fn get_windows(&self)
        -> impl Future<Output = Result<Vec<WindowDescriptor>, ApiError>> + Send;

    /// Opens a new window.
    fn open_window(
        &self,
        request: OpenWindowRequest,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;

    /// Closes a window.
    fn close_window(&self, win_id: i64) -> impl Future<Output = Result<(), ApiError>> + Send;

    /// Moves/resizes a window, reporting in-band failures as an outcome.
    fn set_window_bounds(
        &self,
        win_id: i64,
        bounds: BoundsDraft,
    ) -> impl Future<Output = Result<BoundsOutcome, ApiError>> + Send;

    /// Executes a typed action against the window object.
    fn window_command(
        &self,
        win_id: i64,
        command: WindowCommand,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;

    /// Executes a typed action against the window's web contents.
    fn content_command(
        &self,
        win_id: i64,
        command: ContentCommand,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;

    /// Forwards a synthetic click at absolute window coordinates.
    fn click(
        &self,
        win_id: i64,
        x: i32,
        y: i32,
        button: MouseButton,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;

    /// Measures round-trip latency to the server.
    fn ping(&self) -> impl Future<Output = Result<Duration, ApiError>> + Send;
}

/// Data-plane operation: one snapshot fetch per poll tick.
pub trait SnapshotSource: Send + Sync + 'static {
    /// Fetches one snapshot of `win_id` at the given quality and scale.
    ///
    /// Returns `Ok(None)` when the server has no frame this tick (any
    /// non-success status) — that is an expected miss, not an error.
    fn fetch_snapshot(
        &self,
        win_id: i64,
        quality: u8,
        scale: f64,
    ) -> impl Future<Output = Result<Option<Vec<u8>>, ApiError>> + Send;
}
