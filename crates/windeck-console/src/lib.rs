//! windeck-console library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/` and
//! the binary entry point in `main.rs` share the same module tree.
//!
//! # What does windeck-console do?
//!
//! The console is the operator-facing half of windeck.  It talks to a remote
//! Electron application's window-management RPC API over HTTP and lets the
//! operator:
//!
//! 1. Authenticate with a bearer token (`login` / `logout`).
//! 2. List the application's browser windows and select one.
//! 3. Poll the selected window for snapshots on a fixed interval and spool
//!    the latest frame to disk for an external viewer.
//! 4. Forward synthetic clicks and key events back into the window.
//! 5. Edit and apply window bounds, open and close windows.
//!
//! A `watch` mode runs only the snapshot loop against a single window id,
//! bypassing login — the kiosk entry path.

/// Application layer: the RPC seam, the capture loop, and the session.
pub mod application;

/// Domain layer: runtime configuration.
pub mod domain;

/// Infrastructure layer: HTTP client, storage, frame spool, and the
/// interactive console.
pub mod infrastructure;
