//! Window descriptors as reported by the remote `get_windows` procedure.
//!
//! The server is authoritative for everything in this module: descriptors
//! are never mutated locally and never cached beyond the latest fetch.

use serde::{Deserialize, Serialize};

/// Position and size of a remote window, in device pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowBounds {
    /// X coordinate of the top-left corner on the remote desktop.
    pub x: i32,
    /// Y coordinate of the top-left corner on the remote desktop.
    pub y: i32,
    /// Window width in pixels.
    pub width: u32,
    /// Window height in pixels.
    pub height: u32,
}

/// Server-reported metadata for one remote browser window.
///
/// Deserialized straight from the `get_windows` response.  `title` and `url`
/// default to empty strings because the server omits them for windows that
/// have not finished loading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowDescriptor {
    /// Unique, server-assigned window id.
    pub id: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    pub bounds: WindowBounds,
}

/// Draft copy of a selected window's bounds, edited by the operator.
///
/// The draft is synced from the [`WindowDescriptor`] when the selection
/// changes and submitted to the server only on an explicit apply.  Until
/// then it is independent of the live descriptor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BoundsDraft {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl BoundsDraft {
    /// Seeds a draft from a window's current server-reported bounds.
    pub fn from_window(win: &WindowDescriptor) -> Self {
        Self {
            x: win.bounds.x,
            y: win.bounds.y,
            w: win.bounds.width as i32,
            h: win.bounds.height as i32,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
