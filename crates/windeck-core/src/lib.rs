//! # windeck-core
//!
//! Shared library for windeck containing the domain entities, the click
//! coordinate mapper, the key translation table, the typed remote command
//! set, and the RPC result-envelope unwrapper.
//!
//! This crate is pure logic: it has zero dependencies on HTTP clients, the
//! filesystem, async runtimes, or terminals.  Everything here can be unit
//! tested with plain values.
//!
//! # Architecture overview
//!
//! windeck is an operator console for an Electron application that exposes a
//! window-management RPC API over HTTP.  The console lists the application's
//! browser windows, polls one of them for near-real-time snapshots, and
//! forwards synthetic keyboard and mouse input back to it.
//!
//! This crate defines:
//!
//! - **`domain`** – Window descriptors as the server reports them, the
//!   operator's bounds edit buffer, capture settings with their persisted
//!   defaults, and the geometry that maps a click on a scaled snapshot back
//!   to a point in the real window.
//!
//! - **`keymap`** – The fixed translation table from operator key names to
//!   the synthetic key codes the Electron side expects (Enter→Return,
//!   ArrowUp→Up, and so on), plus the allow-list rules for what is forwarded
//!   at all.
//!
//! - **`command`** – The typed set of remote window and web-contents actions,
//!   serialized to the server's scripted-action wire strings in exactly one
//!   place.
//!
//! - **`envelope`** – Unwrapping of the server's nested RPC result envelope,
//!   including its double JSON encoding.

pub mod command;
pub mod domain;
pub mod envelope;
pub mod keymap;

// Re-export the most-used types at the crate root so callers can write
// `windeck_core::WindowDescriptor` instead of the full module path.
pub use command::{ContentCommand, KeyDirection, MouseButton, WindowCommand};
pub use domain::capture::{CaptureSettings, SettingsError};
pub use domain::geometry::{map_to_window, ViewRect};
pub use domain::window::{BoundsDraft, WindowBounds, WindowDescriptor};
pub use envelope::{unwrap_envelope, EnvelopeError};
pub use keymap::{KeyPress, SyntheticKey};
