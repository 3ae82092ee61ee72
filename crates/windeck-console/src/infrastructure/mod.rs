//! Infrastructure layer: HTTP transport, persistence, frame spooling, and
//! the interactive console.

pub mod console;
pub mod frames;
pub mod http;
pub mod storage;

pub use frames::FrameSurface;
pub use http::RpcClient;
pub use storage::{Settings, SettingsStore, StorageError, TokenStore};
