//! Application layer: use cases composed from the domain and the RPC seam.
//!
//! This layer owns the behavior of the console — the capture loop schedule,
//! the session's window/selection/bounds state machine — and depends on the
//! remote server only through the traits in [`api`].  The concrete HTTP
//! implementation lives in the infrastructure layer.

pub mod api;
pub mod capture;
pub mod session;

pub use api::{ApiError, BoundsOutcome, OpenWindowRequest, SnapshotSource, WindowApi};
pub use capture::{CaptureLoop, FrameSink};
pub use session::{ConsoleSession, OpenOutcome, SessionError};
