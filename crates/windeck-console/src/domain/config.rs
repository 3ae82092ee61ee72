//! Console configuration types.
//!
//! [`ConsoleConfig`] is the single source of truth for all runtime settings
//! that are fixed for the lifetime of the process (as opposed to the
//! operator-adjustable capture settings, which live in the settings store).
//! It is constructed from CLI arguments in production and from defaults in
//! tests, then shared by reference with every component that needs it.
//!
//! Keeping configuration as a plain struct — no global state, no environment
//! variable reads inside the domain — makes the console easy to embed in
//! tests.  The infrastructure layer is responsible for populating the struct
//! from CLI args or environment variables.

use std::time::Duration;

use url::Url;

/// All process-lifetime configuration for the console.
#[derive(Debug, Clone)]
pub struct ConsoleConfig {
    /// Base URL of the remote RPC server.
    ///
    /// The RPC endpoint is `{base}/rpc/{procedure}` and the snapshot endpoint
    /// is `{base}/ui/snapshot`.  A trailing slash on the base is tolerated.
    pub base_url: Url,

    /// Timeout applied to every HTTP request.
    ///
    /// Snapshot fetches that exceed this are a missed tick, not an error;
    /// RPC calls that exceed it surface as transport failures.
    pub request_timeout: Duration,
}

impl Default for ConsoleConfig {
    /// Returns a `ConsoleConfig` suitable for local development without any
    /// external configuration.
    ///
    /// | Field           | Default                  |
    /// |-----------------|--------------------------|
    /// | base_url        | `http://127.0.0.1:8101`  |
    /// | request_timeout | 15 seconds               |
    fn default() -> Self {
        Self {
            // The `.parse().unwrap()` is safe: this is a compile-time-known
            // valid URL string.
            base_url: "http://127.0.0.1:8101".parse().unwrap(),
            request_timeout: Duration::from_secs(15),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
