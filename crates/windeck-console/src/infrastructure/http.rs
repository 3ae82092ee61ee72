//! HTTP client for the remote RPC and snapshot endpoints.
//!
//! All remote operations go through two endpoints:
//!
//! - `POST {base}/rpc/{procedure}` with a JSON argument map and a bearer
//!   token — the RPC surface.
//! - `GET {base}/ui/snapshot?win_id=&quality=&scale=&token=` — the snapshot
//!   image fetch, token passed as a query parameter because image viewers
//!   cannot set headers.
//!
//! # The 401 policy
//!
//! A 401 from any RPC call means the token is dead.  [`RpcClient::call`]
//! clears the token store locally and fails with [`ApiError::Unauthorized`]
//! — a terminal error that is never retried.  Subsequent calls go out
//! without a credential until the operator logs in again.
//!
//! Any other non-success status is returned as a normal response from
//! `call`: whether that is fatal depends on the procedure, so the check
//! belongs to the caller.  [`RpcClient::call_json`] is the strict variant
//! used where a payload is required.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;
use reqwest::StatusCode;
use serde_json::{json, Value};
use tracing::{debug, warn};
use url::Url;

use windeck_core::envelope;
use windeck_core::{BoundsDraft, ContentCommand, MouseButton, WindowCommand, WindowDescriptor};

use crate::application::api::{
    ApiError, BoundsOutcome, OpenWindowRequest, SnapshotSource, WindowApi,
};
use crate::domain::ConsoleConfig;
use crate::infrastructure::storage::TokenStore;

/// Authenticated client for the remote window-management API.
pub struct RpcClient {
    http: reqwest::Client,
    base_url: Url,
    tokens: Arc<TokenStore>,
}

impl RpcClient {
    /// Builds a client from the console configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be constructed
    /// (TLS backend initialization).
    pub fn new(config: &ConsoleConfig, tokens: Arc<TokenStore>) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            http,
            base_url: config.base_url.clone(),
            tokens,
        })
    }

    /// Invokes a remote procedure, attaching the current bearer token.
    ///
    /// Returns the raw response for every status except 401.  Checking the
    /// status is the caller's responsibility — several procedures report
    /// their failures in-band and still want the body.
    ///
    /// # Errors
    ///
    /// - [`ApiError::Unauthorized`] on 401, after clearing the token store.
    /// - [`ApiError::Transport`] when the request never completes.
    pub async fn call(&self, procedure: &str, args: Value) -> Result<reqwest::Response, ApiError> {
        let url = self.endpoint(&format!("rpc/{procedure}"));

        let mut request = self.http.post(url).json(&args);
        if let Some(token) = self.tokens.get() {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        if response.status() == StatusCode::UNAUTHORIZED {
            // Local policy: a rejected credential logs the operator out.
            if let Err(e) = self.tokens.clear() {
                warn!("failed to clear rejected token: {e}");
            }
            return Err(ApiError::Unauthorized);
        }

        Ok(response)
    }

    /// Invokes a remote procedure and returns its unwrapped JSON payload.
    ///
    /// # Errors
    ///
    /// In addition to [`RpcClient::call`]'s errors:
    /// - [`ApiError::Procedure`] (embedding the procedure name and status)
    ///   on any non-success status.
    /// - [`ApiError::Envelope`] when the body is not JSON or the result
    ///   envelope's inner text does not parse.
    pub async fn call_json(&self, procedure: &str, args: Value) -> Result<Value, ApiError> {
        let response = self.call(procedure, args).await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Procedure {
                procedure: procedure.to_string(),
                status: status.as_u16(),
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| ApiError::Envelope(e.to_string()))?;

        envelope::unwrap_envelope(body).map_err(|e| ApiError::Envelope(e.to_string()))
    }

    /// Builds the parameterized snapshot URL for a window.
    ///
    /// The current token rides along as a query parameter (URL-encoded); an
    /// empty store produces an empty `token=` parameter, mirroring the wire
    /// contract.
    pub fn snapshot_url(&self, win_id: i64, quality: u8, scale: f64) -> Url {
        let mut url = self.endpoint("ui/snapshot");
        let token = self.tokens.get().unwrap_or_default();
        url.query_pairs_mut()
            .append_pair("win_id", &win_id.to_string())
            .append_pair("quality", &quality.to_string())
            .append_pair("scale", &scale.to_string())
            .append_pair("token", &token);
        url
    }

    /// Resolves an endpoint path against the configured base URL.
    fn endpoint(&self, suffix: &str) -> Url {
        let mut url = self.base_url.clone();
        let path = format!("{}/{suffix}", url.path().trim_end_matches('/'));
        url.set_path(&path);
        url
    }
}

// ── Control plane ─────────────────────────────────────────────────────────────

impl WindowApi for RpcClient {
    async fn get_windows(&self) -> Result<Vec<WindowDescriptor>, ApiError> {
        let value = self.call_json("get_windows", json!({})).await?;

        // The server reports a non-array payload while it is still starting
        // up; treat that as "no windows yet" rather than a schema error.
        if !value.is_array() {
            return Ok(Vec::new());
        }
        serde_json::from_value(value).map_err(|e| ApiError::Envelope(e.to_string()))
    }

    async fn open_window(&self, request: OpenWindowRequest) -> Result<(), ApiError> {
        self.call(
            "open_window",
            json!({
                "url": request.url,
                "accountIdx": request.account_idx,
                "reuseWindow": request.reuse_window,
                "options": {"width": request.width, "height": request.height},
            }),
        )
        .await
        .map(drop)
    }

    async fn close_window(&self, win_id: i64) -> Result<(), ApiError> {
        self.call("close_window", json!({"win_id": win_id})).await.map(drop)
    }

    async fn set_window_bounds(
        &self,
        win_id: i64,
        bounds: BoundsDraft,
    ) -> Result<BoundsOutcome, ApiError> {
        let response = self
            .call(
                "set_window_bounds",
                json!({
                    "win_id": win_id,
                    "x": bounds.x,
                    "y": bounds.y,
                    "width": bounds.w,
                    "height": bounds.h,
                }),
            )
            .await?;

        // Bounds failures come back in-band: the body is read regardless of
        // status and `result.isError` decides the outcome.
        let body: Value = response
            .json()
            .await
            .map_err(|e| ApiError::Envelope(e.to_string()))?;

        if envelope::is_error(&body) {
            Ok(BoundsOutcome {
                applied: false,
                message: envelope::inner_text(&body).unwrap_or("error").to_string(),
            })
        } else {
            Ok(BoundsOutcome { applied: true, message: "applied".to_string() })
        }
    }

    async fn window_command(&self, win_id: i64, command: WindowCommand) -> Result<(), ApiError> {
        self.call(
            WindowCommand::PROCEDURE,
            json!({"win_id": win_id, "code": command.script()}),
        )
        .await
        .map(drop)
    }

    async fn content_command(&self, win_id: i64, command: ContentCommand) -> Result<(), ApiError> {
        self.call(
            ContentCommand::PROCEDURE,
            json!({"win_id": win_id, "code": command.script()}),
        )
        .await
        .map(drop)
    }

    async fn click(
        &self,
        win_id: i64,
        x: i32,
        y: i32,
        button: MouseButton,
    ) -> Result<(), ApiError> {
        self.call(
            "cdp_click",
            json!({"win_id": win_id, "x": x, "y": y, "button": button.as_str()}),
        )
        .await
        .map(drop)
    }

    async fn ping(&self) -> Result<Duration, ApiError> {
        // A HEAD against the snapshot endpoint with throwaway parameters;
        // only the round trip matters, not the status.
        let mut url = self.endpoint("ui/snapshot");
        url.query_pairs_mut()
            .append_pair("win_id", "0")
            .append_pair("token", "x");

        let start = Instant::now();
        self.http
            .head(url)
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        Ok(start.elapsed())
    }
}

// ── Data plane ────────────────────────────────────────────────────────────────

impl SnapshotSource for RpcClient {
    async fn fetch_snapshot(
        &self,
        win_id: i64,
        quality: u8,
        scale: f64,
    ) -> Result<Option<Vec<u8>>, ApiError> {
        let url = self.snapshot_url(win_id, quality, scale);

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            // Expected miss: the window may be minimized or mid-navigation.
            debug!(win_id, status = %response.status(), "no snapshot available");
            return Ok(None);
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        Ok(Some(bytes.to_vec()))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn temp_dir() -> PathBuf {
        static COUNTER: AtomicU32 = AtomicU32::new(0);
        let n = COUNTER.fetch_add(1, Ordering::Relaxed);
        let dir = std::env::temp_dir().join(format!(
            "windeck_http_test_{}_{n}",
            std::process::id()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn make_client(base: &str) -> (RpcClient, Arc<TokenStore>) {
        let tokens = Arc::new(TokenStore::open(&temp_dir()).unwrap());
        let config = ConsoleConfig {
            base_url: base.parse().unwrap(),
            request_timeout: Duration::from_secs(5),
        };
        let client = RpcClient::new(&config, Arc::clone(&tokens)).unwrap();
        (client, tokens)
    }

    #[test]
    fn test_endpoint_joins_procedure_path() {
        let (client, _) = make_client("http://127.0.0.1:8101");
        let url = client.endpoint("rpc/get_windows");
        assert_eq!(url.as_str(), "http://127.0.0.1:8101/rpc/get_windows");
    }

    #[test]
    fn test_endpoint_tolerates_trailing_slash_on_base() {
        let (client, _) = make_client("http://127.0.0.1:8101/");
        let url = client.endpoint("rpc/get_windows");
        assert_eq!(url.as_str(), "http://127.0.0.1:8101/rpc/get_windows");
    }

    #[test]
    fn test_snapshot_url_carries_all_parameters() {
        let (client, tokens) = make_client("http://127.0.0.1:8101");
        tokens.set("secret").unwrap();

        let url = client.snapshot_url(3, 80, 0.5);

        assert_eq!(url.path(), "/ui/snapshot");
        let query = url.query().unwrap();
        assert!(query.contains("win_id=3"));
        assert!(query.contains("quality=80"));
        assert!(query.contains("scale=0.5"));
        assert!(query.contains("token=secret"));
    }

    #[test]
    fn test_snapshot_url_percent_encodes_the_token() {
        let (client, tokens) = make_client("http://127.0.0.1:8101");
        tokens.set("a/b c").unwrap();

        let url = client.snapshot_url(1, 80, 0.5);

        let query = url.query().unwrap();
        assert!(query.contains("token=a%2Fb+c"), "got query: {query}");
    }

    #[test]
    fn test_snapshot_url_with_no_token_has_empty_parameter() {
        let (client, _) = make_client("http://127.0.0.1:8101");
        let url = client.snapshot_url(1, 80, 0.5);
        assert!(url.query().unwrap().contains("token="));
    }
}
