//! The console session: window list, selection, bounds editing, input
//! forwarding, and capture-loop lifecycle.
//!
//! This is the dashboard controller.  It owns all operator-visible state and
//! composes the RPC seam, the settings/token stores, the frame surface, and
//! the capture loop into the operations the interactive console exposes.
//! Presentation (parsing command lines, printing results) stays in the
//! infrastructure layer.
//!
//! # Error propagation policy
//!
//! Operator-initiated actions fail loudly and synchronously — every method
//! returns a `Result` the console prints inline.  Capture-loop failures never
//! reach this module; the loop swallows them by design.  Nothing here
//! retries: a retry is the next poll tick or the operator trying again.

use std::sync::Arc;

use tracing::debug;
use url::Url;

use windeck_core::domain::capture::SettingsError;
use windeck_core::{
    keymap, map_to_window, BoundsDraft, CaptureSettings, ContentCommand, KeyDirection, KeyPress,
    MouseButton, ViewRect, WindowCommand, WindowDescriptor,
};

use crate::application::api::{
    ApiError, BoundsOutcome, OpenWindowRequest, SnapshotSource, WindowApi,
};
use crate::application::capture::CaptureLoop;
use crate::infrastructure::frames::FrameSurface;
use crate::infrastructure::storage::{Settings, SettingsStore, StorageError, TokenStore};

use thiserror::Error;

/// Errors surfaced to the operator by session operations.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Login validation: an empty token never reaches the network.
    #[error("token must not be empty")]
    EmptyToken,

    /// The server rejected the login verification call.
    #[error("invalid authentication token")]
    InvalidToken,

    /// The operation requires a selected window.
    #[error("no window selected")]
    NoSelection,

    /// The requested window id is not in the current list.
    #[error("unknown window id {0}")]
    WindowNotFound(i64),

    #[error(transparent)]
    InvalidSettings(#[from] SettingsError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// What `open` did: reused an existing window or asked for a new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenOutcome {
    /// A window on the same host already existed and was focused+selected.
    FocusedExisting(i64),
    /// A new window was requested; the list has been refreshed.
    Opened,
}

/// The interactive console session.
pub struct ConsoleSession<A> {
    api: Arc<A>,
    tokens: Arc<TokenStore>,
    settings_store: SettingsStore,
    settings: Settings,
    surface: Arc<FrameSurface>,
    capture: CaptureLoop,
    windows: Vec<WindowDescriptor>,
    bounds_draft: BoundsDraft,
    /// Operator-described geometry of the external viewer, when set.
    view: Option<ViewRect>,
}

impl<A> ConsoleSession<A>
where
    A: WindowApi + SnapshotSource,
{
    /// Builds a session, loading persisted settings.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Storage`] when the settings file exists but
    /// cannot be read.
    pub fn new(
        api: Arc<A>,
        tokens: Arc<TokenStore>,
        settings_store: SettingsStore,
        surface: Arc<FrameSurface>,
    ) -> Result<Self, SessionError> {
        let settings = settings_store.load()?;
        Ok(Self {
            api,
            tokens,
            settings_store,
            settings,
            surface,
            capture: CaptureLoop::new(),
            windows: Vec::new(),
            bounds_draft: BoundsDraft::default(),
            view: None,
        })
    }

    // ── Authentication ────────────────────────────────────────────────────────

    /// Stores a token and verifies it against the server.
    ///
    /// An empty or whitespace-only token is rejected locally — no network
    /// request is made.  On verification failure the stored token is cleared
    /// again so a bad credential never lingers.
    ///
    /// Returns the number of windows visible with the new credential.
    ///
    /// # Errors
    ///
    /// [`SessionError::EmptyToken`] on validation failure,
    /// [`SessionError::InvalidToken`] when the server rejects the credential,
    /// or the underlying [`ApiError`] for transport failures.
    pub async fn login(&mut self, token: &str) -> Result<usize, SessionError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(SessionError::EmptyToken);
        }

        self.tokens.set(token)?;

        match self.api.get_windows().await {
            Ok(windows) => {
                let count = windows.len();
                self.windows = windows;
                Ok(count)
            }
            Err(err) => {
                // A 401 has already cleared the store inside the client;
                // every other failure clears it here.
                if !matches!(err, ApiError::Unauthorized) {
                    self.tokens.clear()?;
                }
                Err(match err {
                    ApiError::Unauthorized | ApiError::Procedure { .. } => {
                        SessionError::InvalidToken
                    }
                    other => SessionError::Api(other),
                })
            }
        }
    }

    /// Stops monitoring and drops the credential.
    pub fn logout(&mut self) -> Result<(), SessionError> {
        self.capture.stop();
        self.surface.clear();
        self.tokens.clear()?;
        self.windows.clear();
        Ok(())
    }

    // ── Window list and selection ─────────────────────────────────────────────

    /// Refetches the window list from the server.
    pub async fn refresh_windows(&mut self) -> Result<&[WindowDescriptor], SessionError> {
        self.windows = self.api.get_windows().await?;
        Ok(&self.windows)
    }

    /// The latest fetched window list.
    pub fn windows(&self) -> &[WindowDescriptor] {
        &self.windows
    }

    /// The selected window's descriptor, when it is in the current list.
    pub fn selected_window(&self) -> Option<&WindowDescriptor> {
        let id = self.settings.selected_win_id?;
        self.windows.iter().find(|w| w.id == id)
    }

    /// Selects a window: syncs the bounds draft, persists the selection,
    /// focuses the window (best effort), and retargets the capture loop.
    ///
    /// # Errors
    ///
    /// [`SessionError::WindowNotFound`] when `win_id` is not in the current
    /// list — refresh first.
    pub async fn select(&mut self, win_id: i64) -> Result<(), SessionError> {
        let win = self
            .windows
            .iter()
            .find(|w| w.id == win_id)
            .ok_or(SessionError::WindowNotFound(win_id))?;

        self.bounds_draft = BoundsDraft::from_window(win);
        self.settings.selected_win_id = Some(win_id);
        self.persist_settings()?;

        // Focus is cosmetic; a failure must not block selection.
        if let Err(e) = self.api.window_command(win_id, WindowCommand::Focus).await {
            debug!(win_id, "focus on select failed: {e}");
        }

        self.restart_capture();
        Ok(())
    }

    /// Restores state after startup: refreshes the list and, when the
    /// persisted selection still exists, re-selects it.
    pub async fn resume(&mut self) -> Result<(), SessionError> {
        self.refresh_windows().await?;
        if let Some(id) = self.settings.selected_win_id {
            if self.windows.iter().any(|w| w.id == id) {
                self.select(id).await?;
            }
        }
        Ok(())
    }

    // ── Opening and closing windows ───────────────────────────────────────────

    /// Opens `url`, reusing an existing window on the same host when one
    /// exists (focused and selected instead of opening a duplicate).
    pub async fn open(&mut self, url: &str, account_idx: u32) -> Result<OpenOutcome, SessionError> {
        let windows = self.api.get_windows().await?;

        let existing = host_of(url).and_then(|host| {
            windows
                .iter()
                .find(|w| !w.url.is_empty() && w.url.contains(&host))
                .map(|w| w.id)
        });

        if let Some(id) = existing {
            self.api.window_command(id, WindowCommand::Focus).await?;
            self.windows = windows;
            self.select(id).await?;
            return Ok(OpenOutcome::FocusedExisting(id));
        }

        self.api
            .open_window(OpenWindowRequest::new(url, account_idx))
            .await?;
        self.refresh_windows().await?;
        Ok(OpenOutcome::Opened)
    }

    /// Closes the selected window and deselects it.
    pub async fn close_selected(&mut self) -> Result<(), SessionError> {
        let id = self.settings.selected_win_id.ok_or(SessionError::NoSelection)?;

        self.capture.stop();
        self.surface.clear();
        self.api.close_window(id).await?;

        self.settings.selected_win_id = None;
        self.persist_settings()?;
        self.refresh_windows().await?;
        Ok(())
    }

    /// Closes every window the server reports.  Returns how many were closed.
    pub async fn close_all(&mut self) -> Result<usize, SessionError> {
        let windows = self.api.get_windows().await?;
        for win in &windows {
            self.api.close_window(win.id).await?;
        }

        self.capture.stop();
        self.surface.clear();
        self.settings.selected_win_id = None;
        self.persist_settings()?;
        self.refresh_windows().await?;
        Ok(windows.len())
    }

    // ── Bounds editing ────────────────────────────────────────────────────────

    /// The current draft, independent of the live descriptor until applied.
    pub fn bounds_draft(&self) -> BoundsDraft {
        self.bounds_draft
    }

    /// Replaces the draft.  Nothing is sent until [`Self::apply_bounds`].
    pub fn set_bounds_draft(&mut self, draft: BoundsDraft) {
        self.bounds_draft = draft;
    }

    /// Submits the draft.  In-band server failures come back as an outcome
    /// message, not an error; the list is refreshed either way.
    pub async fn apply_bounds(&mut self) -> Result<BoundsOutcome, SessionError> {
        let id = self.settings.selected_win_id.ok_or(SessionError::NoSelection)?;

        let outcome = self.api.set_window_bounds(id, self.bounds_draft).await?;
        self.refresh_windows().await?;
        Ok(outcome)
    }

    // ── Input forwarding ──────────────────────────────────────────────────────

    /// Reloads the selected window's page.
    pub async fn reload(&self) -> Result<(), SessionError> {
        let id = self.settings.selected_win_id.ok_or(SessionError::NoSelection)?;
        self.api.window_command(id, WindowCommand::Reload).await?;
        Ok(())
    }

    /// Maps a click on the displayed frame to window coordinates and
    /// forwards it as a synthetic left click.  Returns the mapped point.
    ///
    /// Without an operator-set view rectangle, clicks are interpreted in the
    /// scaled snapshot's own pixel space.  Out-of-view positions map out of
    /// range and are forwarded as-is.
    pub async fn click(&mut self, x: f64, y: f64) -> Result<(i32, i32), SessionError> {
        let win = self.selected_window().ok_or(SessionError::NoSelection)?;
        let (win_id, width, height) = (win.id, win.bounds.width, win.bounds.height);

        let view = self.view.unwrap_or_else(|| {
            ViewRect::of_scaled_snapshot(width, height, self.settings.capture.scale)
        });
        let (ax, ay) = map_to_window(&view, x, y, width, height);

        self.api.click(win_id, ax, ay, MouseButton::Left).await?;
        Ok((ax, ay))
    }

    /// Forwards a key press through the allow-list and translation table.
    ///
    /// Returns `false` when the press was ignored (modifier chord or
    /// unlisted key) — that is not an error.
    pub async fn send_key(&self, press: KeyPress) -> Result<bool, SessionError> {
        let id = self.settings.selected_win_id.ok_or(SessionError::NoSelection)?;

        let Some(synth) = keymap::translate(&press) else {
            return Ok(false);
        };

        self.api
            .content_command(
                id,
                ContentCommand::SendKey {
                    code: synth.code.clone(),
                    key: synth.key.clone(),
                    direction: KeyDirection::Down,
                },
            )
            .await?;

        if synth.press_and_release {
            self.api
                .content_command(
                    id,
                    ContentCommand::SendKey {
                        code: synth.code,
                        key: synth.key,
                        direction: KeyDirection::Up,
                    },
                )
                .await?;
        }

        Ok(true)
    }

    /// Describes the external viewer's rendered image box for click mapping.
    pub fn set_view(&mut self, view: ViewRect) {
        self.view = Some(view);
    }

    // ── Capture settings and loop control ─────────────────────────────────────

    /// Current persisted settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Enables or disables the poll loop; persisted, applied immediately.
    pub fn set_loop_enabled(&mut self, enabled: bool) -> Result<(), SessionError> {
        self.settings.loop_enabled = enabled;
        self.persist_settings()?;
        self.restart_capture();
        Ok(())
    }

    /// Toggles the controls-panel flag in the status output; persisted.
    pub fn set_controls_visible(&mut self, visible: bool) -> Result<(), SessionError> {
        self.settings.controls_visible = visible;
        self.persist_settings()
    }

    /// Replaces the capture settings after validation; persisted.  A running
    /// loop is restarted so the new values take effect — settings never
    /// reconfigure an in-flight timer.
    pub fn update_capture(&mut self, capture: CaptureSettings) -> Result<(), SessionError> {
        capture.validate()?;
        self.settings.capture = capture;
        self.persist_settings()?;
        self.restart_capture();
        Ok(())
    }

    /// `true` while the poll loop task is scheduled.
    pub fn capture_running(&self) -> bool {
        self.capture.is_running()
    }

    /// The latest spooled frame, if any.
    pub fn current_frame(&self) -> Option<std::path::PathBuf> {
        self.surface.current()
    }

    /// Round-trip latency to the server.
    pub async fn ping(&self) -> Result<std::time::Duration, SessionError> {
        Ok(self.api.ping().await?)
    }

    /// Stops the loop and releases the displayed frame.  Called on teardown.
    pub fn shutdown(&mut self) {
        self.capture.stop();
        self.surface.clear();
    }

    // ── Private helpers ───────────────────────────────────────────────────────

    fn persist_settings(&self) -> Result<(), SessionError> {
        self.settings_store.save(&self.settings)?;
        Ok(())
    }

    /// (Re)starts or stops the loop to match selection + loop flag.  The old
    /// loop is always stopped first so only one loop targets the surface.
    fn restart_capture(&mut self) {
        match self.selected_window().map(|w| w.id) {
            Some(win_id) if self.settings.loop_enabled => {
                self.capture.start(
                    Arc::clone(&self.api),
                    Arc::clone(&self.surface),
                    win_id,
                    self.settings.capture,
                );
            }
            _ => {
                self.capture.stop();
                self.surface.clear();
            }
        }
    }
}

/// Extracts the host from a URL for the open-reuse check.
fn host_of(url: &str) -> Option<String> {
    Url::parse(url).ok()?.host_str().map(str::to_string)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    // ── Recording fake for the RPC seam ──────────────────────────────────────

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        GetWindows,
        OpenWindow(String),
        CloseWindow(i64),
        SetBounds(i64, BoundsDraft),
        WindowCommand(i64, &'static str),
        ContentCommand(i64, String),
        Click(i64, i32, i32, &'static str),
        Ping,
        FetchSnapshot(i64),
    }

    #[derive(Default)]
    struct RecordingApi {
        calls: Mutex<Vec<Call>>,
        windows: Mutex<Vec<WindowDescriptor>>,
        fail_get_windows: Mutex<Option<ApiError>>,
        bounds_outcome: Mutex<Option<BoundsOutcome>>,
    }

    impl RecordingApi {
        fn with_windows(windows: Vec<WindowDescriptor>) -> Arc<Self> {
            let api = Self::default();
            *api.windows.lock().unwrap() = windows;
            Arc::new(api)
        }

        fn record(&self, call: Call) {
            self.calls.lock().unwrap().push(call);
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl WindowApi for RecordingApi {
        async fn get_windows(&self) -> Result<Vec<WindowDescriptor>, ApiError> {
            self.record(Call::GetWindows);
            if let Some(err) = self.fail_get_windows.lock().unwrap().take() {
                return Err(err);
            }
            Ok(self.windows.lock().unwrap().clone())
        }

        async fn open_window(&self, request: OpenWindowRequest) -> Result<(), ApiError> {
            self.record(Call::OpenWindow(request.url));
            Ok(())
        }

        async fn close_window(&self, win_id: i64) -> Result<(), ApiError> {
            self.record(Call::CloseWindow(win_id));
            Ok(())
        }

        async fn set_window_bounds(
            &self,
            win_id: i64,
            bounds: BoundsDraft,
        ) -> Result<BoundsOutcome, ApiError> {
            self.record(Call::SetBounds(win_id, bounds));
            Ok(self
                .bounds_outcome
                .lock()
                .unwrap()
                .take()
                .unwrap_or(BoundsOutcome { applied: true, message: "applied".to_string() }))
        }

        async fn window_command(
            &self,
            win_id: i64,
            command: WindowCommand,
        ) -> Result<(), ApiError> {
            self.record(Call::WindowCommand(win_id, command.script()));
            Ok(())
        }

        async fn content_command(
            &self,
            win_id: i64,
            command: ContentCommand,
        ) -> Result<(), ApiError> {
            self.record(Call::ContentCommand(win_id, command.script()));
            Ok(())
        }

        async fn click(
            &self,
            win_id: i64,
            x: i32,
            y: i32,
            button: MouseButton,
        ) -> Result<(), ApiError> {
            self.record(Call::Click(win_id, x, y, button.as_str()));
            Ok(())
        }

        async fn ping(&self) -> Result<Duration, ApiError> {
            self.record(Call::Ping);
            Ok(Duration::from_millis(12))
        }
    }

    impl SnapshotSource for RecordingApi {
        async fn fetch_snapshot(
            &self,
            win_id: i64,
            _quality: u8,
            _scale: f64,
        ) -> Result<Option<Vec<u8>>, ApiError> {
            self.record(Call::FetchSnapshot(win_id));
            Ok(Some(vec![1, 2, 3]))
        }
    }

    // ── Fixtures ──────────────────────────────────────────────────────────────

    fn temp_dir() -> PathBuf {
        static COUNTER: AtomicU32 = AtomicU32::new(0);
        let n = COUNTER.fetch_add(1, Ordering::Relaxed);
        let dir = std::env::temp_dir().join(format!(
            "windeck_session_test_{}_{n}",
            std::process::id()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn make_window(id: i64, url: &str, width: u32, height: u32) -> WindowDescriptor {
        WindowDescriptor {
            id,
            title: format!("window {id}"),
            url: url.to_string(),
            bounds: windeck_core::WindowBounds { x: 0, y: 0, width, height },
        }
    }

    fn make_session(api: Arc<RecordingApi>) -> ConsoleSession<RecordingApi> {
        let dir = temp_dir();
        let tokens = Arc::new(TokenStore::open(&dir).unwrap());
        let store = SettingsStore::open(&dir);
        let surface = Arc::new(FrameSurface::new(dir.join("frames")).unwrap());
        ConsoleSession::new(api, tokens, store, surface).unwrap()
    }

    // ── Login ─────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_login_with_empty_token_makes_no_network_call() {
        let api = RecordingApi::with_windows(vec![]);
        let mut session = make_session(Arc::clone(&api));

        let result = session.login("   ").await;

        assert!(matches!(result, Err(SessionError::EmptyToken)));
        assert!(api.calls().is_empty(), "validation must short-circuit the network");
    }

    #[tokio::test]
    async fn test_login_stores_token_and_returns_window_count() {
        let api = RecordingApi::with_windows(vec![make_window(1, "", 800, 600)]);
        let mut session = make_session(Arc::clone(&api));

        let count = session.login("secret").await.unwrap();

        assert_eq!(count, 1);
        assert_eq!(session.tokens.get(), Some("secret".to_string()));
    }

    #[tokio::test]
    async fn test_login_trims_surrounding_whitespace() {
        let api = RecordingApi::with_windows(vec![]);
        let mut session = make_session(api);

        session.login("  secret  ").await.unwrap();

        assert_eq!(session.tokens.get(), Some("secret".to_string()));
    }

    #[tokio::test]
    async fn test_failed_login_verification_clears_the_token() {
        let api = RecordingApi::with_windows(vec![]);
        *api.fail_get_windows.lock().unwrap() = Some(ApiError::Procedure {
            procedure: "get_windows".to_string(),
            status: 500,
        });
        let mut session = make_session(Arc::clone(&api));

        let result = session.login("bad").await;

        assert!(matches!(result, Err(SessionError::InvalidToken)));
        assert_eq!(session.tokens.get(), None);
    }

    #[tokio::test]
    async fn test_logout_clears_token_and_window_list() {
        let api = RecordingApi::with_windows(vec![make_window(1, "", 800, 600)]);
        let mut session = make_session(api);
        session.login("secret").await.unwrap();

        session.logout().unwrap();

        assert_eq!(session.tokens.get(), None);
        assert!(session.windows().is_empty());
        assert!(!session.capture_running());
    }

    // ── Selection ─────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_select_syncs_bounds_draft_from_descriptor() {
        let api = RecordingApi::with_windows(vec![make_window(5, "", 1200, 800)]);
        let mut session = make_session(api);
        session.refresh_windows().await.unwrap();

        session.select(5).await.unwrap();

        assert_eq!(session.bounds_draft(), BoundsDraft { x: 0, y: 0, w: 1200, h: 800 });
        assert_eq!(session.selected_window().map(|w| w.id), Some(5));
    }

    #[tokio::test]
    async fn test_select_focuses_the_window() {
        let api = RecordingApi::with_windows(vec![make_window(5, "", 1200, 800)]);
        let mut session = make_session(Arc::clone(&api));
        session.refresh_windows().await.unwrap();

        session.select(5).await.unwrap();

        assert!(api.calls().contains(&Call::WindowCommand(5, "win.focus()")));
    }

    #[tokio::test]
    async fn test_select_unknown_id_fails_without_side_effects() {
        let api = RecordingApi::with_windows(vec![make_window(5, "", 1200, 800)]);
        let mut session = make_session(api);
        session.refresh_windows().await.unwrap();

        let result = session.select(99).await;

        assert!(matches!(result, Err(SessionError::WindowNotFound(99))));
        assert_eq!(session.selected_window(), None);
    }

    #[tokio::test]
    async fn test_select_persists_the_selection() {
        let api = RecordingApi::with_windows(vec![make_window(5, "", 1200, 800)]);
        let mut session = make_session(api);
        session.refresh_windows().await.unwrap();

        session.select(5).await.unwrap();

        let reloaded = session.settings_store.load().unwrap();
        assert_eq!(reloaded.selected_win_id, Some(5));
    }

    #[tokio::test]
    async fn test_select_starts_the_capture_loop() {
        let api = RecordingApi::with_windows(vec![make_window(5, "", 1200, 800)]);
        let mut session = make_session(api);
        session.refresh_windows().await.unwrap();

        session.select(5).await.unwrap();

        assert!(session.capture_running());
        session.shutdown();
    }

    #[tokio::test]
    async fn test_loop_disabled_means_select_does_not_start_capture() {
        let api = RecordingApi::with_windows(vec![make_window(5, "", 1200, 800)]);
        let mut session = make_session(api);
        session.set_loop_enabled(false).unwrap();
        session.refresh_windows().await.unwrap();

        session.select(5).await.unwrap();

        assert!(!session.capture_running());
    }

    // ── Open with host reuse ──────────────────────────────────────────────────

    #[tokio::test]
    async fn test_open_reuses_existing_window_on_same_host() {
        let api = RecordingApi::with_windows(vec![
            make_window(1, "https://example.com/chat", 800, 600),
            make_window(2, "https://other.net/", 800, 600),
        ]);
        let mut session = make_session(Arc::clone(&api));

        let outcome = session.open("https://example.com/settings", 0).await.unwrap();

        assert_eq!(outcome, OpenOutcome::FocusedExisting(1));
        assert_eq!(session.selected_window().map(|w| w.id), Some(1));
        // No open_window call was made.
        assert!(!api.calls().iter().any(|c| matches!(c, Call::OpenWindow(_))));
        session.shutdown();
    }

    #[tokio::test]
    async fn test_open_requests_new_window_when_host_not_present() {
        let api = RecordingApi::with_windows(vec![make_window(1, "https://other.net/", 800, 600)]);
        let mut session = make_session(Arc::clone(&api));

        let outcome = session.open("https://example.com/", 0).await.unwrap();

        assert_eq!(outcome, OpenOutcome::Opened);
        assert!(api
            .calls()
            .contains(&Call::OpenWindow("https://example.com/".to_string())));
    }

    #[tokio::test]
    async fn test_open_with_unparseable_url_opens_new_window() {
        let api = RecordingApi::with_windows(vec![make_window(1, "nonsense", 800, 600)]);
        let mut session = make_session(api);

        let outcome = session.open("not a url", 0).await.unwrap();

        assert_eq!(outcome, OpenOutcome::Opened);
    }

    // ── Closing ───────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_close_selected_deselects_and_stops_capture() {
        let api = RecordingApi::with_windows(vec![make_window(5, "", 1200, 800)]);
        let mut session = make_session(Arc::clone(&api));
        session.refresh_windows().await.unwrap();
        session.select(5).await.unwrap();

        session.close_selected().await.unwrap();

        assert!(api.calls().contains(&Call::CloseWindow(5)));
        assert_eq!(session.selected_window(), None);
        assert!(!session.capture_running());
    }

    #[tokio::test]
    async fn test_close_selected_without_selection_is_an_error() {
        let api = RecordingApi::with_windows(vec![]);
        let mut session = make_session(api);

        assert!(matches!(
            session.close_selected().await,
            Err(SessionError::NoSelection)
        ));
    }

    #[tokio::test]
    async fn test_close_all_closes_every_window() {
        let api = RecordingApi::with_windows(vec![
            make_window(1, "", 800, 600),
            make_window(2, "", 800, 600),
        ]);
        let mut session = make_session(Arc::clone(&api));

        let closed = session.close_all().await.unwrap();

        assert_eq!(closed, 2);
        let calls = api.calls();
        assert!(calls.contains(&Call::CloseWindow(1)));
        assert!(calls.contains(&Call::CloseWindow(2)));
    }

    // ── Bounds ────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_apply_bounds_submits_the_draft() {
        let api = RecordingApi::with_windows(vec![make_window(5, "", 1200, 800)]);
        let mut session = make_session(Arc::clone(&api));
        session.refresh_windows().await.unwrap();
        session.select(5).await.unwrap();

        session.set_bounds_draft(BoundsDraft { x: 10, y: 20, w: 640, h: 480 });
        let outcome = session.apply_bounds().await.unwrap();

        assert!(outcome.applied);
        assert!(api
            .calls()
            .contains(&Call::SetBounds(5, BoundsDraft { x: 10, y: 20, w: 640, h: 480 })));
        session.shutdown();
    }

    #[tokio::test]
    async fn test_apply_bounds_surfaces_in_band_server_error() {
        let api = RecordingApi::with_windows(vec![make_window(5, "", 1200, 800)]);
        *api.bounds_outcome.lock().unwrap() = Some(BoundsOutcome {
            applied: false,
            message: "bounds out of range".to_string(),
        });
        let mut session = make_session(api);
        session.refresh_windows().await.unwrap();
        session.select(5).await.unwrap();

        let outcome = session.apply_bounds().await.unwrap();

        assert!(!outcome.applied);
        assert_eq!(outcome.message, "bounds out of range");
        session.shutdown();
    }

    // ── Click mapping ─────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_click_maps_through_scaled_snapshot_by_default() {
        // scale 0.5 on a 1200x800 window: snapshot space is 600x400, so a
        // click at its center forwards (600, 400).
        let api = RecordingApi::with_windows(vec![make_window(5, "", 1200, 800)]);
        let mut session = make_session(Arc::clone(&api));
        session.refresh_windows().await.unwrap();
        session.select(5).await.unwrap();

        let (ax, ay) = session.click(300.0, 200.0).await.unwrap();

        assert_eq!((ax, ay), (600, 400));
        assert!(api.calls().contains(&Call::Click(5, 600, 400, "left")));
        session.shutdown();
    }

    #[tokio::test]
    async fn test_click_uses_operator_view_rect_when_set() {
        let api = RecordingApi::with_windows(vec![make_window(5, "", 1200, 800)]);
        let mut session = make_session(api);
        session.refresh_windows().await.unwrap();
        session.select(5).await.unwrap();

        session.set_view(ViewRect::new(100.0, 50.0, 600.0, 400.0));
        let (ax, ay) = session.click(400.0, 250.0).await.unwrap();

        assert_eq!((ax, ay), (600, 400));
        session.shutdown();
    }

    #[tokio::test]
    async fn test_click_without_selection_is_an_error() {
        let api = RecordingApi::with_windows(vec![]);
        let mut session = make_session(api);

        assert!(matches!(
            session.click(1.0, 1.0).await,
            Err(SessionError::NoSelection)
        ));
    }

    // ── Key forwarding ────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_enter_sends_key_down_then_key_up() {
        let api = RecordingApi::with_windows(vec![make_window(5, "", 1200, 800)]);
        let mut session = make_session(Arc::clone(&api));
        session.refresh_windows().await.unwrap();
        session.select(5).await.unwrap();

        let forwarded = session.send_key(KeyPress::plain("Enter")).await.unwrap();

        assert!(forwarded);
        let scripts: Vec<String> = api
            .calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::ContentCommand(5, script) => Some(script),
                _ => None,
            })
            .collect();
        assert_eq!(scripts.len(), 2);
        assert!(scripts[0].contains("'keyDown'") && scripts[0].contains("'Return'"));
        assert!(scripts[1].contains("'keyUp'") && scripts[1].contains("'Return'"));
        session.shutdown();
    }

    #[tokio::test]
    async fn test_printable_key_sends_key_down_only() {
        let api = RecordingApi::with_windows(vec![make_window(5, "", 1200, 800)]);
        let mut session = make_session(Arc::clone(&api));
        session.refresh_windows().await.unwrap();
        session.select(5).await.unwrap();

        session.send_key(KeyPress::plain("a")).await.unwrap();

        let downs = api
            .calls()
            .iter()
            .filter(|c| matches!(c, Call::ContentCommand(_, s) if s.contains("keyDown")))
            .count();
        let ups = api
            .calls()
            .iter()
            .filter(|c| matches!(c, Call::ContentCommand(_, s) if s.contains("keyUp")))
            .count();
        assert_eq!((downs, ups), (1, 0));
        session.shutdown();
    }

    #[tokio::test]
    async fn test_modifier_chord_is_ignored_not_errored() {
        let api = RecordingApi::with_windows(vec![make_window(5, "", 1200, 800)]);
        let mut session = make_session(Arc::clone(&api));
        session.refresh_windows().await.unwrap();
        session.select(5).await.unwrap();
        let before = api.calls().len();

        let mut press = KeyPress::plain("c");
        press.ctrl = true;
        let forwarded = session.send_key(press).await.unwrap();

        assert!(!forwarded);
        assert_eq!(api.calls().len(), before, "ignored key must not reach the API");
        session.shutdown();
    }

    // ── Settings ──────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_update_capture_rejects_invalid_settings() {
        let api = RecordingApi::with_windows(vec![]);
        let mut session = make_session(api);

        let result = session.update_capture(CaptureSettings {
            quality: 0,
            ..Default::default()
        });

        assert!(matches!(result, Err(SessionError::InvalidSettings(_))));
    }

    #[tokio::test]
    async fn test_update_capture_persists_new_values() {
        let api = RecordingApi::with_windows(vec![]);
        let mut session = make_session(api);

        session
            .update_capture(CaptureSettings { interval_ms: 250, quality: 90, scale: 1.0 })
            .unwrap();

        let reloaded = session.settings_store.load().unwrap();
        assert_eq!(reloaded.capture.interval_ms, 250);
        assert_eq!(reloaded.capture.quality, 90);
    }

    #[tokio::test]
    async fn test_disabling_loop_stops_capture() {
        let api = RecordingApi::with_windows(vec![make_window(5, "", 1200, 800)]);
        let mut session = make_session(api);
        session.refresh_windows().await.unwrap();
        session.select(5).await.unwrap();
        assert!(session.capture_running());

        session.set_loop_enabled(false).unwrap();

        assert!(!session.capture_running());
    }

    // ── Resume ────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_resume_reselects_the_persisted_window() {
        let api = RecordingApi::with_windows(vec![make_window(5, "", 1200, 800)]);
        let dir = temp_dir();
        let store = SettingsStore::open(&dir);
        let mut persisted = Settings::default();
        persisted.selected_win_id = Some(5);
        store.save(&persisted).unwrap();

        let tokens = Arc::new(TokenStore::open(&dir).unwrap());
        let surface = Arc::new(FrameSurface::new(dir.join("frames")).unwrap());
        let mut session = ConsoleSession::new(api, tokens, store, surface).unwrap();

        session.resume().await.unwrap();

        assert_eq!(session.selected_window().map(|w| w.id), Some(5));
        assert!(session.capture_running());
        session.shutdown();
    }

    #[tokio::test]
    async fn test_resume_skips_a_vanished_selection() {
        let api = RecordingApi::with_windows(vec![make_window(1, "", 800, 600)]);
        let dir = temp_dir();
        let store = SettingsStore::open(&dir);
        let mut persisted = Settings::default();
        persisted.selected_win_id = Some(42);
        store.save(&persisted).unwrap();

        let tokens = Arc::new(TokenStore::open(&dir).unwrap());
        let surface = Arc::new(FrameSurface::new(dir.join("frames")).unwrap());
        let mut session = ConsoleSession::new(api, tokens, store, surface).unwrap();

        session.resume().await.unwrap();

        assert_eq!(session.selected_window(), None);
        assert!(!session.capture_running());
    }

    // ── Ping ──────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_ping_reports_latency() {
        let api = RecordingApi::with_windows(vec![]);
        let session = make_session(api);

        let latency = session.ping().await.unwrap();

        assert_eq!(latency, Duration::from_millis(12));
    }
}
