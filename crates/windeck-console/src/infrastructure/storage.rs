//! Persistence for operator settings and the session token.
//!
//! Two small stores with a single load/save boundary each, written to the
//! platform-appropriate config directory:
//! - Windows:  `%APPDATA%\WinDeck\`
//! - Linux:    `~/.config/windeck/`
//! - macOS:    `~/Library/Application Support/WinDeck/`
//!
//! [`SettingsStore`] holds `settings.toml` — everything the operator adjusts
//! and expects to survive a restart (selected window, capture settings, loop
//! flag).  Components receive the store by reference; nothing reads settings
//! ambiently.
//!
//! [`TokenStore`] holds the bearer token in its own `token` file with an
//! in-memory slot in front, so the hot path (attaching the credential to
//! every request) never touches the filesystem.  Clearing the store is the
//! only way to invalidate a token; the HTTP client does so on a 401.
//!
//! # Serde default values
//!
//! Fields annotated with `#[serde(default = "some_fn")]` use the return value
//! of `some_fn()` when the field is absent from the TOML file.  This lets the
//! console work correctly on first run (before a settings file exists) and
//! when upgrading from an older file that is missing newer fields.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use windeck_core::CaptureSettings;

/// Error type for settings and token file operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The platform config directory could not be determined.
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    /// A file system I/O error occurred.
    #[error("I/O error accessing {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse settings TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The settings could not be serialized to TOML.
    #[error("failed to serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),
}

// ── Settings schema ───────────────────────────────────────────────────────────

/// Everything the operator adjusts and expects to survive a restart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// The window id the operator last selected, restored on next start.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_win_id: Option<i64>,

    /// Whether the snapshot poll loop runs while a window is selected.
    #[serde(default = "default_true")]
    pub loop_enabled: bool,

    /// Whether the controls panel is shown in the dashboard status output.
    #[serde(default)]
    pub controls_visible: bool,

    /// Poll period, quality, and scale for the capture loop.
    #[serde(default)]
    pub capture: CaptureSettings,
}

fn default_true() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            selected_win_id: None,
            loop_enabled: default_true(),
            controls_visible: false,
            capture: CaptureSettings::default(),
        }
    }
}

// ── Settings store ────────────────────────────────────────────────────────────

/// Loads and saves [`Settings`] as `settings.toml` in one place.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    /// A store rooted at an explicit directory (tests, `--config-dir`).
    pub fn open(dir: &Path) -> Self {
        Self { path: dir.join("settings.toml") }
    }

    /// A store in the platform config directory.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::NoPlatformConfigDir`] when the platform config
    /// base directory cannot be determined from the environment.
    pub fn at_default_location() -> Result<Self, StorageError> {
        Ok(Self::open(&config_dir()?))
    }

    /// Loads settings from disk, returning `Settings::default()` if the file
    /// does not yet exist.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Io`] for file-system errors other than
    /// "not found", and [`StorageError::Parse`] if the TOML is malformed.
    pub fn load(&self) -> Result<Settings, StorageError> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => Ok(toml::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Settings::default()),
            Err(e) => Err(StorageError::Io { path: self.path.clone(), source: e }),
        }
    }

    /// Persists `settings`, creating the config directory if needed.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Io`] for file-system failures or
    /// [`StorageError::Serialize`] if serialization fails.
    pub fn save(&self, settings: &Settings) -> Result<(), StorageError> {
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir).map_err(|source| StorageError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
        }

        let content = toml::to_string_pretty(settings)?;
        std::fs::write(&self.path, content).map_err(|source| StorageError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

// ── Token store ───────────────────────────────────────────────────────────────

/// The process-wide bearer-token slot, persisted to a `token` file.
///
/// At most one token is active at a time.  No expiry tracking: `clear` is the
/// only invalidation mechanism, triggered by logout or by a 401 response.
pub struct TokenStore {
    path: PathBuf,
    slot: Mutex<Option<String>>,
}

impl TokenStore {
    /// Opens the store in an explicit directory, loading any persisted token.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Io`] if an existing token file cannot be read.
    pub fn open(dir: &Path) -> Result<Self, StorageError> {
        let path = dir.join("token");
        let slot = match std::fs::read_to_string(&path) {
            Ok(content) => {
                let token = content.trim().to_string();
                if token.is_empty() { None } else { Some(token) }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => return Err(StorageError::Io { path, source: e }),
        };
        Ok(Self { path, slot: Mutex::new(slot) })
    }

    /// Opens the store in the platform config directory.
    pub fn at_default_location() -> Result<Self, StorageError> {
        Self::open(&config_dir()?)
    }

    /// The current token, if any.
    pub fn get(&self) -> Option<String> {
        self.lock_slot().clone()
    }

    /// Stores `token` and persists it.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Io`] if the token file cannot be written.  The
    /// in-memory slot is updated regardless, so the session keeps working
    /// even when persistence fails.
    pub fn set(&self, token: &str) -> Result<(), StorageError> {
        *self.lock_slot() = Some(token.to_string());

        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir).map_err(|source| StorageError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
        }
        std::fs::write(&self.path, token).map_err(|source| StorageError::Io {
            path: self.path.clone(),
            source,
        })
    }

    /// Drops the token and removes the persisted file.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Io`] if the file exists but cannot be removed.
    pub fn clear(&self) -> Result<(), StorageError> {
        *self.lock_slot() = None;

        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::Io { path: self.path.clone(), source: e }),
        }
    }

    fn lock_slot(&self) -> std::sync::MutexGuard<'_, Option<String>> {
        // A poisoned slot only means another thread panicked mid-update; the
        // token value itself is still usable.
        self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

// ── Platform config directory ─────────────────────────────────────────────────

/// Determines the platform-appropriate directory for persisted state.
///
/// # Errors
///
/// Returns [`StorageError::NoPlatformConfigDir`] when the base directory
/// cannot be determined from the environment.
pub fn config_dir() -> Result<PathBuf, StorageError> {
    platform_config_dir().ok_or(StorageError::NoPlatformConfigDir)
}

/// Resolves the per-platform base directory.
fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        // %APPDATA% e.g. C:\Users\<user>\AppData\Roaming
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("WinDeck"))
    }

    #[cfg(target_os = "linux")]
    {
        // XDG_CONFIG_HOME or ~/.config
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("windeck"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME").map(|h| {
            PathBuf::from(h)
                .join("Library")
                .join("Application Support")
                .join("WinDeck")
        })
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
