//! Capture settings for the snapshot poll loop.
//!
//! Settings are operator-adjustable and persisted across sessions by the
//! console's settings store.  They are applied on the next loop start — an
//! in-progress fetch is never reconfigured mid-flight.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default poll period when nothing is persisted.
pub const DEFAULT_INTERVAL_MS: u64 = 1000;
/// Default JPEG-style compression quality hint.
pub const DEFAULT_QUALITY: u8 = 80;
/// Default downscale factor for fetched snapshots.
pub const DEFAULT_SCALE: f64 = 0.5;

/// Errors produced by [`CaptureSettings::validate`].
#[derive(Debug, Error, PartialEq)]
pub enum SettingsError {
    /// The poll period must be at least one millisecond.
    #[error("poll interval must be >= 1 ms, got {0}")]
    IntervalOutOfRange(u64),

    /// Quality is a percentage hint in 1–100.
    #[error("quality must be in 1..=100, got {0}")]
    QualityOutOfRange(u8),

    /// Scale is a downscale factor in (0, 1].
    #[error("scale must be in (0, 1], got {0}")]
    ScaleOutOfRange(f64),
}

/// How the poll loop fetches snapshots: period, compression, downscale.
///
/// Fields annotated with `#[serde(default = "...")]` fall back to the
/// documented defaults when absent from the persisted settings file, so the
/// console works correctly on first run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CaptureSettings {
    /// Poll period in milliseconds.  Must be ≥ 1.
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    /// Compression quality hint, 1–100.
    #[serde(default = "default_quality")]
    pub quality: u8,
    /// Downscale factor in (0, 1].  1.0 fetches at native resolution.
    #[serde(default = "default_scale")]
    pub scale: f64,
}

fn default_interval_ms() -> u64 {
    DEFAULT_INTERVAL_MS
}
fn default_quality() -> u8 {
    DEFAULT_QUALITY
}
fn default_scale() -> f64 {
    DEFAULT_SCALE
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            quality: default_quality(),
            scale: default_scale(),
        }
    }
}

impl CaptureSettings {
    /// Checks all fields against their documented ranges.
    ///
    /// # Errors
    ///
    /// Returns the first [`SettingsError`] encountered, in field order.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.interval_ms < 1 {
            return Err(SettingsError::IntervalOutOfRange(self.interval_ms));
        }
        if !(1..=100).contains(&self.quality) {
            return Err(SettingsError::QualityOutOfRange(self.quality));
        }
        if !(self.scale > 0.0 && self.scale <= 1.0) {
            return Err(SettingsError::ScaleOutOfRange(self.scale));
        }
        Ok(())
    }

    /// The poll period as a [`Duration`].
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
