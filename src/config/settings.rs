//! Application settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files and shared across threads.

use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::AppPaths;
use crate::spectrogram::FormantBand;

// ---------------------------------------------------------------------------
// CaptureConfig
// ---------------------------------------------------------------------------

/// Longest recording cap honoured, in seconds.
pub const MAX_RECORDING_CEILING_SECS: f32 = 3_600.0;

/// Settings for the recording lifecycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// Hard cap on the recording length in seconds; the capture stops
    /// automatically once it elapses.
    pub max_recording_secs: f32,
    /// Pause between finishing synthesis and reporting `Finished`, in
    /// milliseconds.  Purely cosmetic for the presentation layer.
    pub settle_delay_ms: u64,
    /// Audio input device name; `None` means the system default.
    pub audio_device: Option<String>,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            max_recording_secs: 5.0,
            settle_delay_ms: 500,
            audio_device: None,
        }
    }
}

impl CaptureConfig {
    /// Recording cap as a [`Duration`].
    ///
    /// Negative or NaN values clamp to zero; anything above
    /// [`MAX_RECORDING_CEILING_SECS`] (including `inf`) clamps to the ceiling.
    pub fn max_recording(&self) -> Duration {
        let secs = self
            .max_recording_secs
            .max(0.0)
            .min(MAX_RECORDING_CEILING_SECS);
        Duration::try_from_secs_f32(secs).unwrap_or(Duration::ZERO)
    }

    /// Settling delay as a [`Duration`].
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

// ---------------------------------------------------------------------------
// SpectrogramConfig
// ---------------------------------------------------------------------------

/// Canvas and formant layout for the synthesized spectrogram.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpectrogramConfig {
    /// Canvas width in pixels (one column per time step).
    pub width: u32,
    /// Canvas height in pixels (one row per frequency bin).
    pub height: u32,
    /// Fraction of the canvas area scattered with background noise pixels.
    pub noise_density: f32,
    /// Resonance stripes painted over the noise, strongest first.
    pub formants: Vec<FormantBand>,
}

impl Default for SpectrogramConfig {
    fn default() -> Self {
        Self {
            width: 500,
            height: 200,
            noise_density: 0.2,
            formants: FormantBand::open_vowel().to_vec(),
        }
    }
}

// ---------------------------------------------------------------------------
// AppConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level application configuration, serialised as `settings.toml`.
///
/// # Persistence
///
/// ```rust,no_run
/// use acoustic_capture::config::AppConfig;
///
/// // Load (returns Default when file is missing)
/// let config = AppConfig::load().unwrap();
///
/// // Modify and save
/// // config.save().unwrap();
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Recording lifecycle settings.
    pub capture: CaptureConfig,
    /// Spectrogram synthesis settings.
    pub spectrogram: SpectrogramConfig,
}

impl AppConfig {
    /// Load configuration from the platform-appropriate `settings.toml`.
    ///
    /// Returns `Ok(AppConfig::default())` when the file does not exist yet
    /// (first-run scenario) so callers never need to special-case a missing
    /// file.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path (useful for tests).
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the platform-appropriate `settings.toml`,
    /// creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&AppPaths::new().settings_file)
    }

    /// Save to an explicit path (useful for tests).
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
