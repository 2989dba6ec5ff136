//! Configuration module.
//!
//! Provides `AppConfig` (top-level settings), sub-configs for the capture
//! lifecycle and the spectrogram synthesizer, `AppPaths` for the platform
//! config directory, and TOML persistence via `AppConfig::load` /
//! `AppConfig::save`.

pub mod paths;
pub mod settings;

pub use paths::AppPaths;
pub use settings::{AppConfig, CaptureConfig, SpectrogramConfig};
