//! Procedural spectrogram synthesis.
//!
//! # Pipeline
//!
//! ```text
//! SpectrogramConfig → Canvas (fill, noise) → FormantBand strokes
//!                   → encode_png → base64 data URI
//! ```
//!
//! # Quick Start
//!
//! ```rust
//! use acoustic_capture::spectrogram::SpectrogramSynthesizer;
//!
//! let image = SpectrogramSynthesizer::default().synthesize();
//! assert_eq!((image.width, image.height), (500, 200));
//! assert!(image.data_uri().starts_with("data:image/png;base64,"));
//! ```

pub mod colormap;
pub mod encode;
pub mod formant;
pub mod raster;
pub mod synth;

pub use colormap::{viridis_like, Rgb, BASE_COLOR};
pub use formant::FormantBand;
pub use raster::Canvas;
pub use synth::{BandStroke, Rendering, SpectrogramImage, SpectrogramSynthesizer, SynthesisError};
