//! Procedural Mel-spectrogram stand-in.
//!
//! [`SpectrogramSynthesizer`] paints a vowel-like four-stripe image from
//! uniform random draws.  It never looks at captured audio: the image is a
//! presentation placeholder for a server-side analysis that does not exist,
//! and wiring real audio features into it would imply accuracy it does not
//! have.
//!
//! # Algorithm
//!
//! ```text
//! fill #440154
//! scatter width·height·density noise pixels, rgba(128,128,255, U[0,0.1))
//! for x in 0..width:
//!     for band in formants:
//!         y  = band.center + U[-0.2, 0.2)·thickness
//!         I  = band.intensity · U[0.85, 1.15)
//!         radial gradient at (x, y), radius = thickness:
//!             0.0 → colormap(I), 0.5 → colormap(I/2), 1.0 → transparent
//! encode PNG → base64 data URI
//! ```

use rand::Rng;
use thiserror::Error;

use crate::config::SpectrogramConfig;

use super::colormap::{viridis_like, BASE_COLOR, NOISE_COLOR};
use super::encode::{data_uri, encode_png, PNG_MIME};
use super::formant::{FormantBand, JITTER_FRACTION, SHIMMER_FRACTION};
use super::raster::{Canvas, GradientStop, RadialGradient};

/// Upper bound (exclusive) of the noise pixel opacity.
const NOISE_MAX_ALPHA: f32 = 0.1;

// ---------------------------------------------------------------------------
// SynthesisError
// ---------------------------------------------------------------------------

/// Reasons a synthesis attempt produced no image.
#[derive(Debug, Error)]
pub enum SynthesisError {
    /// The raster surface could not be allocated.
    #[error("no drawing surface for a {width}x{height} canvas")]
    NoCanvasContext { width: u32, height: u32 },

    #[error("PNG encoding error: {0}")]
    Encode(#[from] png::EncodingError),
}

// ---------------------------------------------------------------------------
// SpectrogramImage
// ---------------------------------------------------------------------------

/// An encoded spectrogram ready for display.
///
/// An empty image (no PNG bytes) is what a failed synthesis yields; callers
/// display nothing rather than handling an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpectrogramImage {
    pub width: u32,
    pub height: u32,
    png: Vec<u8>,
}

impl SpectrogramImage {
    pub fn empty() -> Self {
        Self {
            width: 0,
            height: 0,
            png: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.png.is_empty()
    }

    /// Encoded PNG bytes.
    pub fn png_bytes(&self) -> &[u8] {
        &self.png
    }

    pub fn into_png_bytes(self) -> Vec<u8> {
        self.png
    }

    pub fn mime(&self) -> &'static str {
        PNG_MIME
    }

    /// `data:image/png;base64,…`, or an empty string for an empty image.
    pub fn data_uri(&self) -> String {
        if self.is_empty() {
            return String::new();
        }
        data_uri(PNG_MIME, &self.png)
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// Where and how strongly one band was painted in one column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandStroke {
    /// Index into the formant table.
    pub band: usize,
    pub x: u32,
    /// Jittered centre row (fractional pixels).
    pub center_y: f32,
    /// Intensity after shimmer.
    pub intensity: f32,
}

/// Raw output of a synthesis pass before encoding.
#[derive(Debug, Clone)]
pub struct Rendering {
    pub canvas: Canvas,
    pub strokes: Vec<BandStroke>,
}

// ---------------------------------------------------------------------------
// SpectrogramSynthesizer
// ---------------------------------------------------------------------------

/// Stateless painter of vowel-like spectrogram images.
#[derive(Debug, Clone, Default)]
pub struct SpectrogramSynthesizer {
    config: SpectrogramConfig,
}

impl SpectrogramSynthesizer {
    pub fn new(config: SpectrogramConfig) -> Self {
        Self { config }
    }

    /// Paint a fresh image using the thread-local RNG.
    ///
    /// Never fails: any error is logged and an empty image returned.
    pub fn synthesize(&self) -> SpectrogramImage {
        self.synthesize_with_rng(&mut rand::thread_rng())
    }

    /// Same as [`synthesize`](Self::synthesize) with a caller-supplied RNG.
    pub fn synthesize_with_rng<R: Rng + ?Sized>(&self, rng: &mut R) -> SpectrogramImage {
        match self.try_synthesize(rng) {
            Ok(image) => image,
            Err(e) => {
                log::error!("spectrogram synthesis failed: {e}");
                SpectrogramImage::empty()
            }
        }
    }

    fn try_synthesize<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<SpectrogramImage, SynthesisError> {
        let rendering = self.render(rng)?;
        let png = encode_png(&rendering.canvas)?;
        log::debug!(
            "spectrogram: {}x{} rendered, {} bytes PNG",
            rendering.canvas.width(),
            rendering.canvas.height(),
            png.len()
        );
        Ok(SpectrogramImage {
            width: rendering.canvas.width(),
            height: rendering.canvas.height(),
            png,
        })
    }

    /// Run the painting steps and return the unencoded canvas together with
    /// every band stroke that was drawn.
    pub fn render<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Rendering, SynthesisError> {
        let cfg = &self.config;

        let mut canvas = Canvas::new(cfg.width, cfg.height)?;
        canvas.fill(BASE_COLOR);

        scatter_noise(&mut canvas, cfg.noise_density, rng);

        let mut strokes = Vec::with_capacity(cfg.width as usize * cfg.formants.len());
        for x in 0..cfg.width {
            for (band_idx, band) in cfg.formants.iter().enumerate() {
                let stroke = paint_band(&mut canvas, band_idx, band, x, rng);
                strokes.push(stroke);
            }
        }

        Ok(Rendering { canvas, strokes })
    }
}

fn scatter_noise<R: Rng + ?Sized>(canvas: &mut Canvas, density: f32, rng: &mut R) {
    let (w, h) = (canvas.width(), canvas.height());
    let count = (w as f64 * h as f64 * density.clamp(0.0, 1.0) as f64) as usize;
    let color = NOISE_COLOR.map(|c| c as f32);

    for _ in 0..count {
        let x = rng.gen_range(0..w);
        let y = rng.gen_range(0..h);
        let alpha = rng.gen_range(0.0..NOISE_MAX_ALPHA);
        canvas.blend_pixel(x as i64, y as i64, color, alpha);
    }
}

fn paint_band<R: Rng + ?Sized>(
    canvas: &mut Canvas,
    band_idx: usize,
    band: &FormantBand,
    x: u32,
    rng: &mut R,
) -> BandStroke {
    let jitter = rng.gen_range(-JITTER_FRACTION..JITTER_FRACTION) * band.thickness;
    let shimmer = 1.0 + rng.gen_range(-SHIMMER_FRACTION..SHIMMER_FRACTION);
    let intensity = band.intensity * shimmer;
    let center_y = band.center_y(canvas.height()) + jitter;

    let gradient = RadialGradient::new(vec![
        GradientStop::opaque(0.0, viridis_like(intensity)),
        GradientStop::opaque(0.5, viridis_like(intensity * 0.5)),
        GradientStop::transparent(1.0),
    ]);
    canvas.fill_radial(x as f32, center_y, band.thickness, &gradient);

    BandStroke {
        band: band_idx,
        x,
        center_y,
        intensity,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn decode(image: &SpectrogramImage) -> (u32, u32, Vec<u8>) {
        let decoder = png::Decoder::new(image.png_bytes());
        let mut reader = decoder.read_info().unwrap();
        let mut buf = vec![0; reader.output_buffer_size()];
        let info = reader.next_frame(&mut buf).unwrap();
        buf.truncate(info.buffer_size());
        (info.width, info.height, buf)
    }

    #[test]
    fn image_has_fixed_dimensions() {
        let synth = SpectrogramSynthesizer::default();
        for _ in 0..3 {
            let image = synth.synthesize();
            assert!(!image.is_empty());
            assert_eq!((image.width, image.height), (500, 200));

            let (w, h, _) = decode(&image);
            assert_eq!((w, h), (500, 200));
        }
    }

    #[test]
    fn every_band_row_has_non_background_pixels() {
        let synth = SpectrogramSynthesizer::default();
        let image = synth.synthesize();
        let (w, _, rgb) = decode(&image);

        for band in FormantBand::open_vowel() {
            let row = band.center_y(200).round() as u32;
            let start = (row * w * 3) as usize;
            let line = &rgb[start..start + (w * 3) as usize];
            let painted = line.chunks(3).filter(|p| *p != BASE_COLOR).count();
            assert!(
                painted > (w as usize) / 2,
                "band at row {row} only had {painted} painted pixels"
            );
        }
    }

    #[test]
    fn repeated_calls_differ() {
        let synth = SpectrogramSynthesizer::default();
        let a = synth.synthesize();
        let b = synth.synthesize();
        assert_ne!(a.png_bytes(), b.png_bytes());
    }

    #[test]
    fn seeded_rng_is_reproducible() {
        let synth = SpectrogramSynthesizer::default();
        let a = synth.synthesize_with_rng(&mut StdRng::seed_from_u64(7));
        let b = synth.synthesize_with_rng(&mut StdRng::seed_from_u64(7));
        assert_eq!(a, b);
    }

    #[test]
    fn strokes_stay_within_jitter_and_shimmer_bounds() {
        let synth = SpectrogramSynthesizer::default();
        let bands = FormantBand::open_vowel();
        let mut rng = StdRng::seed_from_u64(42);

        for _ in 0..5 {
            let rendering = synth.render(&mut rng).unwrap();
            assert_eq!(rendering.strokes.len(), 500 * bands.len());

            for s in &rendering.strokes {
                let band = &bands[s.band];
                let offset = s.center_y - band.center_y(200);
                assert!(offset.abs() <= band.jitter_bound() + 1e-4, "{s:?}");

                let ratio = s.intensity / band.intensity;
                assert!((0.85 - 1e-4..=1.15 + 1e-4).contains(&ratio), "{s:?}");
            }
        }
    }

    #[test]
    fn band_centres_average_to_nominal_position() {
        let synth = SpectrogramSynthesizer::default();
        let bands = FormantBand::open_vowel();
        let rendering = synth.render(&mut StdRng::seed_from_u64(3)).unwrap();

        for (idx, band) in bands.iter().enumerate() {
            let ys: Vec<f32> = rendering
                .strokes
                .iter()
                .filter(|s| s.band == idx)
                .map(|s| s.center_y)
                .collect();
            let mean = ys.iter().sum::<f32>() / ys.len() as f32;
            assert!(
                (mean - band.center_y(200)).abs() < band.jitter_bound() * 0.25,
                "band {idx} mean {mean}"
            );
        }
    }

    #[test]
    fn noise_touches_roughly_the_configured_fraction() {
        let config = SpectrogramConfig {
            formants: Vec::new(),
            ..SpectrogramConfig::default()
        };
        let synth = SpectrogramSynthesizer::new(config);
        let rendering = synth.render(&mut StdRng::seed_from_u64(11)).unwrap();
        let rgb = rendering.canvas.to_rgb8();

        let touched = rgb.chunks(3).filter(|p| *p != BASE_COLOR).count();
        let total = 500 * 200;
        // 20% draws with repeats, some too faint to change the 8-bit value.
        assert!(touched > total / 20, "touched {touched}");
        assert!(touched < total / 4, "touched {touched}");
    }

    #[test]
    fn missing_canvas_yields_empty_image() {
        let config = SpectrogramConfig {
            width: 0,
            ..SpectrogramConfig::default()
        };
        let image = SpectrogramSynthesizer::new(config).synthesize();
        assert!(image.is_empty());
        assert_eq!(image.data_uri(), "");
    }

    #[test]
    fn data_uri_is_png() {
        let image = SpectrogramSynthesizer::default().synthesize();
        assert!(image.data_uri().starts_with("data:image/png;base64,iVBORw0KGgo"));
    }
}
