//! Formant band table for the synthesized vowel.

use serde::{Deserialize, Serialize};

/// Vertical jitter applied per column, as a fraction of band thickness.
pub const JITTER_FRACTION: f32 = 0.2;

/// Intensity shimmer applied per column, as a fraction of nominal intensity.
pub const SHIMMER_FRACTION: f32 = 0.15;

/// One horizontal resonance stripe of the spectrogram.
///
/// `position` is measured from the top of the image, so low formants (low
/// frequencies) sit near `1.0` and high formants near `0.0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FormantBand {
    /// Centre of the stripe as a fraction of image height.
    pub position: f32,
    /// Gradient radius in pixels.
    pub thickness: f32,
    /// Nominal intensity in `[0.0, 1.0]` before shimmer.
    pub intensity: f32,
}

impl FormantBand {
    pub const fn new(position: f32, thickness: f32, intensity: f32) -> Self {
        Self {
            position,
            thickness,
            intensity,
        }
    }

    /// F1 through F4 of a sustained open vowel ("aaah"), strongest first.
    pub const fn open_vowel() -> [FormantBand; 4] {
        [
            FormantBand::new(0.75, 12.0, 0.95),
            FormantBand::new(0.55, 8.0, 0.8),
            FormantBand::new(0.30, 6.0, 0.6),
            FormantBand::new(0.20, 5.0, 0.5),
        ]
    }

    /// Nominal stripe centre in pixels for a canvas of `height` rows.
    pub fn center_y(&self, height: u32) -> f32 {
        height as f32 * self.position
    }

    /// Largest vertical displacement a single column may receive.
    pub fn jitter_bound(&self) -> f32 {
        self.thickness * JITTER_FRACTION
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_vowel_descends_in_intensity_and_rises_in_frequency() {
        let bands = FormantBand::open_vowel();
        for pair in bands.windows(2) {
            assert!(pair[0].intensity > pair[1].intensity);
            assert!(pair[0].thickness > pair[1].thickness);
            // Smaller position = nearer the top = higher frequency.
            assert!(pair[0].position > pair[1].position);
        }
    }

    #[test]
    fn center_and_jitter_bound() {
        let f1 = FormantBand::open_vowel()[0];
        assert!((f1.center_y(200) - 150.0).abs() < 1e-4);
        assert!((f1.jitter_bound() - 2.4).abs() < 1e-4);
    }
}
