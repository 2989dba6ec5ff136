//! Intensity → colour mapping approximating a perceptually uniform colormap.

use std::f32::consts::FRAC_PI_2;

/// 8-bit RGB triple.
pub type Rgb = [u8; 3];

/// Low-energy background colour (`#440154`), the dark end of the map.
pub const BASE_COLOR: Rgb = [0x44, 0x01, 0x54];

/// Colour of the scattered background noise pixels.
pub const NOISE_COLOR: Rgb = [128, 128, 255];

/// Map `value` (nominally `0.0..=1.0`) to a viridis-like colour.
///
/// `r ∝ √v`, `g ∝ v³`, `b ∝ sin(v·π/2)`.  Values pushed past `1.0` by
/// shimmer saturate at 255 rather than wrapping.
pub fn viridis_like(value: f32) -> Rgb {
    let v = value.max(0.0);
    [
        channel(v.sqrt()),
        channel(v.powi(3)),
        channel((v * FRAC_PI_2).sin()),
    ]
}

fn channel(unit: f32) -> u8 {
    (255.0 * unit).floor().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_is_black() {
        assert_eq!(viridis_like(0.0), [0, 0, 0]);
    }

    #[test]
    fn one_is_white() {
        assert_eq!(viridis_like(1.0), [255, 255, 255]);
    }

    #[test]
    fn half_intensity() {
        // sqrt(0.5)=0.7071 → 180, 0.125 → 31, sin(π/4)=0.7071 → 180
        assert_eq!(viridis_like(0.5), [180, 31, 180]);
    }

    #[test]
    fn over_range_saturates() {
        assert_eq!(viridis_like(1.1)[0], 255);
        assert_eq!(viridis_like(1.1)[1], 255);
    }

    #[test]
    fn negative_clamps_to_black() {
        assert_eq!(viridis_like(-0.3), [0, 0, 0]);
    }
}
