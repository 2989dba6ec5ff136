//! Software RGB canvas with source-over compositing and radial gradients.
//!
//! The canvas is always opaque (it starts from a solid fill), so only the
//! colour channels are stored.  Channels are kept as `f32` in `0.0..=255.0`
//! and quantised once in [`Canvas::to_rgb8`].

use super::colormap::Rgb;
use super::synth::SynthesisError;

/// Largest accepted canvas edge in pixels.
pub const MAX_CANVAS_EDGE: u32 = 16_384;

// ---------------------------------------------------------------------------
// RadialGradient
// ---------------------------------------------------------------------------

/// A colour stop at `offset` (`0.0` = centre, `1.0` = rim).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradientStop {
    pub offset: f32,
    pub color: Rgb,
    pub alpha: f32,
}

impl GradientStop {
    pub fn opaque(offset: f32, color: Rgb) -> Self {
        Self {
            offset,
            color,
            alpha: 1.0,
        }
    }

    pub fn transparent(offset: f32) -> Self {
        Self {
            offset,
            color: [0, 0, 0],
            alpha: 0.0,
        }
    }
}

/// Radial gradient with stops sorted by offset.
///
/// Interpolation happens in premultiplied space, so fading to a transparent
/// stop keeps the hue of the previous stop instead of darkening towards the
/// transparent stop's colour.
#[derive(Debug, Clone)]
pub struct RadialGradient {
    stops: Vec<GradientStop>,
}

impl RadialGradient {
    pub fn new(mut stops: Vec<GradientStop>) -> Self {
        stops.sort_by(|a, b| a.offset.total_cmp(&b.offset));
        Self { stops }
    }

    /// Colour and alpha at normalised distance `t` from the centre.
    pub fn sample(&self, t: f32) -> ([f32; 3], f32) {
        let (first, last) = match (self.stops.first(), self.stops.last()) {
            (Some(f), Some(l)) => (f, l),
            _ => return ([0.0; 3], 0.0),
        };
        if t <= first.offset {
            return (to_f32(first.color), first.alpha);
        }
        if t >= last.offset {
            return (to_f32(last.color), last.alpha);
        }

        for pair in self.stops.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            if t > b.offset {
                continue;
            }
            let span = b.offset - a.offset;
            let k = if span > 0.0 { (t - a.offset) / span } else { 1.0 };

            let alpha = a.alpha + (b.alpha - a.alpha) * k;
            if alpha <= 0.0 {
                return ([0.0; 3], 0.0);
            }
            let ca = to_f32(a.color);
            let cb = to_f32(b.color);
            let mut rgb = [0.0; 3];
            for i in 0..3 {
                let premul = ca[i] * a.alpha + (cb[i] * b.alpha - ca[i] * a.alpha) * k;
                rgb[i] = premul / alpha;
            }
            return (rgb, alpha);
        }

        (to_f32(last.color), last.alpha)
    }
}

fn to_f32(c: Rgb) -> [f32; 3] {
    [c[0] as f32, c[1] as f32, c[2] as f32]
}

// ---------------------------------------------------------------------------
// Canvas
// ---------------------------------------------------------------------------

/// Fixed-size opaque RGB raster.
#[derive(Debug, Clone)]
pub struct Canvas {
    width: u32,
    height: u32,
    pixels: Vec<[f32; 3]>,
}

impl Canvas {
    /// Allocate a black canvas.
    ///
    /// # Errors
    ///
    /// [`SynthesisError::NoCanvasContext`] when either edge is zero or larger
    /// than [`MAX_CANVAS_EDGE`].
    pub fn new(width: u32, height: u32) -> Result<Self, SynthesisError> {
        if width == 0 || height == 0 || width > MAX_CANVAS_EDGE || height > MAX_CANVAS_EDGE {
            return Err(SynthesisError::NoCanvasContext { width, height });
        }
        Ok(Self {
            width,
            height,
            pixels: vec![[0.0; 3]; width as usize * height as usize],
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Paint every pixel with `color`.
    pub fn fill(&mut self, color: Rgb) {
        let c = to_f32(color);
        self.pixels.iter_mut().for_each(|p| *p = c);
    }

    /// Composite `color` at `alpha` over the pixel at `(x, y)` (source-over).
    ///
    /// Coordinates outside the canvas are ignored.
    pub fn blend_pixel(&mut self, x: i64, y: i64, color: [f32; 3], alpha: f32) {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return;
        }
        let alpha = alpha.clamp(0.0, 1.0);
        if alpha == 0.0 {
            return;
        }
        let idx = y as usize * self.width as usize + x as usize;
        let dst = &mut self.pixels[idx];
        for i in 0..3 {
            dst[i] = color[i] * alpha + dst[i] * (1.0 - alpha);
        }
    }

    /// Fill the square `[cx − r, cx + r] × [cy − r, cy + r]` with `gradient`
    /// centred on `(cx, cy)` with radius `r`.
    ///
    /// Pixels are sampled at their centres; everything at or beyond the rim
    /// is left untouched.
    pub fn fill_radial(&mut self, cx: f32, cy: f32, radius: f32, gradient: &RadialGradient) {
        if radius <= 0.0 {
            return;
        }
        let x0 = (cx - radius).floor() as i64;
        let x1 = (cx + radius).ceil() as i64;
        let y0 = (cy - radius).floor() as i64;
        let y1 = (cy + radius).ceil() as i64;

        for py in y0..y1 {
            for px in x0..x1 {
                let dx = px as f32 + 0.5 - cx;
                let dy = py as f32 + 0.5 - cy;
                let t = (dx * dx + dy * dy).sqrt() / radius;
                if t >= 1.0 {
                    continue;
                }
                let (rgb, alpha) = gradient.sample(t);
                self.blend_pixel(px, py, rgb, alpha);
            }
        }
    }

    /// Quantised colour of the pixel at `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if the coordinates are outside the canvas.
    pub fn pixel(&self, x: u32, y: u32) -> Rgb {
        assert!(x < self.width && y < self.height, "pixel out of bounds");
        quantise(self.pixels[y as usize * self.width as usize + x as usize])
    }

    /// Row-major packed RGB bytes, ready for the PNG encoder.
    pub fn to_rgb8(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.pixels.len() * 3);
        for p in &self.pixels {
            out.extend_from_slice(&quantise(*p));
        }
        out
    }
}

fn quantise(p: [f32; 3]) -> Rgb {
    [
        p[0].round().clamp(0.0, 255.0) as u8,
        p[1].round().clamp(0.0, 255.0) as u8,
        p[2].round().clamp(0.0, 255.0) as u8,
    ]
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
