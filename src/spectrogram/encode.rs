//! PNG encoding and data URI packaging.

use base64::Engine;
use png::{BitDepth, ColorType, Compression, Encoder, FilterType};

use super::raster::Canvas;
use super::synth::SynthesisError;

/// MIME type of every synthesized image.
pub const PNG_MIME: &str = "image/png";

/// Encode `canvas` as an 8-bit RGB PNG.
pub fn encode_png(canvas: &Canvas) -> Result<Vec<u8>, SynthesisError> {
    let mut bytes = Vec::new();
    {
        let mut encoder = Encoder::new(&mut bytes, canvas.width(), canvas.height());
        encoder.set_color(ColorType::Rgb);
        encoder.set_depth(BitDepth::Eight);
        encoder.set_compression(Compression::Fast);
        encoder.set_filter(FilterType::Sub);

        let mut writer = encoder.write_header()?;
        writer.write_image_data(&canvas.to_rgb8())?;
        writer.finish()?;
    }
    Ok(bytes)
}

/// Wrap `bytes` in a `data:<mime>;base64,…` URI.
pub fn data_uri(mime: &str, bytes: &[u8]) -> String {
    let b64 = base64::engine::general_purpose::STANDARD.encode(bytes);
    format!("data:{mime};base64,{b64}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn png_signature_and_dimensions() {
        let mut canvas = Canvas::new(7, 3).unwrap();
        canvas.fill([10, 20, 30]);
        let bytes = encode_png(&canvas).unwrap();

        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");

        let decoder = png::Decoder::new(bytes.as_slice());
        let reader = decoder.read_info().unwrap();
        assert_eq!(reader.info().width, 7);
        assert_eq!(reader.info().height, 3);
    }

    #[test]
    fn data_uri_prefix() {
        let uri = data_uri(PNG_MIME, &[0xde, 0xad, 0xbe, 0xef]);
        assert_eq!(uri, "data:image/png;base64,3q2+7w==");
    }
}
