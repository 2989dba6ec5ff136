//! Packaging of a finished recording as a playable WAV container.
//!
//! The container is built in memory; nothing touches the filesystem.

use std::io::Cursor;

use thiserror::Error;

use super::buffer::frames_to_secs;
use super::capture::StreamFormat;

/// MIME type of every captured clip.
pub const WAV_MIME: &str = "audio/wav";

/// Failure to package captured samples.
#[derive(Debug, Error)]
pub enum ClipError {
    #[error("WAV encoding failed: {0}")]
    Wav(#[from] hound::Error),

    #[error("invalid stream format: {sample_rate} Hz, {channels} ch")]
    InvalidFormat { sample_rate: u32, channels: u16 },
}

/// A finished recording, encoded as 32-bit float WAV.
#[derive(Debug, Clone)]
pub struct AudioClip {
    pub wav: Vec<u8>,
    pub format: StreamFormat,
    pub duration_secs: f32,
}

impl AudioClip {
    /// Encode interleaved `samples` captured in `format`.
    ///
    /// An empty recording still produces a valid (header-only) container.
    pub fn encode(samples: &[f32], format: StreamFormat) -> Result<Self, ClipError> {
        if format.sample_rate == 0 || format.channels == 0 {
            return Err(ClipError::InvalidFormat {
                sample_rate: format.sample_rate,
                channels: format.channels,
            });
        }

        let spec = hound::WavSpec {
            channels: format.channels,
            sample_rate: format.sample_rate,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };

        let mut wav = Vec::new();
        {
            let mut writer = hound::WavWriter::new(Cursor::new(&mut wav), spec)?;
            // Drop a trailing partial frame so the container stays aligned.
            let whole = samples.len() - samples.len() % format.channels as usize;
            for &s in &samples[..whole] {
                writer.write_sample(s)?;
            }
            writer.finalize()?;
        }

        Ok(Self {
            wav,
            format,
            duration_secs: frames_to_secs(samples.len(), format),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clip_decodes_back_to_samples() {
        let format = StreamFormat {
            sample_rate: 16_000,
            channels: 1,
        };
        let samples: Vec<f32> = (0..1_600).map(|i| (i as f32 * 0.01).sin() * 0.5).collect();
        let clip = AudioClip::encode(&samples, format).unwrap();

        assert_eq!(&clip.wav[..4], b"RIFF");
        assert!((clip.duration_secs - 0.1).abs() < 1e-6);

        let mut reader = hound::WavReader::new(Cursor::new(&clip.wav)).unwrap();
        assert_eq!(reader.spec().sample_rate, 16_000);
        assert_eq!(reader.spec().channels, 1);
        let decoded: Vec<f32> = reader.samples::<f32>().map(|s| s.unwrap()).collect();
        assert_eq!(decoded, samples);
    }

    #[test]
    fn empty_recording_is_header_only() {
        let format = StreamFormat {
            sample_rate: 48_000,
            channels: 2,
        };
        let clip = AudioClip::encode(&[], format).unwrap();
        let reader = hound::WavReader::new(Cursor::new(&clip.wav)).unwrap();
        assert_eq!(reader.len(), 0);
        assert_eq!(clip.duration_secs, 0.0);
    }

    #[test]
    fn partial_frame_is_dropped() {
        let format = StreamFormat {
            sample_rate: 8_000,
            channels: 2,
        };
        let clip = AudioClip::encode(&[0.1, 0.2, 0.3], format).unwrap();
        let reader = hound::WavReader::new(Cursor::new(&clip.wav)).unwrap();
        assert_eq!(reader.len(), 2);
    }

    #[test]
    fn zero_rate_is_rejected() {
        let format = StreamFormat {
            sample_rate: 0,
            channels: 1,
        };
        assert!(matches!(
            AudioClip::encode(&[0.0], format),
            Err(ClipError::InvalidFormat { .. })
        ));
    }
}
