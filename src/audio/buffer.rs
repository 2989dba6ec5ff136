//! Accumulator for the chunks delivered during one recording.
//!
//! Chunks are appended in arrival order and concatenated on
//! [`drain`](ChunkBuffer::drain).  A buffer is bound to the
//! [`StreamFormat`] of the capture that fills it; chunks in any other format
//! are dropped with a warning instead of corrupting the interleaving.
//!
//! # Example
//!
//! ```rust
//! use acoustic_capture::audio::{AudioChunk, ChunkBuffer, StreamFormat};
//!
//! let mut buf = ChunkBuffer::new(StreamFormat { sample_rate: 16_000, channels: 1 });
//! buf.push(AudioChunk { samples: vec![0.1, 0.2], sample_rate: 16_000, channels: 1 });
//! buf.push(AudioChunk { samples: vec![0.3], sample_rate: 16_000, channels: 1 });
//! assert_eq!(buf.drain(), vec![0.1, 0.2, 0.3]);
//! ```

use super::capture::{AudioChunk, StreamFormat};

// ---------------------------------------------------------------------------
// ChunkBuffer
// ---------------------------------------------------------------------------

/// Ordered, unbounded store of interleaved samples for a single recording.
///
/// The recording length is capped by the controller's timer, not here.
#[derive(Debug)]
pub struct ChunkBuffer {
    format: StreamFormat,
    samples: Vec<f32>,
    /// Number of chunks accepted since the last drain.
    chunks: usize,
    /// Number of chunks rejected for a mismatched format.
    rejected: usize,
}

impl ChunkBuffer {
    pub fn new(format: StreamFormat) -> Self {
        Self {
            format,
            samples: Vec::new(),
            chunks: 0,
            rejected: 0,
        }
    }

    /// Append `chunk` if it matches the buffer's format.
    ///
    /// Returns `false` when the chunk was rejected.
    pub fn push(&mut self, chunk: AudioChunk) -> bool {
        if chunk.sample_rate != self.format.sample_rate || chunk.channels != self.format.channels {
            log::warn!(
                "dropping chunk in {} Hz/{} ch, expected {} Hz/{} ch",
                chunk.sample_rate,
                chunk.channels,
                self.format.sample_rate,
                self.format.channels
            );
            self.rejected += 1;
            return false;
        }
        self.samples.extend_from_slice(&chunk.samples);
        self.chunks += 1;
        true
    }

    /// Take the concatenated samples and reset the buffer.
    pub fn drain(&mut self) -> Vec<f32> {
        self.chunks = 0;
        self.rejected = 0;
        std::mem::take(&mut self.samples)
    }

    /// Number of interleaved samples currently stored.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks
    }

    pub fn rejected_count(&self) -> usize {
        self.rejected
    }

    /// Duration of the stored audio in seconds.
    pub fn duration_secs(&self) -> f32 {
        frames_to_secs(self.samples.len(), self.format)
    }
}

/// Seconds represented by `samples` interleaved values in `format`.
pub fn frames_to_secs(samples: usize, format: StreamFormat) -> f32 {
    if format.sample_rate == 0 || format.channels == 0 {
        return 0.0;
    }
    let frames = samples / format.channels as usize;
    frames as f32 / format.sample_rate as f32
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const MONO_16K: StreamFormat = StreamFormat {
        sample_rate: 16_000,
        channels: 1,
    };

    fn chunk(samples: &[f32], sample_rate: u32, channels: u16) -> AudioChunk {
        AudioChunk {
            samples: samples.to_vec(),
            sample_rate,
            channels,
        }
    }

    #[test]
    fn chunks_concatenate_in_order() {
        let mut buf = ChunkBuffer::new(MONO_16K);
        buf.push(chunk(&[1.0, 2.0], 16_000, 1));
        buf.push(chunk(&[3.0], 16_000, 1));
        buf.push(chunk(&[4.0, 5.0], 16_000, 1));

        assert_eq!(buf.chunk_count(), 3);
        assert_eq!(buf.drain(), vec![1.0, 2.0, 3.0, 4.0, 5.0]);
        assert!(buf.is_empty());
        assert_eq!(buf.chunk_count(), 0);
    }

    #[test]
    fn mismatched_format_is_rejected() {
        let mut buf = ChunkBuffer::new(MONO_16K);
        assert!(!buf.push(chunk(&[1.0, 1.0], 48_000, 1)));
        assert!(!buf.push(chunk(&[1.0, 1.0], 16_000, 2)));
        assert!(buf.push(chunk(&[0.5], 16_000, 1)));

        assert_eq!(buf.rejected_count(), 2);
        assert_eq!(buf.drain(), vec![0.5]);
    }

    #[test]
    fn drain_empty_returns_empty_vec() {
        let mut buf = ChunkBuffer::new(MONO_16K);
        assert_eq!(buf.drain(), Vec::<f32>::new());
    }

    #[test]
    fn drain_resets_counters() {
        let mut buf = ChunkBuffer::new(MONO_16K);
        buf.push(chunk(&[1.0; 10], 16_000, 1));
        buf.push(chunk(&[1.0; 10], 8_000, 1));
        assert_eq!(buf.len(), 10);

        buf.drain();
        assert!(buf.is_empty());
        assert_eq!(buf.chunk_count(), 0);
        assert_eq!(buf.rejected_count(), 0);

        buf.push(chunk(&[9.0], 16_000, 1));
        assert_eq!(buf.drain(), vec![9.0]);
    }

    #[test]
    fn duration_counts_frames_not_samples() {
        let stereo = StreamFormat {
            sample_rate: 48_000,
            channels: 2,
        };
        let mut buf = ChunkBuffer::new(stereo);
        buf.push(chunk(&vec![0.0; 96_000], 48_000, 2));
        assert!((buf.duration_secs() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn degenerate_format_has_zero_duration() {
        let fmt = StreamFormat {
            sample_rate: 0,
            channels: 1,
        };
        assert_eq!(frames_to_secs(1_000, fmt), 0.0);
    }
}
