//! Audio side of the capture lifecycle: device acquisition → chunk
//! accumulation → WAV clip.
//!
//! # Pipeline
//!
//! ```text
//! AudioSource::acquire → CaptureSignal (mpsc) → ChunkBuffer
//!                      → ActiveCapture::release → AudioClip::encode
//! ```
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use acoustic_capture::audio::{AudioSource, CaptureSignal, CpalSource};
//!
//! # async fn example() {
//! let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<CaptureSignal>();
//! let source = CpalSource::default();
//! let mut capture = source.acquire(tx).await.unwrap();
//!
//! if let Some(CaptureSignal::Data(chunk)) = rx.recv().await {
//!     println!("received {} samples @ {}Hz", chunk.samples.len(), chunk.sample_rate);
//! }
//! capture.release();
//! # }
//! ```

pub mod buffer;
pub mod capture;
pub mod clip;

pub use buffer::ChunkBuffer;
pub use capture::{
    ActiveCapture, AudioChunk, AudioSource, CaptureError, CaptureSignal, CpalSource, StreamFormat,
};
pub use clip::{AudioClip, ClipError, WAV_MIME};
