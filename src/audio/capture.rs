//! Microphone acquisition.
//!
//! [`AudioSource`] is the device capability boundary the capture controller
//! talks to: `acquire` asks for exclusive, temporary ownership of one input
//! device and returns an [`ActiveCapture`] guard.  Releasing the guard (or
//! dropping it) gives the device back; releasing twice is a no-op.
//!
//! [`CpalSource`] is the production implementation.  A `cpal::Stream` is not
//! `Send` on every platform, so the stream is built, played and dropped on a
//! dedicated `audio-capture` thread; the guard only holds a stop channel.

use std::sync::mpsc as std_mpsc;

use async_trait::async_trait;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

// ---------------------------------------------------------------------------
// AudioChunk / CaptureSignal
// ---------------------------------------------------------------------------

/// A single buffer of raw audio as delivered by the device callback.
///
/// Samples are interleaved `f32` in the range `[-1.0, 1.0]`.
#[derive(Debug, Clone)]
pub struct AudioChunk {
    /// Interleaved PCM samples in `[-1.0, 1.0]`.
    pub samples: Vec<f32>,
    /// Sample rate of this chunk in Hz (e.g. 44100, 48000, 16000).
    pub sample_rate: u32,
    /// Number of interleaved channels (1 = mono, 2 = stereo, …).
    pub channels: u16,
}

/// Events a live capture pushes to the controller.
#[derive(Debug, Clone)]
pub enum CaptureSignal {
    /// A data-available notification.
    Data(AudioChunk),
    /// The device reported a runtime error; the session cannot continue.
    Fault(String),
}

/// Sample layout of a live capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamFormat {
    pub sample_rate: u32,
    pub channels: u16,
}

// ---------------------------------------------------------------------------
// CaptureError
// ---------------------------------------------------------------------------

/// Errors that can occur while acquiring the input device.
///
/// Every variant is treated as "access denied" by the controller: the
/// session returns to `Idle` and the user is told to check permissions.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("microphone access denied: {0}")]
    PermissionDenied(String),

    #[error("no input device found on the default audio host")]
    NoDevice,

    #[error("input device {0:?} not found")]
    DeviceNotFound(String),

    #[error("failed to enumerate input devices: {0}")]
    Devices(#[from] cpal::DevicesError),

    #[error("failed to query default input config: {0}")]
    DefaultConfig(#[from] cpal::DefaultStreamConfigError),

    #[error("failed to build input stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[error("failed to start audio stream: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),

    #[error("failed to spawn capture thread: {0}")]
    Thread(String),

    #[error("capture thread exited before reporting")]
    Disconnected,
}

impl CaptureError {
    /// Actionable message shown to the user when acquisition fails.
    pub fn user_message(&self) -> String {
        match self {
            CaptureError::NoDevice | CaptureError::DeviceNotFound(_) => format!(
                "No microphone is available ({self}). Connect an input device and try again."
            ),
            _ => "Microphone access was denied. Please allow microphone access in your \
                  system settings to use this feature."
                .to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// AudioSource / ActiveCapture
// ---------------------------------------------------------------------------

/// Grants temporary, exclusive ownership of an audio input device.
#[async_trait]
pub trait AudioSource: Send + Sync {
    /// Request the device and begin streaming [`CaptureSignal`]s into `tx`.
    ///
    /// Suspends until the platform grants or refuses access.
    async fn acquire(
        &self,
        tx: mpsc::UnboundedSender<CaptureSignal>,
    ) -> Result<Box<dyn ActiveCapture>, CaptureError>;
}

/// Guard over an acquired device.
pub trait ActiveCapture: Send {
    fn format(&self) -> StreamFormat;

    /// Stop all input and give the device back.  Idempotent.
    fn release(&mut self);

    fn is_released(&self) -> bool;
}

// Compile-time assertion: Box<dyn AudioSource> must be constructible.
const _: fn() = || {
    fn _assert_object_safe(_: Box<dyn AudioSource>, _: Box<dyn ActiveCapture>) {}
};

// ---------------------------------------------------------------------------
// AudioCapture (cpal device wrapper)
// ---------------------------------------------------------------------------

/// RAII guard that keeps the cpal stream alive.
struct StreamHandle {
    _stream: cpal::Stream,
}

/// Microphone capture device wrapper built on top of `cpal`.
struct AudioCapture {
    device: cpal::Device,
    config: cpal::StreamConfig,
    format: StreamFormat,
}

impl AudioCapture {
    /// Open `device_name`, or the system default input when `None`.
    fn open(device_name: Option<&str>) -> Result<Self, CaptureError> {
        let host = cpal::default_host();
        let device = match device_name {
            None => host.default_input_device().ok_or(CaptureError::NoDevice)?,
            Some(name) => host
                .input_devices()?
                .find(|d| d.name().is_ok_and(|n| n == name))
                .ok_or_else(|| CaptureError::DeviceNotFound(name.to_string()))?,
        };

        let supported = device.default_input_config()?;
        let format = StreamFormat {
            sample_rate: supported.sample_rate().0,
            channels: supported.channels(),
        };
        let config: cpal::StreamConfig = supported.into();

        Ok(Self {
            device,
            config,
            format,
        })
    }

    /// Build and play the input stream, forwarding every buffer to `tx`.
    ///
    /// Send errors (receiver dropped) are ignored so the audio thread never
    /// panics.
    fn start(&self, tx: mpsc::UnboundedSender<CaptureSignal>) -> Result<StreamHandle, CaptureError> {
        let StreamFormat {
            sample_rate,
            channels,
        } = self.format;
        let err_tx = tx.clone();

        let stream = self.device.build_input_stream(
            &self.config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                let chunk = AudioChunk {
                    samples: data.to_vec(),
                    sample_rate,
                    channels,
                };
                let _ = tx.send(CaptureSignal::Data(chunk));
            },
            move |err: cpal::StreamError| {
                log::error!("cpal stream error: {err}");
                let _ = err_tx.send(CaptureSignal::Fault(err.to_string()));
            },
            None,
        )?;

        stream.play()?;
        Ok(StreamHandle { _stream: stream })
    }
}

// ---------------------------------------------------------------------------
// CpalSource
// ---------------------------------------------------------------------------

/// [`AudioSource`] backed by the platform audio host.
#[derive(Debug, Clone, Default)]
pub struct CpalSource {
    device_name: Option<String>,
}

impl CpalSource {
    /// Use `device_name`, or the system default input when `None`.
    pub fn new(device_name: Option<String>) -> Self {
        Self { device_name }
    }
}

#[async_trait]
impl AudioSource for CpalSource {
    async fn acquire(
        &self,
        tx: mpsc::UnboundedSender<CaptureSignal>,
    ) -> Result<Box<dyn ActiveCapture>, CaptureError> {
        let (ready_tx, ready_rx) = oneshot::channel::<Result<StreamFormat, CaptureError>>();
        let (stop_tx, stop_rx) = std_mpsc::channel::<()>();
        let device_name = self.device_name.clone();

        std::thread::Builder::new()
            .name("audio-capture".into())
            .spawn(move || {
                let opened = AudioCapture::open(device_name.as_deref())
                    .and_then(|capture| capture.start(tx).map(|handle| (capture.format, handle)));

                let handle = match opened {
                    Ok((format, handle)) => {
                        let _ = ready_tx.send(Ok(format));
                        handle
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };

                // Blocks until release() or the guard is dropped.
                let _ = stop_rx.recv();
                drop(handle);
                log::debug!("audio-capture: stream dropped, device released");
            })
            .map_err(|e| CaptureError::Thread(e.to_string()))?;

        let format = ready_rx.await.map_err(|_| CaptureError::Disconnected)??;
        log::info!(
            "audio capture started ({} Hz, {} ch)",
            format.sample_rate,
            format.channels
        );

        Ok(Box::new(CpalCapture {
            stop: Some(stop_tx),
            format,
        }))
    }
}

/// Guard for a stream living on the `audio-capture` thread.
struct CpalCapture {
    stop: Option<std_mpsc::Sender<()>>,
    format: StreamFormat,
}

impl ActiveCapture for CpalCapture {
    fn format(&self) -> StreamFormat {
        self.format
    }

    fn release(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
    }

    fn is_released(&self) -> bool {
        self.stop.is_none()
    }
}

impl Drop for CpalCapture {
    fn drop(&mut self) {
        self.release();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    /// `AudioChunk` must be `Send` so it can cross thread boundaries.
    #[test]
    fn audio_chunk_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<AudioChunk>();
        assert_send::<CaptureSignal>();
    }

    #[test]
    fn cpal_capture_release_is_idempotent() {
        let (stop_tx, stop_rx) = std_mpsc::channel();
        let mut guard = CpalCapture {
            stop: Some(stop_tx),
            format: StreamFormat {
                sample_rate: 48_000,
                channels: 1,
            },
        };

        assert!(!guard.is_released());
        guard.release();
        guard.release();
        assert!(guard.is_released());

        assert!(stop_rx.try_recv().is_ok());
        // Only one stop message was sent; the sender is now gone.
        assert!(stop_rx.try_recv().is_err());
    }

    #[test]
    fn denial_message_is_actionable() {
        let msg = CaptureError::PermissionDenied("user refused".into()).user_message();
        assert!(msg.contains("allow microphone access"), "{msg}");

        let msg = CaptureError::NoDevice.user_message();
        assert!(msg.contains("No microphone"), "{msg}");
    }
}
