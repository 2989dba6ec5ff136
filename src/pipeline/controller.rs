//! Capture controller. Drives one recording from device acquisition to the
//! finished spectrogram.
//!
//! # Lifecycle
//!
//! ```text
//! start()
//!   └─▶ Idle → Recording, AudioSource::acquire
//!         ├─ Err  → Abort → Idle, Notice                    (no resources)
//!         └─ Ok   → collect CaptureSignals until max_recording elapses
//!               ├─ Fault → release device, Abort → Idle, Notice
//!               └─ Timeout / source closed
//!                     └─▶ release device, encode WAV         [RecordingStopped]
//!                         Stop → Processing                  [AudioReady]
//!                         spawn_blocking(synthesize)         [ImageReady]
//!                         sleep(settle_delay)
//!                         Settle → Finished
//! reset()
//!   └─▶ Finished → Idle, release both resources
//! ```
//!
//! The spectrogram is synthesized without looking at the recording; see
//! [`crate::spectrogram::synth`].

use std::sync::{Arc, MutexGuard, PoisonError};

use tokio::sync::mpsc;

use crate::audio::{ActiveCapture, AudioClip, AudioSource, CaptureSignal, ChunkBuffer};
use crate::config::{AppConfig, CaptureConfig};
use crate::resource::{AudioResource, ImageResource, ResourceRegistry, SharedRegistry};
use crate::spectrogram::{SpectrogramImage, SpectrogramSynthesizer};

use super::state::{new_shared_session, CaptureSession, CaptureState, SharedSession, Trigger};

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

/// Commands a host sends to [`CaptureController::run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureCommand {
    Start,
    Reset,
    /// The single demo button: reset when finished, start otherwise.
    Toggle,
}

/// Why a recording ended normally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The recording cap elapsed.
    Timeout,
    /// The source stopped delivering before the cap.
    SourceClosed,
}

/// Progress notifications for the presentation layer, in emission order.
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureUpdate {
    StateChanged(CaptureState),
    RecordingStopped {
        duration_secs: f32,
        reason: StopReason,
    },
    AudioReady(AudioResource),
    ImageReady(ImageResource),
    /// User-facing message (permission denied, aborted recording).
    Notice(String),
}

/// Result of one [`CaptureController::start`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    /// The cycle ran to `Finished`.
    Finished,
    /// The controller was not idle; nothing happened.
    AlreadyActive,
    /// Device access was refused; back to `Idle`.
    Denied,
    /// The recording failed at runtime; back to `Idle`.
    Aborted,
}

enum RecordingEnd {
    Stopped(StopReason),
    Fault(String),
}

// ---------------------------------------------------------------------------
// CaptureController
// ---------------------------------------------------------------------------

/// Owns the capture session and every transition applied to it.
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use acoustic_capture::audio::CpalSource;
/// use acoustic_capture::config::AppConfig;
/// use acoustic_capture::pipeline::{CaptureController, StartOutcome};
///
/// # async fn example() {
/// let config = AppConfig::default();
/// let controller = CaptureController::new(Arc::new(CpalSource::default()), &config);
///
/// if controller.start().await == StartOutcome::Finished {
///     let session = controller.session();
///     let session = session.lock().unwrap();
///     println!("{:?}", session.audio.as_ref().map(|a| a.locator()));
/// }
/// controller.reset();
/// # }
/// ```
pub struct CaptureController {
    session: SharedSession,
    registry: SharedRegistry,
    source: Arc<dyn AudioSource>,
    synthesizer: SpectrogramSynthesizer,
    config: CaptureConfig,
    updates: Option<mpsc::UnboundedSender<CaptureUpdate>>,
}

impl CaptureController {
    /// Create an idle controller with a fresh session and registry.
    pub fn new(source: Arc<dyn AudioSource>, config: &AppConfig) -> Self {
        Self {
            session: new_shared_session(),
            registry: Arc::new(ResourceRegistry::new()),
            source,
            synthesizer: SpectrogramSynthesizer::new(config.spectrogram.clone()),
            config: config.capture.clone(),
            updates: None,
        }
    }

    /// Publish [`CaptureUpdate`]s on `tx`.
    pub fn with_updates(mut self, tx: mpsc::UnboundedSender<CaptureUpdate>) -> Self {
        self.updates = Some(tx);
        self
    }

    pub fn session(&self) -> SharedSession {
        Arc::clone(&self.session)
    }

    pub fn registry(&self) -> SharedRegistry {
        Arc::clone(&self.registry)
    }

    pub fn state(&self) -> CaptureState {
        self.lock().state
    }

    // -----------------------------------------------------------------------
    // Command loop
    // -----------------------------------------------------------------------

    /// Run until `commands` is closed.
    ///
    /// Commands are handled one at a time, so a `Start` queued behind a
    /// running cycle sees a non-idle state and is ignored.
    pub async fn run(self, mut commands: mpsc::Receiver<CaptureCommand>) {
        while let Some(command) = commands.recv().await {
            match command {
                CaptureCommand::Start => {
                    self.start().await;
                }
                CaptureCommand::Reset => {
                    self.reset();
                }
                CaptureCommand::Toggle => {
                    if self.state() == CaptureState::Finished {
                        self.reset();
                    } else {
                        self.start().await;
                    }
                }
            }
        }

        log::info!("capture: command channel closed, controller shutting down");
    }

    // -----------------------------------------------------------------------
    // Operations
    // -----------------------------------------------------------------------

    /// Run one full capture cycle.
    ///
    /// A no-op returning [`StartOutcome::AlreadyActive`] unless the session
    /// is idle; the check and the move to `Recording` happen under one lock,
    /// so concurrent callers acquire the device at most once.
    pub async fn start(&self) -> StartOutcome {
        let claimed = self.transition(Trigger::Start, |s| {
            s.notice = None;
            s.recording_secs = 0.0;
        });
        if !claimed {
            log::debug!("capture: start ignored while {}", self.state().label());
            return StartOutcome::AlreadyActive;
        }

        let (tx, rx) = mpsc::unbounded_channel();
        let capture = match self.source.acquire(tx).await {
            Ok(capture) => capture,
            Err(e) => {
                log::warn!("capture: device acquisition failed: {e}");
                self.abort(e.user_message());
                return StartOutcome::Denied;
            }
        };

        let format = capture.format();
        let (mut buffer, end) = self.record(capture, rx, ChunkBuffer::new(format)).await;

        let reason = match end {
            RecordingEnd::Stopped(reason) => reason,
            RecordingEnd::Fault(msg) => {
                self.abort(format!(
                    "Recording failed ({msg}). Please start the test again."
                ));
                return StartOutcome::Aborted;
            }
        };

        let duration_secs = buffer.duration_secs();
        let samples = buffer.drain();
        let clip = match AudioClip::encode(&samples, format) {
            Ok(clip) => clip,
            Err(e) => {
                log::error!("capture: could not package recording: {e}");
                self.abort(format!("Recording failed ({e}). Please start the test again."));
                return StartOutcome::Aborted;
            }
        };

        self.emit(CaptureUpdate::RecordingStopped {
            duration_secs,
            reason,
        });
        log::info!("capture: recorded {duration_secs:.2}s ({reason:?})");

        let audio = AudioResource::publish(&self.registry, clip);
        self.transition(Trigger::Stop, |s| {
            s.audio = Some(audio.clone());
            s.recording_secs = duration_secs;
        });
        self.emit(CaptureUpdate::AudioReady(audio));

        let image = self.synthesize().await;
        self.emit(CaptureUpdate::ImageReady(image.clone()));

        tokio::time::sleep(self.config.settle_delay()).await;

        self.transition(Trigger::Settle, |s| s.image = Some(image));
        StartOutcome::Finished
    }

    /// Abandon a finished session and release its resources.
    ///
    /// Safe to call when idle (no-op, returns `true`).  Ignored while
    /// recording or processing (returns `false`).
    pub fn reset(&self) -> bool {
        let (previous, audio, image) = {
            let mut session = self.lock();
            if session.state.next(Trigger::Reset).is_none() {
                log::warn!("capture: reset ignored while {}", session.state.label());
                return false;
            }
            let previous = session.state;
            let cleared = std::mem::take(&mut *session);
            (previous, cleared.audio, cleared.image)
        };

        if let Some(audio) = audio {
            self.registry.release(&audio.handle);
        }
        if let Some(handle) = image.and_then(|i| i.handle) {
            self.registry.release(&handle);
        }

        if previous != CaptureState::Idle {
            log::debug!("capture: {} → Idle (reset)", previous.label());
            self.emit(CaptureUpdate::StateChanged(CaptureState::Idle));
        }
        true
    }

    // -----------------------------------------------------------------------
    // Steps
    // -----------------------------------------------------------------------

    /// Collect chunks until the cap elapses, the source closes or faults.
    ///
    /// The device is released before returning on every path.
    async fn record(
        &self,
        mut capture: Box<dyn ActiveCapture>,
        mut rx: mpsc::UnboundedReceiver<CaptureSignal>,
        mut buffer: ChunkBuffer,
    ) -> (ChunkBuffer, RecordingEnd) {
        let cap = tokio::time::sleep(self.config.max_recording());
        tokio::pin!(cap);

        let end = loop {
            tokio::select! {
                _ = &mut cap => break RecordingEnd::Stopped(StopReason::Timeout),
                signal = rx.recv() => match signal {
                    Some(CaptureSignal::Data(chunk)) => {
                        buffer.push(chunk);
                    }
                    Some(CaptureSignal::Fault(msg)) => break RecordingEnd::Fault(msg),
                    None => break RecordingEnd::Stopped(StopReason::SourceClosed),
                },
            }
        };

        capture.release();
        log::debug!(
            "capture: device released after {} chunks ({} samples)",
            buffer.chunk_count(),
            buffer.len()
        );

        // Chunks delivered before the release still belong to the recording.
        while let Ok(CaptureSignal::Data(chunk)) = rx.try_recv() {
            buffer.push(chunk);
        }

        if buffer.rejected_count() > 0 {
            log::warn!(
                "capture: {} chunks dropped for a mismatched format",
                buffer.rejected_count()
            );
        }

        (buffer, end)
    }

    /// Paint the spectrogram on the blocking pool and publish it.
    async fn synthesize(&self) -> ImageResource {
        let synthesizer = self.synthesizer.clone();
        let image = match tokio::task::spawn_blocking(move || synthesizer.synthesize()).await {
            Ok(image) => image,
            Err(e) => {
                log::error!("capture: synthesis task failed: {e}");
                SpectrogramImage::empty()
            }
        };
        ImageResource::publish(&self.registry, image)
    }

    fn abort(&self, notice: String) {
        self.transition(Trigger::Abort, |s| {
            s.audio = None;
            s.image = None;
            s.notice = Some(notice.clone());
        });
        self.emit(CaptureUpdate::Notice(notice));
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    /// Apply `trigger` and, if valid, `update` under one lock.
    fn transition(&self, trigger: Trigger, update: impl FnOnce(&mut CaptureSession)) -> bool {
        let next = {
            let mut session = self.lock();
            let Some(next) = session.state.next(trigger) else {
                return false;
            };
            log::debug!("capture: {} → {} ({trigger:?})", session.state.label(), next.label());
            session.state = next;
            update(&mut session);
            debug_assert!(session.is_consistent(), "session invariant broken: {session:?}");
            next
        };
        self.emit(CaptureUpdate::StateChanged(next));
        true
    }

    fn emit(&self, update: CaptureUpdate) {
        if let Some(tx) = &self.updates {
            let _ = tx.send(update);
        }
    }

    fn lock(&self) -> MutexGuard<'_, CaptureSession> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
