//! Capture lifecycle: state machine, session data and the controller that
//! drives them.
//!
//! # Architecture
//!
//! ```text
//! CaptureCommand (mpsc)
//!        │
//!        ▼
//! CaptureController::run()  ← async tokio task
//!        │
//!        ├─ Start   → acquire device, record ≤ max_recording   → Recording
//!        │            release device, encode WAV               → Processing
//!        │            spawn_blocking(synthesize), settle delay → Finished
//!        │
//!        └─ Reset   → release audio + image resources          → Idle
//!
//! SharedSession (Arc<Mutex<CaptureSession>>) ←─── read by the host
//! CaptureUpdate (mpsc)                        ───▶ host notifications
//! ```
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tokio::sync::mpsc;
//! use acoustic_capture::audio::CpalSource;
//! use acoustic_capture::config::AppConfig;
//! use acoustic_capture::pipeline::{CaptureCommand, CaptureController};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = AppConfig::default();
//!     let (update_tx, mut update_rx) = mpsc::unbounded_channel();
//!     let controller = CaptureController::new(Arc::new(CpalSource::default()), &config)
//!         .with_updates(update_tx);
//!
//!     let (cmd_tx, cmd_rx) = mpsc::channel(8);
//!     tokio::spawn(controller.run(cmd_rx));
//!     cmd_tx.send(CaptureCommand::Toggle).await.unwrap();
//!
//!     while let Some(update) = update_rx.recv().await {
//!         println!("{update:?}");
//!     }
//! }
//! ```

pub mod controller;
pub mod state;

pub use controller::{CaptureCommand, CaptureController, CaptureUpdate, StartOutcome, StopReason};
pub use state::{new_shared_session, CaptureSession, CaptureState, SharedSession, Trigger};
