//! Application entry point for Acoustic Capture.
//!
//! # Startup sequence
//!
//! 1. Initialise logging.
//! 2. Load [`AppConfig`] from disk (returns default on first run).
//! 3. Create [`tokio`] runtime (multi-thread, 2 workers).
//! 4. Spawn the capture controller with the default cpal microphone.
//! 5. Press the action button once, print every update until the cycle
//!    finishes or is refused, then reset and shut down.

use std::sync::Arc;

use acoustic_capture::{
    analysis::MockAnalysis,
    audio::CpalSource,
    config::AppConfig,
    pipeline::{CaptureCommand, CaptureController, CaptureState, CaptureUpdate},
};
use anyhow::Context;
use tokio::sync::mpsc;

fn main() -> anyhow::Result<()> {
    // 1. Logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Acoustic Capture starting up");

    // 2. Configuration
    let config = AppConfig::load().unwrap_or_else(|e| {
        log::warn!("Failed to load config ({e}); using defaults");
        AppConfig::default()
    });

    // 3. Tokio runtime (capture loop + blocking synthesis)
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .context("failed to create tokio runtime")?;

    rt.block_on(run_once(config))
}

async fn run_once(config: AppConfig) -> anyhow::Result<()> {
    // 4. Controller
    let source = Arc::new(CpalSource::new(config.capture.audio_device.clone()));
    let (update_tx, mut update_rx) = mpsc::unbounded_channel();
    let controller = CaptureController::new(source, &config).with_updates(update_tx);

    let (cmd_tx, cmd_rx) = mpsc::channel::<CaptureCommand>(8);
    let controller_task = tokio::spawn(controller.run(cmd_rx));

    // 5. One press of the button
    let idle = CaptureState::Idle;
    println!("{}", idle.prompt());
    println!("> {}", idle.action_label());
    cmd_tx
        .send(CaptureCommand::Toggle)
        .await
        .context("capture controller stopped unexpectedly")?;

    while let Some(update) = update_rx.recv().await {
        match update {
            CaptureUpdate::StateChanged(state) => {
                println!("[{}] {}", state.label(), state.prompt());
                if state == CaptureState::Finished {
                    println!("\nSimulated Analysis Results\n{}", MockAnalysis::fixed());
                    println!("> {}", state.action_label());
                    break;
                }
            }
            CaptureUpdate::RecordingStopped {
                duration_secs,
                reason,
            } => {
                println!("  recording stopped after {duration_secs:.1}s ({reason:?})");
            }
            CaptureUpdate::AudioReady(audio) => {
                println!(
                    "  audio: {} ({:.1}s, {} Hz, {} ch)",
                    audio.locator(),
                    audio.duration_secs,
                    audio.sample_rate,
                    audio.channels
                );
            }
            CaptureUpdate::ImageReady(image) => match image.handle {
                Some(handle) => println!(
                    "  spectrogram: {handle} ({}x{}, data URI {} bytes)",
                    image.width,
                    image.height,
                    image.data_uri.len()
                ),
                None => println!("  spectrogram: unavailable"),
            },
            CaptureUpdate::Notice(message) => {
                eprintln!("{message}");
                break;
            }
        }
    }

    // Release whatever the cycle produced, then let the controller exit.
    let _ = cmd_tx.send(CaptureCommand::Reset).await;
    drop(cmd_tx);
    controller_task
        .await
        .context("capture controller panicked")?;

    log::info!("Acoustic Capture shut down");
    Ok(())
}
