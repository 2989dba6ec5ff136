//! Acoustic capture: a bounded microphone recording exposed as a playable
//! WAV resource, paired with a synthesized vowel spectrogram.

pub mod analysis;
pub mod audio;
pub mod config;
pub mod pipeline;
pub mod resource;
pub mod spectrogram;
