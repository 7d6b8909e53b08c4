//! Error types
use thiserror::Error;

/// Errors raised by recorders, sound slots and attribute parsing
#[derive(Error, Debug)]
pub enum Error {
    /// `play` was called with a slot name that was never registered
    #[error("Sound slot `{0}` does not exist")]
    UnknownSlot(String),

    /// The active recorder only captures audio and has no sound slots
    #[error("Recorder `{0}` can't play sound slots")]
    NotPlayable(&'static str),

    /// `audio.recorder` names a recorder that does not exist
    #[error("Recorder type `{0}` does not exist")]
    UnknownRecorder(String),

    /// FFT sizes must be a power of two between 32 and 4096
    #[error("Invalid FFT size: {0}")]
    InvalidFftSize(usize),

    /// No default audio device of the given kind
    #[error("No default {0} device available")]
    NoDevice(&'static str),

    /// The audio thread exited before reporting back
    #[error("Audio thread terminated during setup")]
    Disconnected,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Sound file could not be decoded
    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    #[error("Audio config error: {0}")]
    StreamConfig(#[from] cpal::DefaultStreamConfigError),

    #[error("Audio stream error: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[error("Audio playback error: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),
}

/// Result type for this crate
pub type Result<T> = std::result::Result<T, Error>;
