//! Error types for cuemix

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CueMixError {
    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Audio format error: {0}")]
    AudioFormat(String),

    #[error("Resampling error: {0}")]
    Resample(String),

    #[error("Audio device error: {0}")]
    AudioDevice(String),

    #[error("Mixer unavailable: {0}")]
    MixerUnavailable(String),

    #[error("Cue is not open on a mixer")]
    CueNotOpen,

    #[error("No sound named '{0}'")]
    UnknownSound(String),

    #[error("Invalid sound name: {0:?}")]
    InvalidName(String),

    #[error("All {voices} voices are busy")]
    VoicesExhausted { voices: usize },

    #[error("Configuration error: {0}")]
    Configuration(String),
}

pub type Result<T> = std::result::Result<T, CueMixError>;
