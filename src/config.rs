//! Configuration for the mixer and the sound registry

use crate::error::{CueMixError, Result};

/// Where the mixer sends rendered audio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputBackend {
    /// The host's default output device, driven by its own callback thread.
    #[default]
    Device,
    /// No device. Blocks are pulled explicitly with [`AudioMixer::render`](crate::AudioMixer::render).
    Headless,
}

/// Configuration descriptor for an [`AudioMixer`](crate::AudioMixer).
#[derive(Debug, Clone)]
pub struct MixerDesc {
    /// Output sample rate. Cues are resampled to this rate when loaded.
    pub sample_rate: u32,
    /// Number of output channels (typically 2 for stereo)
    pub channels: u16,
    /// Frames requested from the device per callback
    pub block_size: usize,
    pub backend: OutputBackend,
}

impl Default for MixerDesc {
    fn default() -> Self {
        Self {
            sample_rate: 48000,
            channels: 2,
            block_size: 1024,
            backend: OutputBackend::Device,
        }
    }
}

impl MixerDesc {
    pub fn new() -> Self {
        Self::default()
    }

    /// Headless description, used for offline rendering and tests.
    pub fn headless() -> Self {
        Self {
            backend: OutputBackend::Headless,
            ..Self::default()
        }
    }

    pub fn sample_rate(mut self, rate: u32) -> Self {
        self.sample_rate = rate;
        self
    }

    pub fn channels(mut self, channels: u16) -> Self {
        self.channels = channels;
        self
    }

    pub fn block_size(mut self, size: usize) -> Self {
        self.block_size = size;
        self
    }

    pub fn backend(mut self, backend: OutputBackend) -> Self {
        self.backend = backend;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.sample_rate == 0 {
            return Err(CueMixError::Configuration(
                "Sample rate must be greater than 0".to_string(),
            ));
        }
        if self.channels == 0 {
            return Err(CueMixError::Configuration(
                "Channel count must be greater than 0".to_string(),
            ));
        }
        if self.block_size == 0 {
            return Err(CueMixError::Configuration(
                "Block size must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Configuration descriptor for a [`SoundRegistry`](crate::SoundRegistry).
#[derive(Debug, Clone)]
pub struct SoundRegistryDesc {
    /// Simultaneous instances each loaded cue can play
    pub voices_per_cue: usize,
}

impl Default for SoundRegistryDesc {
    fn default() -> Self {
        Self { voices_per_cue: 5 }
    }
}

impl SoundRegistryDesc {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn voices_per_cue(mut self, voices: usize) -> Self {
        self.voices_per_cue = voices;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.voices_per_cue == 0 {
            return Err(CueMixError::Configuration(
                "A cue needs at least one voice".to_string(),
            ));
        }
        Ok(())
    }
}
