//! Audio data, resource loading and decoding

mod decoder;
mod resampler;
mod resource;

pub use decoder::decode;
pub use resource::{DirectoryLoader, EmbeddedLoader, ResourceLoader};

use crate::error::{CueMixError, Result};
use std::sync::Arc;
use std::time::Duration;

/// Decoded PCM audio, cheap to clone.
///
/// Samples are stored **interleaved**: stereo is `[L0, R0, L1, R1, ...]`.
#[derive(Debug, Clone)]
pub struct CueData {
    inner: Arc<CueDataInner>,
}

#[derive(Debug)]
struct CueDataInner {
    samples: Vec<f32>,
    sample_rate: u32,
    channels: u16,
    duration: Duration,
    total_frames: usize,
}

impl CueData {
    pub(crate) fn new(samples: Vec<f32>, sample_rate: u32, channels: u16) -> Self {
        let total_frames = samples.len() / channels as usize;
        let duration = Duration::from_secs_f64(total_frames as f64 / sample_rate as f64);
        Self {
            inner: Arc::new(CueDataInner {
                samples,
                sample_rate,
                channels,
                duration,
                total_frames,
            }),
        }
    }

    /// Wraps already decoded interleaved samples.
    pub fn from_interleaved(samples: Vec<f32>, sample_rate: u32, channels: u16) -> Result<Self> {
        if sample_rate == 0 {
            return Err(CueMixError::AudioFormat(
                "Sample rate must be greater than 0".to_string(),
            ));
        }
        if channels == 0 {
            return Err(CueMixError::AudioFormat(
                "Channel count must be greater than 0".to_string(),
            ));
        }
        if samples.len() % channels as usize != 0 {
            return Err(CueMixError::AudioFormat(format!(
                "{} samples do not form whole {}-channel frames",
                samples.len(),
                channels
            )));
        }
        Ok(Self::new(samples, sample_rate, channels))
    }

    /// Decodes an encoded audio file held in memory.
    ///
    /// `extension` is only a hint for format probing (e.g. `"wav"`).
    pub fn from_bytes(bytes: Vec<u8>, extension: Option<&str>) -> Result<Self> {
        decode(bytes, extension)
    }

    pub fn sample_rate(&self) -> u32 {
        self.inner.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.inner.channels
    }

    pub fn duration(&self) -> Duration {
        self.inner.duration
    }

    pub fn samples(&self) -> &[f32] {
        &self.inner.samples
    }

    pub fn total_frames(&self) -> usize {
        self.inner.total_frames
    }

    pub fn is_empty(&self) -> bool {
        self.inner.samples.is_empty()
    }

    pub fn len(&self) -> usize {
        self.inner.samples.len()
    }

    /// One interleaved frame, or `None` past the end.
    pub fn frame(&self, index: usize) -> Option<&[f32]> {
        let channels = self.inner.channels as usize;
        let start = index.checked_mul(channels)?;
        let end = start.checked_add(channels)?;
        self.inner.samples.get(start..end)
    }

    /// Get samples for a specific channel (0-indexed)
    pub fn channel_samples(&self, channel: usize) -> Result<Vec<f32>> {
        if channel >= self.inner.channels as usize {
            return Err(CueMixError::AudioFormat(format!(
                "Channel {} out of range (max: {})",
                channel,
                self.inner.channels - 1
            )));
        }

        Ok(self
            .inner
            .samples
            .chunks(self.inner.channels as usize)
            .map(|frame| frame[channel])
            .collect())
    }

    /// Converts to two channels: mono is duplicated, extra channels beyond
    /// front left/right are dropped.
    pub fn to_stereo(&self) -> Self {
        match self.inner.channels {
            2 => self.clone(),
            1 => {
                let samples = self.inner.samples.iter().flat_map(|&s| [s, s]).collect();
                Self::new(samples, self.inner.sample_rate, 2)
            }
            channels => {
                let samples = self
                    .inner
                    .samples
                    .chunks(channels as usize)
                    .flat_map(|frame| [frame[0], frame[1]])
                    .collect();
                Self::new(samples, self.inner.sample_rate, 2)
            }
        }
    }

    /// Resamples to `target_sample_rate`, keeping onset and length aligned.
    pub fn resample(&self, target_sample_rate: u32) -> Result<Self> {
        if target_sample_rate == self.inner.sample_rate {
            return Ok(self.clone());
        }

        let resampled = resampler::resample_interleaved(
            &self.inner.samples,
            self.inner.channels,
            self.inner.sample_rate,
            target_sample_rate,
        )?;
        Ok(Self::new(resampled, target_sample_rate, self.inner.channels))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frames_and_duration_are_derived() {
        let data = CueData::from_interleaved(vec![0.0; 96_000], 48_000, 2).unwrap();
        assert_eq!(data.total_frames(), 48_000);
        assert_eq!(data.duration(), Duration::from_secs(1));
        assert_eq!(data.len(), 96_000);
    }

    #[test]
    fn ragged_frames_are_rejected() {
        assert!(CueData::from_interleaved(vec![0.0; 3], 48_000, 2).is_err());
        assert!(CueData::from_interleaved(vec![0.0; 4], 0, 2).is_err());
        assert!(CueData::from_interleaved(vec![0.0; 4], 48_000, 0).is_err());
    }

    #[test]
    fn mono_is_duplicated_into_stereo() {
        let data = CueData::from_interleaved(vec![0.1, 0.2, 0.3], 8_000, 1).unwrap();
        let stereo = data.to_stereo();
        assert_eq!(stereo.channels(), 2);
        assert_eq!(stereo.samples(), &[0.1, 0.1, 0.2, 0.2, 0.3, 0.3]);
    }

    #[test]
    fn surround_keeps_front_pair() {
        let data =
            CueData::from_interleaved(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], 8_000, 3).unwrap();
        let stereo = data.to_stereo();
        assert_eq!(stereo.samples(), &[1.0, 2.0, 4.0, 5.0]);
    }

    #[test]
    fn frame_and_channel_access() {
        let data = CueData::from_interleaved(vec![1.0, -1.0, 2.0, -2.0], 8_000, 2).unwrap();
        assert_eq!(data.frame(1), Some(&[2.0, -2.0][..]));
        assert_eq!(data.frame(2), None);
        assert_eq!(data.channel_samples(1).unwrap(), vec![-1.0, -2.0]);
        assert!(data.channel_samples(2).is_err());
    }

    #[test]
    fn resample_to_same_rate_is_identity() {
        let data = CueData::from_interleaved(vec![0.5; 64], 44_100, 2).unwrap();
        let same = data.resample(44_100).unwrap();
        assert_eq!(same.samples(), data.samples());
    }
}
