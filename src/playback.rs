//! Playback handles, options and per-voice state.
//!
//! - [`PlayHandle`]: identifies one sounding instance of a cue
//! - [`LoopMode`]: play once or loop until stopped
//! - [`PlayOptions`]: per-instance volume and loop mode
//! - `Voice`: one polyphony slot of a cue, advanced by the mixer (internal)

use crate::audio_data::CueData;
use std::fmt;

/// Handle of a play instance.
///
/// The raw value is the voice slot of the cue, or `-1` for [`PlayHandle::NONE`].
/// A handle is only meaningful for the cue that returned it, and only until that
/// instance completes or is stopped; afterwards the slot may be handed out again.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct PlayHandle(i32);

impl PlayHandle {
    /// "No instance": returned when playback could not be started.
    pub const NONE: PlayHandle = PlayHandle(-1);

    pub fn from_raw(raw: i32) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> i32 {
        self.0
    }

    pub fn is_none(self) -> bool {
        self.0 < 0
    }

    pub(crate) fn from_slot(slot: usize) -> Self {
        Self(slot as i32)
    }

    pub(crate) fn slot(self) -> Option<usize> {
        usize::try_from(self.0).ok()
    }
}

impl Default for PlayHandle {
    fn default() -> Self {
        Self::NONE
    }
}

impl fmt::Display for PlayHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PlayHandle({})", self.0)
    }
}

/// Loop mode for audio playback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoopMode {
    /// Play once; the voice frees itself at the end
    #[default]
    Once,
    /// Loop until stopped
    Infinite,
}

/// Per-instance playback settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayOptions {
    /// Linear gain, clamped to `0.0..=1.0`
    pub volume: f32,
    pub loop_mode: LoopMode,
}

impl Default for PlayOptions {
    fn default() -> Self {
        Self {
            volume: 1.0,
            loop_mode: LoopMode::Once,
        }
    }
}

impl PlayOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn volume(mut self, volume: f32) -> Self {
        self.volume = volume;
        self
    }

    pub fn looping(mut self) -> Self {
        self.loop_mode = LoopMode::Infinite;
        self
    }

    pub fn loop_mode(mut self, loop_mode: LoopMode) -> Self {
        self.loop_mode = loop_mode;
        self
    }
}

/// State of a voice slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlayState {
    #[default]
    Idle,
    Playing,
}

/// How a voice's pass through the buffer ended, if it reached the end of the cue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum VoiceEnd {
    Completed,
    Looped,
}

/// One polyphony slot of a cue.
#[derive(Debug, Default, Clone)]
pub(crate) struct Voice {
    pub(crate) state: PlayState,
    pub(crate) cursor: usize,
    pub(crate) volume: f32,
    pub(crate) loop_mode: LoopMode,
}

impl Voice {
    pub(crate) fn is_playing(&self) -> bool {
        self.state == PlayState::Playing
    }

    /// Claims the slot and rewinds it.
    pub(crate) fn start(&mut self, options: PlayOptions) {
        self.state = PlayState::Playing;
        self.cursor = 0;
        self.volume = options.volume.clamp(0.0, 1.0);
        self.loop_mode = options.loop_mode;
    }

    pub(crate) fn release(&mut self) {
        self.state = PlayState::Idle;
        self.cursor = 0;
    }

    /// Mixes this voice into `buffer` (interleaved, `channels` wide).
    ///
    /// Returns the number of frames written and how the cue end was handled, if
    /// it was reached. A `Once` voice releases itself at the end; an `Infinite`
    /// voice wraps to the start and keeps filling the block.
    pub(crate) fn fill_buffer(
        &mut self,
        data: &CueData,
        buffer: &mut [f32],
        channels: u16,
    ) -> (usize, Option<VoiceEnd>) {
        if !self.is_playing() {
            return (0, None);
        }

        let total_frames = data.total_frames();
        if total_frames == 0 {
            self.release();
            return (0, Some(VoiceEnd::Completed));
        }

        let out_channels = channels as usize;
        let mut end = None;
        let mut frames_filled = 0;

        for out_frame in buffer.chunks_exact_mut(out_channels) {
            if self.cursor >= total_frames {
                match self.loop_mode {
                    LoopMode::Once => {
                        self.release();
                        return (frames_filled, Some(VoiceEnd::Completed));
                    }
                    LoopMode::Infinite => {
                        self.cursor = 0;
                        end = Some(VoiceEnd::Looped);
                    }
                }
            }

            if let Some(frame) = data.frame(self.cursor) {
                mix_frame(frame, out_frame, self.volume);
            }
            self.cursor += 1;
            frames_filled += 1;
        }

        // Finishing exactly on the block boundary completes now, not next block
        if self.cursor >= total_frames && self.loop_mode == LoopMode::Once {
            self.release();
            end = Some(VoiceEnd::Completed);
        }

        (frames_filled, end)
    }
}

/// Adds one source frame into one output frame, mapping channel layouts:
/// mono output averages the source, wider outputs reuse the last source channel.
fn mix_frame(source: &[f32], out: &mut [f32], volume: f32) {
    if out.len() == 1 {
        let sum: f32 = source.iter().sum();
        out[0] += sum / source.len() as f32 * volume;
        return;
    }

    let last = source.len() - 1;
    for (channel, sample) in out.iter_mut().enumerate() {
        *sample += source[channel.min(last)] * volume;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(frames: usize) -> CueData {
        let samples = (0..frames).flat_map(|i| [i as f32, -(i as f32)]).collect();
        CueData::from_interleaved(samples, 8_000, 2).unwrap()
    }

    #[test]
    fn none_handle_is_minus_one() {
        assert_eq!(PlayHandle::NONE.raw(), -1);
        assert!(PlayHandle::NONE.is_none());
        assert!(PlayHandle::from_raw(-7).is_none());
        assert_eq!(PlayHandle::from_raw(-1), PlayHandle::NONE);
        assert_eq!(PlayHandle::from_slot(3).slot(), Some(3));
        assert_eq!(PlayHandle::NONE.slot(), None);
    }

    #[test]
    fn idle_voice_writes_nothing() {
        let mut voice = Voice::default();
        let mut buffer = [0.0f32; 8];
        assert_eq!(voice.fill_buffer(&ramp(4), &mut buffer, 2), (0, None));
        assert!(buffer.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn once_voice_completes_and_releases() {
        let mut voice = Voice::default();
        voice.start(PlayOptions::default());

        let mut buffer = [0.0f32; 12];
        let (frames, end) = voice.fill_buffer(&ramp(3), &mut buffer, 2);

        assert_eq!(frames, 3);
        assert_eq!(end, Some(VoiceEnd::Completed));
        assert!(!voice.is_playing());
        assert_eq!(&buffer[..6], &[0.0, 0.0, 1.0, -1.0, 2.0, -2.0]);
        assert!(buffer[6..].iter().all(|&s| s == 0.0));
    }

    #[test]
    fn once_voice_ending_on_block_boundary_completes_immediately() {
        let mut voice = Voice::default();
        voice.start(PlayOptions::default());
        let mut buffer = [0.0f32; 4];
        let (frames, end) = voice.fill_buffer(&ramp(2), &mut buffer, 2);
        assert_eq!(frames, 2);
        assert_eq!(end, Some(VoiceEnd::Completed));
        assert!(!voice.is_playing());
    }

    #[test]
    fn infinite_voice_wraps() {
        let mut voice = Voice::default();
        voice.start(PlayOptions::new().looping());

        let mut buffer = [0.0f32; 10];
        let (frames, end) = voice.fill_buffer(&ramp(2), &mut buffer, 2);

        assert_eq!(frames, 5);
        assert_eq!(end, Some(VoiceEnd::Looped));
        assert!(voice.is_playing());
        assert_eq!(buffer, [0.0, 0.0, 1.0, -1.0, 0.0, 0.0, 1.0, -1.0, 0.0, 0.0]);
    }

    #[test]
    fn volume_scales_and_mono_output_averages() {
        let mut voice = Voice::default();
        voice.start(PlayOptions::new().volume(0.5));
        let data = CueData::from_interleaved(vec![1.0, 0.0, 0.4, 0.4], 8_000, 2).unwrap();

        let mut buffer = [0.0f32; 2];
        voice.fill_buffer(&data, &mut buffer, 1);
        assert!((buffer[0] - 0.25).abs() < 1e-6);
        assert!((buffer[1] - 0.2).abs() < 1e-6);
    }

    #[test]
    fn volume_is_clamped() {
        let mut voice = Voice::default();
        voice.start(PlayOptions::new().volume(3.0));
        assert_eq!(voice.volume, 1.0);
        voice.start(PlayOptions::new().volume(-1.0));
        assert_eq!(voice.volume, 0.0);
    }
}
