//! Audio cues: loaded sounds with a fixed number of simultaneous voices.

use crate::audio_data::CueData;
use crate::engine::{AudioMixer, MixerShared};
use crate::error::{CueMixError, Result};
use crate::events::CueEvent;
use crate::playback::{PlayHandle, PlayOptions, Voice};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Identifies a cue while it is open on a mixer.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CueId(u64);

impl CueId {
    pub(crate) fn new(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for CueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CueId({})", self.0)
    }
}

/// The part of a cue the render thread reads.
#[derive(Debug)]
pub(crate) struct CueTrack {
    pub(crate) data: CueData,
    pub(crate) voices: Mutex<Vec<Voice>>,
}

impl CueTrack {
    pub(crate) fn new(data: CueData, voices: usize) -> Self {
        Self {
            data,
            voices: Mutex::new(vec![Voice::default(); voices]),
        }
    }

    fn lock_voices(&self) -> MutexGuard<'_, Vec<Voice>> {
        self.voices.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

struct Attachment {
    id: CueId,
    mixer: Arc<MixerShared>,
}

/// A loaded stereo sound that can play up to `voices` instances at once.
///
/// A cue must be [opened](AudioCue::open) on a running [`AudioMixer`] before it can
/// play. Dropping the cue closes it.
///
/// ```ignore
/// let data = CueData::from_bytes(std::fs::read("laser.wav")?, Some("wav"))?;
/// let mut cue = AudioCue::stereo(data, 5)?;
/// cue.open(&mixer)?;
/// let handle = cue.play()?;
/// cue.stop(handle);
/// ```
pub struct AudioCue {
    track: Arc<CueTrack>,
    attachment: Option<Attachment>,
}

impl AudioCue {
    /// Builds a cue over `data` as is.
    pub fn new(data: CueData, voices: usize) -> Result<Self> {
        if voices == 0 {
            return Err(CueMixError::Configuration(
                "A cue needs at least one voice".to_string(),
            ));
        }
        Ok(Self {
            track: Arc::new(CueTrack::new(data, voices)),
            attachment: None,
        })
    }

    /// Builds a two-channel cue, converting mono or multichannel sources.
    pub fn stereo(data: CueData, voices: usize) -> Result<Self> {
        Self::new(data.to_stereo(), voices)
    }

    /// Registers the cue with `mixer`, resampling it to the mixer's rate first.
    ///
    /// An already open cue is closed and re-opened. Fails with
    /// `MixerUnavailable` if the mixer is not running.
    pub fn open(&mut self, mixer: &AudioMixer) -> Result<()> {
        if !mixer.is_running() {
            return Err(CueMixError::MixerUnavailable(
                "mixer is not running".to_string(),
            ));
        }
        self.close();

        if self.track.data.sample_rate() != mixer.sample_rate() {
            log::debug!(
                "Resampling cue {} Hz -> {} Hz",
                self.track.data.sample_rate(),
                mixer.sample_rate()
            );
            let data = self.track.data.resample(mixer.sample_rate())?;
            self.track = Arc::new(CueTrack::new(data, self.voices()));
        }

        let shared = mixer.shared().clone();
        let id = shared.next_cue_id();
        shared
            .tracks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, self.track.clone());

        log::debug!("Opened {} with {} voices", id, self.voices());
        self.attachment = Some(Attachment { id, mixer: shared });
        Ok(())
    }

    /// Unregisters the cue from its mixer and silences all its instances.
    /// Closing a cue that is not open does nothing.
    pub fn close(&mut self) {
        let Some(attachment) = self.attachment.take() else {
            return;
        };

        attachment
            .mixer
            .tracks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&attachment.id);

        for voice in self.track.lock_voices().iter_mut() {
            voice.release();
        }
        log::debug!("Closed {}", attachment.id);
    }

    pub fn is_open(&self) -> bool {
        self.attachment.is_some()
    }

    /// Mixer-assigned id, while open.
    pub fn id(&self) -> Option<CueId> {
        self.attachment.as_ref().map(|a| a.id)
    }

    pub fn data(&self) -> &CueData {
        &self.track.data
    }

    /// Size of the polyphony budget.
    pub fn voices(&self) -> usize {
        self.track.lock_voices().len()
    }

    pub fn active_voices(&self) -> usize {
        self.track
            .lock_voices()
            .iter()
            .filter(|v| v.is_playing())
            .count()
    }

    /// Starts a new instance with default options.
    pub fn play(&self) -> Result<PlayHandle> {
        self.play_with(PlayOptions::default())
    }

    /// Starts a new instance in the first free voice.
    ///
    /// # Errors
    ///
    /// `CueNotOpen` before [`open`](AudioCue::open), `MixerUnavailable` once the
    /// mixer has stopped, `VoicesExhausted` when every voice is playing.
    pub fn play_with(&self, options: PlayOptions) -> Result<PlayHandle> {
        let attachment = self.attachment.as_ref().ok_or(CueMixError::CueNotOpen)?;
        if !attachment.mixer.is_running() {
            return Err(CueMixError::MixerUnavailable(
                "mixer has been stopped".to_string(),
            ));
        }

        let mut voices = self.track.lock_voices();
        let total = voices.len();
        let (slot, voice) = voices
            .iter_mut()
            .enumerate()
            .find(|(_, v)| !v.is_playing())
            .ok_or(CueMixError::VoicesExhausted { voices: total })?;

        voice.start(options);
        log::trace!("{} voice {} started", attachment.id, slot);
        Ok(PlayHandle::from_slot(slot))
    }

    /// Whether `handle` currently refers to a sounding instance.
    pub fn is_active(&self, handle: PlayHandle) -> bool {
        let Some(slot) = handle.slot() else {
            return false;
        };
        self.track
            .lock_voices()
            .get(slot)
            .is_some_and(|v| v.is_playing())
    }

    /// Stops the instance behind `handle`. Returns `false` (and does nothing)
    /// if the handle is not active.
    pub fn stop(&self, handle: PlayHandle) -> bool {
        let Some(slot) = handle.slot() else {
            return false;
        };

        let stopped = match self.track.lock_voices().get_mut(slot) {
            Some(voice) if voice.is_playing() => {
                voice.release();
                true
            }
            _ => false,
        };

        if stopped {
            if let Some(attachment) = &self.attachment {
                attachment.mixer.emit(CueEvent::InstanceStopped {
                    cue: attachment.id,
                    handle,
                });
            }
        }
        stopped
    }

    /// Stops every instance of this cue, returning how many were playing.
    pub fn stop_all(&self) -> usize {
        let mut count = 0;
        for slot in 0..self.voices() {
            if self.stop(PlayHandle::from_slot(slot)) {
                count += 1;
            }
        }
        count
    }
}

impl fmt::Debug for AudioCue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AudioCue")
            .field("id", &self.id())
            .field("voices", &self.voices())
            .field("frames", &self.track.data.total_frames())
            .finish()
    }
}

impl Drop for AudioCue {
    fn drop(&mut self) {
        self.close();
    }
}
