// Mixer module - sums the playing voices of every open cue into one block

use crate::cue::{CueId, CueTrack};
use crate::playback::{PlayHandle, VoiceEnd};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Result of mixing one block
#[derive(Debug, Default)]
pub(crate) struct MixResult {
    /// Longest run of frames any voice wrote
    pub frames_filled: usize,
    /// `LoopMode::Once` instances that finished; their voices are already free
    pub completed: Vec<(CueId, PlayHandle)>,
    /// `LoopMode::Infinite` instances that wrapped around
    pub looped: Vec<(CueId, PlayHandle)>,
}

/// Mix all playing voices into `buffer`, which is interleaved with `channels` channels.
///
/// Runs on the render thread, so nothing here waits on the control thread: if the
/// track table or a cue's voices are locked, that part is skipped for this block.
pub(crate) fn mix_tracks(
    buffer: &mut [f32],
    channels: u16,
    tracks: &Mutex<HashMap<CueId, Arc<CueTrack>>>,
) -> MixResult {
    let mut result = MixResult::default();

    let Ok(tracks) = tracks.try_lock() else {
        log::trace!("Mixer: track table busy, skipping block");
        return result;
    };

    for (cue_id, track) in tracks.iter() {
        let Ok(mut voices) = track.voices.try_lock() else {
            log::trace!("Mixer: voices of {} busy, skipping", cue_id);
            continue;
        };

        for (slot, voice) in voices.iter_mut().enumerate() {
            let (frames, end) = voice.fill_buffer(&track.data, buffer, channels);
            result.frames_filled = result.frames_filled.max(frames);

            match end {
                Some(VoiceEnd::Completed) => {
                    log::debug!("Mixer: {} voice {} completed", cue_id, slot);
                    result.completed.push((*cue_id, PlayHandle::from_slot(slot)));
                }
                Some(VoiceEnd::Looped) => {
                    result.looped.push((*cue_id, PlayHandle::from_slot(slot)));
                }
                None => {}
            }
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio_data::CueData;
    use crate::playback::{PlayOptions, Voice};

    fn track(value: f32, frames: usize, voices: usize) -> Arc<CueTrack> {
        let data = CueData::from_interleaved(vec![value; frames * 2], 48_000, 2).unwrap();
        Arc::new(CueTrack::new(data, voices))
    }

    fn start_voice(track: &CueTrack, slot: usize, options: PlayOptions) {
        let mut voices = track.voices.lock().unwrap();
        voices[slot].start(options);
    }

    #[test]
    fn sums_voices_across_cues() {
        let a = track(0.25, 16, 2);
        let b = track(0.125, 16, 1);
        start_voice(&a, 0, PlayOptions::default());
        start_voice(&a, 1, PlayOptions::default());
        start_voice(&b, 0, PlayOptions::default());

        let tracks = Mutex::new(HashMap::from([
            (CueId::new(0), a.clone()),
            (CueId::new(1), b.clone()),
        ]));

        let mut buffer = vec![0.0f32; 8 * 2];
        let result = mix_tracks(&mut buffer, 2, &tracks);

        assert_eq!(result.frames_filled, 8);
        assert!(result.completed.is_empty());
        assert!(buffer.iter().all(|&s| (s - 0.625).abs() < 1e-6));
    }

    #[test]
    fn reports_completed_voices() {
        let cue = track(0.5, 4, 3);
        start_voice(&cue, 2, PlayOptions::default());
        let tracks = Mutex::new(HashMap::from([(CueId::new(7), cue.clone())]));

        let mut buffer = vec![0.0f32; 8 * 2];
        let result = mix_tracks(&mut buffer, 2, &tracks);

        assert_eq!(result.frames_filled, 4);
        assert_eq!(
            result.completed,
            vec![(CueId::new(7), PlayHandle::from_slot(2))]
        );
        assert!(!cue.voices.lock().unwrap()[2].is_playing());
        assert!(buffer[8..].iter().all(|&s| s == 0.0));
    }

    #[test]
    fn reports_looped_voices() {
        let cue = track(0.5, 4, 1);
        start_voice(&cue, 0, PlayOptions::new().looping());
        let tracks = Mutex::new(HashMap::from([(CueId::new(1), cue.clone())]));

        let mut buffer = vec![0.0f32; 6 * 2];
        let result = mix_tracks(&mut buffer, 2, &tracks);

        assert_eq!(result.looped, vec![(CueId::new(1), PlayHandle::from_slot(0))]);
        assert!(cue.voices.lock().unwrap()[0].is_playing());
        assert!(buffer.iter().all(|&s| s == 0.5));
    }

    #[test]
    fn contended_voices_are_skipped() {
        let cue = track(0.5, 4, 1);
        start_voice(&cue, 0, PlayOptions::default());
        let tracks = Mutex::new(HashMap::from([(CueId::new(0), cue.clone())]));

        let _held: std::sync::MutexGuard<'_, Vec<Voice>> = cue.voices.lock().unwrap();
        let mut buffer = vec![0.0f32; 4 * 2];
        let result = mix_tracks(&mut buffer, 2, &tracks);

        assert_eq!(result.frames_filled, 0);
        assert!(buffer.iter().all(|&s| s == 0.0));
    }
}
