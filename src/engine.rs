//! The output mixer: device stream or headless pull, and the event queue.

use crate::config::{MixerDesc, OutputBackend};
use crate::cue::{CueId, CueTrack};
use crate::error::{CueMixError, Result};
use crate::events::CueEvent;
use crate::mixer::mix_tracks;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, SizedSample};
use crossbeam_channel::{Receiver, Sender, TrySendError, bounded};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Events beyond this many unpolled ones are dropped.
const EVENT_CAPACITY: usize = 1024;

/// State shared between the control thread and the render thread.
pub(crate) struct MixerShared {
    pub(crate) tracks: Mutex<HashMap<CueId, Arc<CueTrack>>>,
    is_running: AtomicBool,
    frames_processed: AtomicUsize,
    next_cue_id: AtomicU64,
    event_sender: Sender<CueEvent>,
}

impl MixerShared {
    pub(crate) fn is_running(&self) -> bool {
        self.is_running.load(Ordering::Acquire)
    }

    pub(crate) fn next_cue_id(&self) -> CueId {
        CueId::new(self.next_cue_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Never blocks; a full queue drops the event.
    pub(crate) fn emit(&self, event: CueEvent) {
        match self.event_sender.try_send(event) {
            Ok(()) | Err(TrySendError::Disconnected(_)) => {}
            Err(TrySendError::Full(event)) => {
                log::trace!("Event queue full, dropping {:?}", event);
            }
        }
    }

    /// Renders one interleaved block. Silence while stopped.
    pub(crate) fn render(&self, buffer: &mut [f32], channels: u16) -> usize {
        buffer.fill(0.0);
        if !self.is_running() {
            return 0;
        }

        let result = mix_tracks(buffer, channels, &self.tracks);
        log::trace!("Mixed {} frames", result.frames_filled);

        for sample in buffer.iter_mut() {
            *sample = sample.clamp(-1.0, 1.0);
        }

        for (cue, handle) in result.completed {
            self.emit(CueEvent::InstanceCompleted { cue, handle });
        }
        for (cue, handle) in result.looped {
            self.emit(CueEvent::InstanceLooped { cue, handle });
        }

        let frames = buffer.len() / channels as usize;
        self.frames_processed.fetch_add(frames, Ordering::Relaxed);
        frames
    }
}

/// The audio output: owns the device stream and the set of open cues.
///
/// One mixer is meant to exist per output device; hand it to a
/// [`SoundRegistry`](crate::SoundRegistry) instead of keeping a global.
/// With [`OutputBackend::Device`] rendering happens on cpal's callback thread;
/// with [`OutputBackend::Headless`] the caller pulls blocks through [`AudioMixer::render`].
pub struct AudioMixer {
    desc: MixerDesc,
    shared: Arc<MixerShared>,
    event_receiver: Receiver<CueEvent>,
    stream: Option<cpal::Stream>,
}

impl AudioMixer {
    pub fn new(desc: MixerDesc) -> Self {
        let (event_sender, event_receiver) = bounded(EVENT_CAPACITY);
        Self {
            desc,
            shared: Arc::new(MixerShared {
                tracks: Mutex::new(HashMap::new()),
                is_running: AtomicBool::new(false),
                frames_processed: AtomicUsize::new(0),
                next_cue_id: AtomicU64::new(0),
                event_sender,
            }),
            event_receiver,
            stream: None,
        }
    }

    /// Headless mixer with default settings.
    pub fn headless() -> Self {
        Self::new(MixerDesc::headless())
    }

    /// Starts audio output. Calling it on a running mixer does nothing.
    pub fn start(&mut self) -> Result<()> {
        if self.is_running() {
            return Ok(());
        }
        self.desc.validate()?;

        if self.desc.backend == OutputBackend::Device {
            let stream = self.build_device_stream()?;
            stream.play().map_err(|e| {
                CueMixError::AudioDevice(format!("Failed to start stream: {}", e))
            })?;
            self.stream = Some(stream);
        }

        self.shared.is_running.store(true, Ordering::Release);
        self.shared.emit(CueEvent::MixerStarted);
        log::info!(
            "Mixer started ({:?}, {} Hz, {} ch)",
            self.desc.backend,
            self.desc.sample_rate,
            self.desc.channels
        );
        Ok(())
    }

    /// Stops audio output. Open cues stay registered but can no longer play.
    pub fn stop(&mut self) -> Result<()> {
        if !self.is_running() {
            return Ok(());
        }
        self.shared.is_running.store(false, Ordering::Release);
        if let Some(stream) = self.stream.take() {
            drop(stream);
        }
        self.shared.emit(CueEvent::MixerStopped);
        log::info!("Mixer stopped");
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.shared.is_running()
    }

    /// Frames rendered since creation.
    pub fn frames_processed(&self) -> usize {
        self.shared.frames_processed.load(Ordering::Relaxed)
    }

    pub fn desc(&self) -> &MixerDesc {
        &self.desc
    }

    pub fn sample_rate(&self) -> u32 {
        self.desc.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.desc.channels
    }

    /// Number of cues currently open on this mixer.
    pub fn open_cues(&self) -> usize {
        self.shared
            .tracks
            .lock()
            .map(|tracks| tracks.len())
            .unwrap_or_else(|poisoned| poisoned.into_inner().len())
    }

    /// Pulls one block of interleaved output from a headless mixer.
    ///
    /// Returns the number of frames rendered: 0 when the mixer is stopped or
    /// is driven by a device.
    pub fn render(&self, buffer: &mut [f32]) -> usize {
        if self.desc.backend == OutputBackend::Device {
            log::warn!("render() called on a device-backed mixer; ignoring");
            buffer.fill(0.0);
            return 0;
        }
        self.shared.render(buffer, self.desc.channels)
    }

    /// Drains pending events.
    pub fn poll_events(&self) -> Vec<CueEvent> {
        self.event_receiver.try_iter().collect()
    }

    pub(crate) fn shared(&self) -> &Arc<MixerShared> {
        &self.shared
    }

    fn build_device_stream(&self) -> Result<cpal::Stream> {
        let host = cpal::default_host();
        let device = host.default_output_device().ok_or_else(|| {
            CueMixError::AudioDevice("No default output device available".into())
        })?;

        let config = cpal::StreamConfig {
            channels: self.desc.channels,
            sample_rate: cpal::SampleRate(self.desc.sample_rate),
            buffer_size: cpal::BufferSize::Fixed(self.desc.block_size as u32),
        };

        let default_config = device.default_output_config().map_err(|e| {
            CueMixError::AudioDevice(format!("Failed to get default config: {}", e))
        })?;

        log::debug!(
            "Opening output device {:?} as {:?}",
            device.name().unwrap_or_else(|_| "<unknown>".to_string()),
            default_config.sample_format()
        );

        match default_config.sample_format() {
            cpal::SampleFormat::F32 => self.create_stream::<f32>(&device, &config),
            cpal::SampleFormat::I16 => self.create_stream::<i16>(&device, &config),
            cpal::SampleFormat::U16 => self.create_stream::<u16>(&device, &config),
            format => Err(CueMixError::AudioDevice(format!(
                "Unsupported sample format {:?}",
                format
            ))),
        }
    }

    fn create_stream<T>(
        &self,
        device: &cpal::Device,
        config: &cpal::StreamConfig,
    ) -> Result<cpal::Stream>
    where
        T: SizedSample + FromSample<f32>,
    {
        let shared = self.shared.clone();
        let error_shared = self.shared.clone();
        let channels = self.desc.channels;
        let mut scratch: Vec<f32> = Vec::with_capacity(self.desc.block_size * channels as usize);

        device
            .build_output_stream(
                config,
                move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                    scratch.resize(data.len(), 0.0);
                    shared.render(&mut scratch, channels);
                    for (out, &sample) in data.iter_mut().zip(scratch.iter()) {
                        *out = T::from_sample(sample);
                    }
                },
                move |err| {
                    log::error!("Audio stream error: {}", err);
                    error_shared.emit(CueEvent::StreamError {
                        error: err.to_string(),
                    });
                },
                None,
            )
            .map_err(|e| CueMixError::AudioDevice(format!("Failed to build stream: {}", e)))
    }
}

impl Drop for AudioMixer {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}
