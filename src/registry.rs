//! Name-to-cue registry: the game-facing sound API.

use crate::audio_data::{DirectoryLoader, ResourceLoader, decode};
use crate::config::{MixerDesc, SoundRegistryDesc};
use crate::cue::{AudioCue, CueId};
use crate::engine::AudioMixer;
use crate::error::{CueMixError, Result};
use crate::events::CueEvent;
use crate::playback::{PlayHandle, PlayOptions};
use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::path::Path;

/// Maps sound names to loaded cues and forwards playback to one [`AudioMixer`].
///
/// Every operation comes in two flavours. The plain ones (`init`, `load_sound`,
/// `play`, `stop`) never fail: problems are logged and the registry keeps running,
/// with [`PlayHandle::NONE`] standing in for "nothing played". The `try_*` ones
/// return a [`CueMixError`] so callers can tell a missing file from a busy cue.
///
/// Keys default to `String`, but any `Eq + Hash + Display` type works, so a game
/// can use an enum of its sound effects and have typos caught by the compiler.
///
/// Mutating operations take `&mut self`: the registry assumes a single control
/// thread. Rendering happens on the mixer's own thread.
///
/// ```ignore
/// let mut sounds = SoundRegistry::new().with_loader(DirectoryLoader::new("assets"));
/// sounds.init();
/// sounds.load_sound("laser".to_string(), "sounds/laser.wav");
/// let shot = sounds.play("laser");
/// sounds.stop("laser", shot);
/// sounds.destroy();
/// ```
pub struct SoundRegistry<K = String> {
    desc: SoundRegistryDesc,
    mixer: AudioMixer,
    loader: Box<dyn ResourceLoader>,
    sounds: HashMap<K, AudioCue>,
}

impl SoundRegistry {
    /// Registry on the default output device, loading from the working directory.
    pub fn new() -> Self {
        Self::with_mixer(
            AudioMixer::new(MixerDesc::default()),
            SoundRegistryDesc::default(),
        )
    }
}

impl Default for SoundRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl<K> SoundRegistry<K>
where
    K: Eq + Hash + fmt::Display,
{
    /// Registry around an existing mixer. The registry takes ownership and stops
    /// the mixer on teardown.
    pub fn with_mixer(mixer: AudioMixer, desc: SoundRegistryDesc) -> Self {
        Self {
            desc,
            mixer,
            loader: Box::new(DirectoryLoader::default()),
            sounds: HashMap::new(),
        }
    }

    /// Replaces the resource loader used by `load_sound`.
    pub fn with_loader(mut self, loader: impl ResourceLoader + 'static) -> Self {
        self.loader = Box::new(loader);
        self
    }

    /// Starts the mixer. On failure logs the error and continues degraded: later
    /// loads fail until a successful `init`.
    pub fn init(&mut self) {
        if let Err(e) = self.desc.validate() {
            log::error!("Invalid sound registry settings. {}", e);
            return;
        }
        if let Err(e) = self.mixer.start() {
            log::error!("Unable to start audio mixer. {}", e);
        }
    }

    pub fn try_init(&mut self) -> Result<()> {
        self.desc.validate()?;
        self.mixer.start()
    }

    /// Loads `path` through the resource loader and registers it as `name`.
    ///
    /// A previous cue under the same name is closed and replaced. On failure the
    /// error is logged and the registry is left as it was.
    pub fn load_sound(&mut self, name: K, path: &str) {
        if let Err(e) = self.try_load_sound(name, path) {
            log::error!("Unable to load sound {}. {}", path, e);
        }
    }

    pub fn try_load_sound(&mut self, name: K, path: &str) -> Result<()> {
        let label = name.to_string();
        if label.trim().is_empty() {
            return Err(CueMixError::InvalidName(label));
        }

        let bytes = self.loader.load(path)?;
        let extension = Path::new(path).extension().and_then(|e| e.to_str());
        let data = decode(bytes, extension)?;

        let mut cue = AudioCue::stereo(data, self.desc.voices_per_cue)?;
        cue.open(&self.mixer)?;

        if let Some(mut previous) = self.sounds.remove(&name) {
            log::debug!("Replacing sound '{}'", label);
            previous.close();
        }

        log::info!(
            "Loaded sound '{}' from {} ({:.2}s)",
            label,
            path,
            cue.data().duration().as_secs_f64()
        );
        self.sounds.insert(name, cue);
        Ok(())
    }

    /// Plays `name`, returning the new instance or [`PlayHandle::NONE`].
    pub fn play<Q>(&self, name: &Q) -> PlayHandle
    where
        K: Borrow<Q>,
        Q: Hash + Eq + fmt::Display + ?Sized,
    {
        self.play_with(name, PlayOptions::default())
    }

    pub fn play_with<Q>(&self, name: &Q, options: PlayOptions) -> PlayHandle
    where
        K: Borrow<Q>,
        Q: Hash + Eq + fmt::Display + ?Sized,
    {
        match self.try_play_with(name, options) {
            Ok(handle) => handle,
            Err(e @ CueMixError::UnknownSound(_)) => {
                log::error!("{}", e);
                PlayHandle::NONE
            }
            Err(e @ CueMixError::VoicesExhausted { .. }) => {
                log::warn!("Sound '{}' not played: {}", name, e);
                PlayHandle::NONE
            }
            Err(e) => {
                log::error!("Unable to play sound '{}'. {}", name, e);
                PlayHandle::NONE
            }
        }
    }

    pub fn try_play<Q>(&self, name: &Q) -> Result<PlayHandle>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + fmt::Display + ?Sized,
    {
        self.try_play_with(name, PlayOptions::default())
    }

    pub fn try_play_with<Q>(&self, name: &Q, options: PlayOptions) -> Result<PlayHandle>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + fmt::Display + ?Sized,
    {
        self.sounds
            .get(name)
            .ok_or_else(|| CueMixError::UnknownSound(name.to_string()))?
            .play_with(options)
    }

    /// Stops one instance of `name`. Does nothing for [`PlayHandle::NONE`], unknown
    /// names, or instances that already finished.
    pub fn stop<Q>(&self, name: &Q, handle: PlayHandle)
    where
        K: Borrow<Q>,
        Q: Hash + Eq + fmt::Display + ?Sized,
    {
        if handle.is_none() {
            return;
        }
        if let Some(cue) = self.sounds.get(name) {
            if cue.is_active(handle) {
                cue.stop(handle);
            }
        }
    }

    pub fn is_active<Q>(&self, name: &Q, handle: PlayHandle) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + fmt::Display + ?Sized,
    {
        self.sounds
            .get(name)
            .is_some_and(|cue| cue.is_active(handle))
    }

    /// Stops every instance of every sound.
    pub fn stop_all(&self) {
        let stopped: usize = self.sounds.values().map(AudioCue::stop_all).sum();
        log::debug!("Stopped {} instances", stopped);
    }

    /// Removes `name` and closes its cue. Returns whether it was loaded.
    pub fn unload<Q>(&mut self, name: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + fmt::Display + ?Sized,
    {
        match self.sounds.remove(name) {
            Some(mut cue) => {
                cue.close();
                log::debug!("Unloaded sound '{}'", name);
                true
            }
            None => false,
        }
    }

    pub fn contains<Q>(&self, name: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.sounds.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.sounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sounds.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &K> {
        self.sounds.keys()
    }

    /// Looks up which sound an event's cue belongs to.
    pub fn name_of(&self, id: CueId) -> Option<&K> {
        self.sounds
            .iter()
            .find(|(_, cue)| cue.id() == Some(id))
            .map(|(name, _)| name)
    }

    pub fn poll_events(&self) -> Vec<CueEvent> {
        self.mixer.poll_events()
    }

    pub fn mixer(&self) -> &AudioMixer {
        &self.mixer
    }

    /// Closes every cue and stops the mixer. Consumes the registry, so it is the
    /// last call; dropping the registry does the same.
    pub fn destroy(mut self) {
        self.teardown();
    }
}

impl<K> SoundRegistry<K> {
    fn teardown(&mut self) {
        let count = self.sounds.len();
        for (_, mut cue) in self.sounds.drain() {
            cue.close();
        }
        if let Err(e) = self.mixer.stop() {
            log::error!("Unable to stop audio mixer. {}", e);
        }
        if count > 0 {
            log::debug!("Released {} sounds", count);
        }
    }
}

impl<K> Drop for SoundRegistry<K> {
    fn drop(&mut self) {
        self.teardown();
    }
}
