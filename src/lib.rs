//! # cuemix
//!
//! Named sound effects for small games: load a cue once, fire it by name, stop it
//! by handle.
//!
//! ## Quick Start
//!
//! ```no_run
//! use cuemix::*;
//!
//! let mut sounds = SoundRegistry::new().with_loader(DirectoryLoader::new("assets"));
//! sounds.init();
//! sounds.load_sound("laser".to_string(), "sounds/laser.wav");
//!
//! let shot = sounds.play("laser");
//! if shot != PlayHandle::NONE {
//!     sounds.stop("laser", shot);
//! }
//!
//! sounds.destroy();
//! ```
//!
//! ## Key Components
//!
//! - **[`SoundRegistry`]**: name-to-cue map; the API the game talks to
//! - **[`AudioCue`]**: one loaded sound with a fixed number of voices
//! - **[`AudioMixer`]**: owns the output device and renders every open cue
//! - **[`ResourceLoader`](audio_data::ResourceLoader)**: turns logical paths into audio bytes
//! - **[`CueEvent`]**: completion/loop/stop notifications from the mixer
//!
//! ## Threading
//!
//! The registry, cues and mixer live on one control thread. The device callback
//! thread only reads the set of open cues and advances their voices, and never
//! waits on the control thread: contended cues are skipped for one block.

pub mod audio_data;
pub mod config;
pub mod cue;
pub mod engine;
pub mod error;
pub mod events;
pub(crate) mod mixer;
pub mod playback;
pub mod registry;

#[cfg(test)]
mod test_support;

pub use audio_data::{CueData, DirectoryLoader, EmbeddedLoader, ResourceLoader};
pub use config::{MixerDesc, OutputBackend, SoundRegistryDesc};
pub use cue::{AudioCue, CueId};
pub use engine::AudioMixer;
pub use error::CueMixError;
pub use events::CueEvent;
pub use playback::{LoopMode, PlayHandle, PlayOptions, PlayState};
pub use registry::SoundRegistry;
