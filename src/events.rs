//! Event types emitted by the mixer

use crate::cue::CueId;
use crate::playback::PlayHandle;

#[derive(Debug, Clone, PartialEq)]
pub enum CueEvent {
    /// A `LoopMode::Once` instance played to the end; its handle is now free.
    InstanceCompleted { cue: CueId, handle: PlayHandle },
    /// A `LoopMode::Infinite` instance wrapped back to the start.
    InstanceLooped { cue: CueId, handle: PlayHandle },
    /// An instance was stopped by the caller.
    InstanceStopped { cue: CueId, handle: PlayHandle },
    MixerStarted,
    MixerStopped,
    StreamError { error: String },
}

impl CueEvent {
    pub fn cue(&self) -> Option<CueId> {
        match self {
            Self::InstanceCompleted { cue, .. }
            | Self::InstanceLooped { cue, .. }
            | Self::InstanceStopped { cue, .. } => Some(*cue),
            _ => None,
        }
    }

    pub fn handle(&self) -> Option<PlayHandle> {
        match self {
            Self::InstanceCompleted { handle, .. }
            | Self::InstanceLooped { handle, .. }
            | Self::InstanceStopped { handle, .. } => Some(*handle),
            _ => None,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::StreamError { .. })
    }
}
