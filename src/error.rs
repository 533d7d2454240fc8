use std::path::PathBuf;

use thiserror::Error;

/// Broad failure classes surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Validation,
    Upstream,
    Decode,
    Resource,
}

#[derive(Debug, Error)]
pub enum SynthesisError {
    #[error("invalid voice id '{voice_id}'")]
    InvalidVoice { voice_id: String },

    #[error("upstream returned status {status} for '{target}': {message}")]
    Status {
        target: String,
        status: u16,
        message: String,
    },

    #[error("upstream returned status 200 with empty audio for '{target}'")]
    EmptyAudio { target: String },

    #[error("request for '{target}' timed out after {seconds}s")]
    Timeout { target: String, seconds: u64 },

    #[error("network error for '{target}'")]
    Network {
        target: String,
        #[source]
        source: reqwest::Error,
    },
}

impl SynthesisError {
    pub fn kind(&self) -> FailureKind {
        match self {
            SynthesisError::InvalidVoice { .. } => FailureKind::Validation,
            _ => FailureKind::Upstream,
        }
    }
}

#[derive(Debug, Error)]
pub enum AudioError {
    #[error("io error")]
    Io(#[from] std::io::Error),

    #[error("decode failed")]
    Decode(#[from] symphonia::core::errors::Error),

    #[error("no decodable audio track")]
    NoTrack,

    #[error("clip decoded to zero samples")]
    Empty,

    #[error("wav error")]
    Wav(#[from] hound::Error),

    #[error("resample failed: {0}")]
    Resample(String),

    #[error("mp3 encode failed: {0}")]
    Encode(String),
}

impl AudioError {
    pub fn kind(&self) -> FailureKind {
        match self {
            AudioError::Io(_) => FailureKind::Resource,
            _ => FailureKind::Decode,
        }
    }
}

#[derive(Debug, Error)]
pub enum AssemblyError {
    #[error("speaker label must not be empty")]
    InvalidLabel,

    #[error("no dialogue found in transcript")]
    NoDialogue,

    #[error("synthesis failed at turn {turn} ({speaker}, voice '{voice_id}')")]
    Synthesis {
        turn: usize,
        speaker: String,
        voice_id: String,
        #[source]
        source: SynthesisError,
    },

    #[error("every dialogue turn was empty; nothing to synthesize")]
    NoSegments,

    #[error("concatenation produced empty result")]
    EmptyConcatenation,

    #[error("create scratch directory")]
    Scratch(#[source] std::io::Error),

    #[error("write scratch segment {path}")]
    ScratchWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("export audio to {path}")]
    Export {
        path: PathBuf,
        #[source]
        source: AudioError,
    },
}

impl AssemblyError {
    pub fn kind(&self) -> FailureKind {
        match self {
            AssemblyError::InvalidLabel | AssemblyError::NoDialogue | AssemblyError::NoSegments => {
                FailureKind::Validation
            }
            AssemblyError::Synthesis { source, .. } => source.kind(),
            AssemblyError::EmptyConcatenation => FailureKind::Decode,
            AssemblyError::Scratch(_)
            | AssemblyError::ScratchWrite { .. }
            | AssemblyError::Export { .. } => FailureKind::Resource,
        }
    }

    /// 1-based number of the turn whose synthesis failed, if any.
    pub fn failed_turn(&self) -> Option<usize> {
        match self {
            AssemblyError::Synthesis { turn, .. } => Some(*turn),
            _ => None,
        }
    }
}
