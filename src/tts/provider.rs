use crate::error::SynthesisError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeechOutcome {
    Audio(Vec<u8>),
    /// The text was empty after trimming; nothing was requested.
    Skipped,
}

/// One-shot text-to-speech for a single dialogue turn.
pub trait SpeechBackend: Send + Sync {
    fn name(&self) -> &str;
    fn synthesize(&self, text: &str, voice_id: &str) -> Result<SpeechOutcome, SynthesisError>;
}

/// One-shot sound effect generation from a textual description.
pub trait EffectBackend: Send + Sync {
    fn generate(&self, description: &str) -> Result<Vec<u8>, SynthesisError>;
}
