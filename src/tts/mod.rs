pub mod elevenlabs;
pub mod provider;

pub use elevenlabs::{ElevenLabsEffects, ElevenLabsVoice, VoiceInfo};
pub use provider::{EffectBackend, SpeechBackend, SpeechOutcome};
