pub mod cues;
pub mod parser;
pub mod title;

pub use cues::{scan, CueVocabulary, SoundCue};
pub use parser::{parse_dialogue, DialogueTurn, ScriptParser, Speaker};
