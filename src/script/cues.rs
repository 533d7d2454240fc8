use std::collections::HashMap;

use serde::Serialize;

const STANDARD_CUES: &[(&str, &str)] = &[
    ("door slam", "door slamming"),
    ("applause", "audience applause"),
    ("laugh", "audience laughter"),
    ("drum roll", "drum roll"),
    ("suspense", "suspenseful music"),
    ("fight", "fight scene sound effects"),
    ("exit", "door closing and footsteps"),
    ("mic drop", "mic drop sound effect"),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SoundCue {
    pub line_index: usize,
    pub cue_token: String,
    pub effect_description: String,
}

/// Closed mapping from bracketed cue tokens to effect descriptions.
#[derive(Debug, Clone)]
pub struct CueVocabulary {
    entries: HashMap<String, String>,
}

impl CueVocabulary {
    pub fn standard() -> Self {
        Self::from_pairs(STANDARD_CUES.iter().copied())
    }

    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let entries = pairs
            .into_iter()
            .map(|(token, description)| (token.trim().to_lowercase(), description.to_string()))
            .collect();
        Self { entries }
    }

    pub fn describe(&self, token: &str) -> Option<&str> {
        self.entries.get(token).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for CueVocabulary {
    fn default() -> Self {
        Self::standard()
    }
}

/// Finds known cues, at most one per line (the first bracket pair only).
/// `line_index` is the 0-based index into the newline-split transcript.
pub fn scan(transcript: &str, vocabulary: &CueVocabulary) -> Vec<SoundCue> {
    transcript
        .split('\n')
        .enumerate()
        .filter_map(|(line_index, line)| {
            let token = first_bracket_token(line)?;
            let description = vocabulary.describe(&token)?;
            Some(SoundCue {
                line_index,
                effect_description: description.to_string(),
                cue_token: token,
            })
        })
        .collect()
}

fn first_bracket_token(line: &str) -> Option<String> {
    let start = line.find('[')?;
    let len = line[start + 1..].find(']')?;
    Some(line[start + 1..start + 1 + len].trim().to_lowercase())
}
