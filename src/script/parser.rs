use regex::{Regex, RegexBuilder};
use serde::Serialize;

use crate::error::AssemblyError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    First,
    Second,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DialogueTurn {
    pub speaker: Speaker,
    pub text: String,
}

impl DialogueTurn {
    pub fn new(speaker: Speaker, text: impl Into<String>) -> Self {
        Self {
            speaker,
            text: text.into(),
        }
    }
}

/// Splits a transcript into speaker turns for two known labels.
///
/// A line belongs to a speaker when it starts with `<label>:` (case-insensitive,
/// any whitespace before the colon). Unlabelled lines continue the open turn, or
/// are dropped when no turn is open yet (title lines, stray formatting).
#[derive(Debug, Clone)]
pub struct ScriptParser {
    first: Regex,
    second: Regex,
}

impl ScriptParser {
    pub fn new(first_label: &str, second_label: &str) -> Result<Self, AssemblyError> {
        Ok(Self {
            first: label_pattern(first_label)?,
            second: label_pattern(second_label)?,
        })
    }

    pub fn parse(&self, transcript: &str) -> Vec<DialogueTurn> {
        let mut turns = Vec::new();
        let mut open: Option<DialogueTurn> = None;

        for line in transcript.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            match self.attribute(line) {
                Some((speaker, rest)) => {
                    let rest = rest.trim();
                    match open.as_mut() {
                        Some(turn) if turn.speaker == speaker => append_text(&mut turn.text, rest),
                        _ => {
                            flush(&mut turns, open.take());
                            open = Some(DialogueTurn::new(speaker, rest));
                        }
                    }
                }
                None => {
                    if let Some(turn) = open.as_mut() {
                        append_text(&mut turn.text, line);
                    }
                }
            }
        }

        flush(&mut turns, open);
        tracing::debug!(turns = turns.len(), "extracted dialogue turns");
        turns
    }

    fn attribute<'a>(&self, line: &'a str) -> Option<(Speaker, &'a str)> {
        if let Some(m) = self.first.find(line) {
            return Some((Speaker::First, &line[m.end()..]));
        }
        self.second
            .find(line)
            .map(|m| (Speaker::Second, &line[m.end()..]))
    }
}

/// Convenience wrapper for one-off parsing.
pub fn parse_dialogue(
    transcript: &str,
    first_label: &str,
    second_label: &str,
) -> Result<Vec<DialogueTurn>, AssemblyError> {
    Ok(ScriptParser::new(first_label, second_label)?.parse(transcript))
}

fn label_pattern(label: &str) -> Result<Regex, AssemblyError> {
    let label = label.trim();
    if label.is_empty() {
        return Err(AssemblyError::InvalidLabel);
    }
    RegexBuilder::new(&format!(r"^\s*{}\s*:", regex::escape(label)))
        .case_insensitive(true)
        .build()
        .map_err(|_| AssemblyError::InvalidLabel)
}

fn append_text(text: &mut String, addition: &str) {
    if addition.is_empty() {
        return;
    }
    if !text.is_empty() {
        text.push(' ');
    }
    text.push_str(addition);
}

fn flush(turns: &mut Vec<DialogueTurn>, turn: Option<DialogueTurn>) {
    if let Some(turn) = turn {
        if !turn.text.trim().is_empty() {
            turns.push(turn);
        }
    }
}
