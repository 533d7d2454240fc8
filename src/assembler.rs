use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tempfile::TempDir;

use crate::audio::format::Container;
use crate::audio::{decode_file, export, ExportFormat, Track};
use crate::error::AssemblyError;
use crate::script::{scan, CueVocabulary, DialogueTurn, ScriptParser, Speaker};
use crate::sfx::EffectLibrary;
use crate::tts::{SpeechBackend, SpeechOutcome};

/// A speaker label as written in the transcript and the voice that reads it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Host {
    pub label: String,
    pub voice_id: String,
}

impl Host {
    pub fn new(label: impl Into<String>, voice_id: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            voice_id: voice_id.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AssemblySettings {
    /// Gap inserted between consecutive turns.
    pub silence: Duration,
    /// Effect offset per transcript line. This is a coarse linear estimate,
    /// not an alignment; it drifts whenever line lengths vary.
    pub seconds_per_line: f64,
    pub concurrency: usize,
    pub mp3_bitrate_kbps: u32,
    /// Where per-episode scratch directories are created; system temp if unset.
    pub scratch_root: Option<PathBuf>,
}

impl Default for AssemblySettings {
    fn default() -> Self {
        Self {
            silence: Duration::from_millis(250),
            seconds_per_line: 2.0,
            concurrency: 1,
            mp3_bitrate_kbps: 192,
            scratch_root: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssembledEpisode {
    pub path: PathBuf,
    pub turns: usize,
    pub segments: usize,
    pub cues_applied: usize,
    pub duration: Duration,
}

pub struct AudioAssembler {
    voice: Box<dyn SpeechBackend>,
    effects: Option<EffectLibrary>,
    vocabulary: CueVocabulary,
    settings: AssemblySettings,
}

impl AudioAssembler {
    pub fn new(voice: Box<dyn SpeechBackend>, settings: AssemblySettings) -> Self {
        Self {
            voice,
            effects: None,
            vocabulary: CueVocabulary::standard(),
            settings,
        }
    }

    pub fn with_effects(mut self, effects: EffectLibrary) -> Self {
        self.effects = Some(effects);
        self
    }

    pub fn with_vocabulary(mut self, vocabulary: CueVocabulary) -> Self {
        self.vocabulary = vocabulary;
        self
    }

    pub fn settings(&self) -> &AssemblySettings {
        &self.settings
    }

    /// Parses, synthesizes every turn, splices the clips and overlays cue
    /// effects, writing the result to `output`. Any voice failure aborts the
    /// whole episode; nothing is written to `output` in that case.
    pub fn assemble(
        &self,
        transcript: &str,
        first: &Host,
        second: &Host,
        output: &Path,
    ) -> Result<AssembledEpisode, AssemblyError> {
        let turns = ScriptParser::new(&first.label, &second.label)?.parse(transcript);
        if turns.is_empty() {
            return Err(AssemblyError::NoDialogue);
        }

        tracing::info!(
            turns = turns.len(),
            backend = self.voice.name(),
            first = %first.label,
            second = %second.label,
            "assembling episode"
        );

        let scratch = self.scratch_dir()?;
        let segments = match self.synthesize_turns(&turns, first, second, scratch.path()) {
            Ok(segments) => segments,
            Err(err) => {
                release_scratch(scratch);
                return Err(err);
            }
        };

        if segments.is_empty() {
            release_scratch(scratch);
            return Err(AssemblyError::NoSegments);
        }

        tracing::info!(segments = segments.len(), "concatenating segments");
        let spliced = self.concatenate(&segments);
        release_scratch(scratch);
        let (mut track, used) = spliced?;

        let cues_applied = self.apply_effects(transcript, &mut track);

        let format = ExportFormat::for_path(output, self.settings.mp3_bitrate_kbps);
        export(&track, output, format).map_err(|source| AssemblyError::Export {
            path: output.to_path_buf(),
            source,
        })?;

        let duration = track.duration();
        tracing::info!(
            path = %output.display(),
            seconds = duration.as_secs_f64(),
            cues_applied,
            "episode written"
        );

        Ok(AssembledEpisode {
            path: output.to_path_buf(),
            turns: turns.len(),
            segments: used,
            cues_applied,
            duration,
        })
    }

    fn scratch_dir(&self) -> Result<TempDir, AssemblyError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("podcast-segments-");
        let dir = match &self.settings.scratch_root {
            Some(root) => builder.tempdir_in(root),
            None => builder.tempdir(),
        }
        .map_err(AssemblyError::Scratch)?;
        tracing::debug!(path = %dir.path().display(), "created scratch directory");
        Ok(dir)
    }

    fn synthesize_turns(
        &self,
        turns: &[DialogueTurn],
        first: &Host,
        second: &Host,
        dir: &Path,
    ) -> Result<Vec<PathBuf>, AssemblyError> {
        if self.settings.concurrency > 1 && turns.len() > 1 {
            match rayon::ThreadPoolBuilder::new()
                .num_threads(self.settings.concurrency)
                .build()
            {
                Ok(pool) => {
                    let failed = AtomicBool::new(false);
                    let results: Vec<_> = pool.install(|| {
                        turns
                            .par_iter()
                            .enumerate()
                            .map(|(index, turn)| {
                                // Turns not yet started are dropped once any turn fails.
                                if failed.load(Ordering::Relaxed) {
                                    return Ok(None);
                                }
                                let result =
                                    self.synthesize_turn(index, turns.len(), turn, first, second, dir);
                                if result.is_err() {
                                    failed.store(true, Ordering::Relaxed);
                                }
                                result
                            })
                            .collect()
                    });
                    // Results are in turn order, so the first error is the earliest failed turn.
                    return results.into_iter().filter_map(Result::transpose).collect();
                }
                Err(err) => {
                    tracing::warn!(error = %err, "could not build synthesis pool; running sequentially");
                }
            }
        }

        let mut segments = Vec::with_capacity(turns.len());
        for (index, turn) in turns.iter().enumerate() {
            if let Some(path) = self.synthesize_turn(index, turns.len(), turn, first, second, dir)? {
                segments.push(path);
            }
        }
        Ok(segments)
    }

    fn synthesize_turn(
        &self,
        index: usize,
        total: usize,
        turn: &DialogueTurn,
        first: &Host,
        second: &Host,
        dir: &Path,
    ) -> Result<Option<PathBuf>, AssemblyError> {
        let number = index + 1;
        let host = match turn.speaker {
            Speaker::First => first,
            Speaker::Second => second,
        };

        tracing::info!(
            turn = number,
            total,
            speaker = %host.label,
            voice_id = %host.voice_id,
            "synthesizing turn"
        );

        match self.voice.synthesize(&turn.text, &host.voice_id) {
            Ok(SpeechOutcome::Skipped) => {
                tracing::debug!(turn = number, "turn skipped: empty text");
                Ok(None)
            }
            Ok(SpeechOutcome::Audio(bytes)) => {
                let ext = Container::sniff(&bytes).extension();
                let path = dir.join(format!("segment_{number:04}.{ext}"));
                fs::write(&path, &bytes).map_err(|source| AssemblyError::ScratchWrite {
                    path: path.clone(),
                    source,
                })?;
                Ok(Some(path))
            }
            Err(source) => {
                tracing::error!(turn = number, error = %source, "synthesis failed; aborting episode");
                Err(AssemblyError::Synthesis {
                    turn: number,
                    speaker: host.label.clone(),
                    voice_id: host.voice_id.clone(),
                    source,
                })
            }
        }
    }

    /// Splices segments in order. Undecodable segments are skipped; the gap
    /// is only placed between segments that made it in.
    fn concatenate(&self, segments: &[PathBuf]) -> Result<(Track, usize), AssemblyError> {
        let mut track = Track::new();
        let mut used = 0;

        for path in segments {
            let clip = match decode_file(path) {
                Ok(clip) => clip,
                Err(err) => {
                    tracing::warn!(path = %path.display(), error = %err, "skipping undecodable segment");
                    continue;
                }
            };

            let gap = if used == 0 {
                Duration::ZERO
            } else {
                self.settings.silence
            };
            if let Err(err) = track.append_with_gap(&clip, gap) {
                tracing::warn!(path = %path.display(), error = %err, "skipping segment");
                continue;
            }
            used += 1;
        }

        if track.is_empty() {
            return Err(AssemblyError::EmptyConcatenation);
        }
        Ok((track, used))
    }

    fn apply_effects(&self, transcript: &str, track: &mut Track) -> usize {
        let effects = match &self.effects {
            Some(effects) => effects,
            None => return 0,
        };

        let cues = scan(transcript, &self.vocabulary);
        if cues.is_empty() {
            return 0;
        }
        tracing::info!(count = cues.len(), "applying sound effects");

        let per_line = self.settings.seconds_per_line.max(0.0);
        let mut applied = 0;
        for cue in &cues {
            let offset = match Duration::try_from_secs_f64(cue.line_index as f64 * per_line) {
                Ok(offset) => offset,
                Err(err) => {
                    tracing::warn!(cue = %cue.cue_token, line = cue.line_index, error = %err, "cue offset out of range");
                    continue;
                }
            };
            if offset >= track.duration() {
                tracing::debug!(
                    cue = %cue.cue_token,
                    offset_secs = offset.as_secs_f64(),
                    "cue falls past the end of the episode"
                );
                continue;
            }

            let path = match effects.synthesize_effect(&cue.effect_description) {
                Some(path) => path,
                None => continue,
            };

            let clip = match decode_file(&path) {
                Ok(clip) => clip,
                Err(err) => {
                    tracing::warn!(cue = %cue.cue_token, error = %err, "skipping undecodable effect");
                    continue;
                }
            };

            match track.overlay(&clip, offset) {
                Ok(true) => applied += 1,
                Ok(false) => tracing::debug!(
                    cue = %cue.cue_token,
                    offset_secs = offset.as_secs_f64(),
                    "cue falls past the end of the episode"
                ),
                Err(err) => tracing::warn!(cue = %cue.cue_token, error = %err, "effect overlay failed"),
            }
        }
        applied
    }
}

fn release_scratch(dir: TempDir) {
    let path = dir.path().to_path_buf();
    if let Err(err) = dir.close() {
        tracing::warn!(path = %path.display(), error = %err, "could not remove scratch directory");
    }
}
