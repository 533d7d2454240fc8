mod common;

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use common::{wav_samples, FakeEffects, FakeVoice, RATE};
use podcast_forge::audio::cache::EffectCache;
use podcast_forge::error::{AssemblyError, FailureKind, SynthesisError};
use podcast_forge::sfx::EffectLibrary;
use podcast_forge::tts::{SpeechBackend, SpeechOutcome};
use podcast_forge::{AssemblySettings, AudioAssembler, Host};

const WORD: usize = 4000;
const GAP: usize = 4000;

struct Workspace {
    _root: tempfile::TempDir,
    scratch: PathBuf,
    output: PathBuf,
    cache: PathBuf,
}

impl Workspace {
    fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        let scratch = root.path().join("scratch");
        std::fs::create_dir(&scratch).unwrap();
        Self {
            output: root.path().join("out").join("episode.wav"),
            cache: root.path().join("sfx"),
            scratch,
            _root: root,
        }
    }

    fn settings(&self, concurrency: usize) -> AssemblySettings {
        AssemblySettings {
            silence: Duration::from_millis(250),
            seconds_per_line: 2.0,
            concurrency,
            mp3_bitrate_kbps: 192,
            scratch_root: Some(self.scratch.clone()),
        }
    }

    fn scratch_entries(&self) -> usize {
        std::fs::read_dir(&self.scratch).unwrap().count()
    }

    fn effects(&self, backend: &FakeEffects) -> EffectLibrary {
        EffectLibrary::new(EffectCache::new(self.cache.clone()), Box::new(backend.clone()))
    }
}

fn hosts() -> (Host, Host) {
    (Host::new("Joe", "voice-joe-1"), Host::new("Alex", "voice-alex-1"))
}

fn assemble(
    assembler: &AudioAssembler,
    transcript: &str,
    output: &Path,
) -> Result<podcast_forge::AssembledEpisode, AssemblyError> {
    let (joe, alex) = hosts();
    assembler.assemble(transcript, &joe, &alex, output)
}

#[test]
fn segments_are_joined_with_fixed_silence() {
    let ws = Workspace::new();
    let voice = FakeVoice::new(WORD);
    let assembler = AudioAssembler::new(Box::new(voice.clone()), ws.settings(1));

    let episode = assemble(
        &assembler,
        "Joe: one two\nAlex: three\nJoe: four five six seven",
        &ws.output,
    )
    .unwrap();

    let (samples, rate) = wav_samples(&ws.output);
    assert_eq!(rate, RATE);
    assert_eq!(samples.len(), 2 * WORD + GAP + WORD + GAP + 4 * WORD);
    assert!(samples[2 * WORD..2 * WORD + GAP].iter().all(|s| *s == 0));
    assert!(samples[2 * WORD + GAP + WORD + GAP..].iter().all(|s| *s != 0));

    assert_eq!(episode.turns, 3);
    assert_eq!(episode.segments, 3);
    assert_eq!(episode.cues_applied, 0);
    assert!((episode.duration.as_secs_f64() - 2.25).abs() < 1e-3);

    let voices: Vec<_> = voice
        .calls
        .lock()
        .unwrap()
        .iter()
        .map(|(_, v)| v.clone())
        .collect();
    assert_eq!(voices, vec!["voice-joe-1", "voice-alex-1", "voice-joe-1"]);
    assert_eq!(ws.scratch_entries(), 0);
}

#[test]
fn failing_turn_aborts_and_leaves_nothing_behind() {
    let ws = Workspace::new();
    let voice = FakeVoice::new(WORD);
    let assembler = AudioAssembler::new(Box::new(voice.clone()), ws.settings(1));

    let err = assemble(&assembler, "Joe: hi\nAlex: FAIL now\nJoe: bye", &ws.output).unwrap_err();

    assert_eq!(err.failed_turn(), Some(2));
    assert_eq!(err.kind(), FailureKind::Upstream);
    match &err {
        AssemblyError::Synthesis {
            voice_id, source, ..
        } => {
            assert_eq!(voice_id, "voice-alex-1");
            assert!(matches!(source, SynthesisError::Status { status: 500, .. }));
        }
        other => panic!("unexpected error: {other:?}"),
    }

    assert_eq!(voice.texts(), vec!["hi", "FAIL now"]);
    assert_eq!(ws.scratch_entries(), 0);
    assert!(!ws.output.exists());
}

#[test]
fn parallel_failure_reports_earliest_turn() {
    let ws = Workspace::new();
    let voice = FakeVoice::new(WORD);
    let assembler = AudioAssembler::new(Box::new(voice), ws.settings(4));

    let err = assemble(
        &assembler,
        "Joe: a\nAlex: b\nJoe: FAIL c\nAlex: d\nJoe: FAIL e",
        &ws.output,
    )
    .unwrap_err();

    assert_eq!(err.failed_turn(), Some(3));
    assert_eq!(ws.scratch_entries(), 0);
    assert!(!ws.output.exists());
}

#[test]
fn parallel_synthesis_keeps_turn_order() {
    let transcript = "Joe: a\nAlex: b b b\nJoe: c c\nAlex: d d d d d\nJoe: e\nAlex: f f f f";

    let sequential = Workspace::new();
    let assembler = AudioAssembler::new(Box::new(FakeVoice::new(WORD)), sequential.settings(1));
    assemble(&assembler, transcript, &sequential.output).unwrap();

    let parallel = Workspace::new();
    let assembler = AudioAssembler::new(Box::new(FakeVoice::new(WORD)), parallel.settings(4));
    let episode = assemble(&assembler, transcript, &parallel.output).unwrap();

    assert_eq!(episode.segments, 6);
    assert_eq!(wav_samples(&sequential.output), wav_samples(&parallel.output));
    assert_eq!(parallel.scratch_entries(), 0);
}

#[test]
fn transcript_without_dialogue_is_rejected() {
    let ws = Workspace::new();
    let voice = FakeVoice::new(WORD);
    let assembler = AudioAssembler::new(Box::new(voice.clone()), ws.settings(1));

    let err = assemble(&assembler, "EPISODE TITLE: Nothing\njust notes", &ws.output).unwrap_err();

    assert!(matches!(err, AssemblyError::NoDialogue));
    assert_eq!(err.to_string(), "no dialogue found in transcript");
    assert_eq!(err.kind(), FailureKind::Validation);
    assert!(voice.texts().is_empty());
    assert_eq!(ws.scratch_entries(), 0);
}

#[test]
fn undecodable_segment_is_skipped() {
    let ws = Workspace::new();
    let assembler = AudioAssembler::new(Box::new(FakeVoice::new(WORD)), ws.settings(1));

    let episode = assemble(&assembler, "Joe: one\nAlex: GARBLED\nJoe: two", &ws.output).unwrap();

    assert_eq!(episode.turns, 3);
    assert_eq!(episode.segments, 2);
    let (samples, _) = wav_samples(&ws.output);
    assert_eq!(samples.len(), WORD + GAP + WORD);
}

#[test]
fn all_segments_undecodable_is_a_decode_failure() {
    let ws = Workspace::new();
    let assembler = AudioAssembler::new(Box::new(FakeVoice::new(WORD)), ws.settings(1));

    let err = assemble(&assembler, "Joe: GARBLED\nAlex: GARBLED too", &ws.output).unwrap_err();

    assert!(matches!(err, AssemblyError::EmptyConcatenation));
    assert_eq!(err.to_string(), "concatenation produced empty result");
    assert_eq!(err.kind(), FailureKind::Decode);
    assert_eq!(ws.scratch_entries(), 0);
    assert!(!ws.output.exists());
}

struct SilentVoice;

impl SpeechBackend for SilentVoice {
    fn name(&self) -> &str {
        "silent"
    }

    fn synthesize(&self, _text: &str, _voice_id: &str) -> Result<SpeechOutcome, SynthesisError> {
        Ok(SpeechOutcome::Skipped)
    }
}

#[test]
fn all_turns_skipped_yields_no_segments() {
    let ws = Workspace::new();
    let assembler = AudioAssembler::new(Box::new(SilentVoice), ws.settings(1));

    let err = assemble(&assembler, "Joe: hi\nAlex: there", &ws.output).unwrap_err();

    assert!(matches!(err, AssemblyError::NoSegments));
    assert_eq!(ws.scratch_entries(), 0);
    assert!(!ws.output.exists());
}

#[test]
fn cue_effect_is_mixed_at_line_offset() {
    let ws = Workspace::new();
    let effects = FakeEffects::new(1600);
    let assembler = AudioAssembler::new(Box::new(FakeVoice::new(2 * WORD)), ws.settings(1))
        .with_effects(ws.effects(&effects));

    // Line 1 lands at 2.0s, inside the first turn (5 words at 0.5s each).
    let transcript = "Joe: one two three four\n[applause]\nAlex: five six";
    let episode = assemble(&assembler, transcript, &ws.output).unwrap();

    assert_eq!(episode.cues_applied, 1);
    assert_eq!(effects.count(), 1);

    let (samples, _) = wav_samples(&ws.output);
    assert_eq!(samples.len(), 5 * 2 * WORD + GAP + 2 * 2 * WORD);

    let offset = 2 * RATE as usize;
    let plain = samples[offset - 10] as i32;
    let mixed = samples[offset + 10] as i32;
    assert!((plain - 3277).abs() < 50, "plain sample {plain}");
    assert!((mixed - 19660).abs() < 200, "mixed sample {mixed}");
    assert_eq!(samples[offset + 1600 + 10] as i32, plain);
}

#[test]
fn repeated_cues_hit_the_cache() {
    let ws = Workspace::new();
    let effects = FakeEffects::new(160);
    let assembler = AudioAssembler::new(Box::new(FakeVoice::new(2 * WORD)), ws.settings(1))
        .with_effects(ws.effects(&effects));

    let transcript = "Joe: [laugh] one two three\nAlex: [laugh] four five six";
    let episode = assemble(&assembler, transcript, &ws.output).unwrap();

    assert_eq!(episode.cues_applied, 2);
    assert_eq!(effects.count(), 1);
}

#[test]
fn effect_failures_are_not_fatal() {
    let ws = Workspace::new();
    let effects = FakeEffects::failing();
    let mut settings = ws.settings(1);
    settings.seconds_per_line = 0.5;
    let assembler = AudioAssembler::new(Box::new(FakeVoice::new(WORD)), settings)
        .with_effects(ws.effects(&effects));

    let episode = assemble(&assembler, "Joe: [drum roll] hello\nAlex: [suspense] bye", &ws.output)
        .unwrap();

    assert_eq!(episode.cues_applied, 0);
    assert_eq!(effects.count(), 2);
    assert!(ws.output.exists());
}

#[test]
fn cue_past_the_end_is_dropped() {
    let ws = Workspace::new();
    let effects = FakeEffects::new(160);
    let mut settings = ws.settings(1);
    settings.seconds_per_line = 100.0;
    let assembler = AudioAssembler::new(Box::new(FakeVoice::new(WORD)), settings)
        .with_effects(ws.effects(&effects));

    let episode = assemble(&assembler, "Joe: hi\nAlex: [exit] bye", &ws.output).unwrap();

    assert_eq!(episode.cues_applied, 0);
    assert_eq!(effects.count(), 0);
    let (samples, _) = wav_samples(&ws.output);
    assert_eq!(samples.len(), WORD + GAP + 2 * WORD);
}

#[test]
fn huge_line_spacing_skips_cues_instead_of_panicking() {
    let ws = Workspace::new();
    let effects = FakeEffects::new(160);
    let mut settings = ws.settings(1);
    settings.seconds_per_line = 1e20;
    let assembler = AudioAssembler::new(Box::new(FakeVoice::new(WORD)), settings)
        .with_effects(ws.effects(&effects));

    let episode = assemble(&assembler, "Joe: hi\n[applause]\nAlex: yo", &ws.output).unwrap();

    assert_eq!(episode.cues_applied, 0);
    assert_eq!(effects.count(), 0);
    assert!(ws.output.exists());
}

/// Counts calls and takes a while per turn; turn text `FAIL` errors at once.
struct SlowVoice {
    calls: Arc<AtomicUsize>,
}

impl SpeechBackend for SlowVoice {
    fn name(&self) -> &str {
        "slow"
    }

    fn synthesize(&self, text: &str, _voice_id: &str) -> Result<SpeechOutcome, SynthesisError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if text == "FAIL" {
            return Err(SynthesisError::EmptyAudio {
                target: text.to_string(),
            });
        }
        thread::sleep(Duration::from_millis(50));
        Ok(SpeechOutcome::Audio(common::wav_bytes(WORD, 0.1, RATE)))
    }
}

#[test]
fn parallel_failure_stops_remaining_turns() {
    let ws = Workspace::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let voice = SlowVoice {
        calls: Arc::clone(&calls),
    };
    let assembler = AudioAssembler::new(Box::new(voice), ws.settings(2));

    let mut transcript = String::from("Joe: FAIL\n");
    for i in 0..19 {
        let label = if i % 2 == 0 { "Alex" } else { "Joe" };
        transcript.push_str(&format!("{label}: turn {i}\n"));
    }

    let err = assemble(&assembler, &transcript, &ws.output).unwrap_err();

    assert_eq!(err.failed_turn(), Some(1));
    assert!(calls.load(Ordering::SeqCst) < 6, "made {} calls", calls.load(Ordering::SeqCst));
    assert_eq!(ws.scratch_entries(), 0);
    assert!(!ws.output.exists());
}
