#![allow(dead_code)]

use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use podcast_forge::error::SynthesisError;
use podcast_forge::tts::{EffectBackend, SpeechBackend, SpeechOutcome};

pub const RATE: u32 = 16_000;

/// Mono 16-bit WAV holding `len` samples of a constant level.
pub fn wav_bytes(len: usize, level: f32, sample_rate: u32) -> Vec<u8> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
        let value = (level * i16::MAX as f32) as i16;
        for _ in 0..len {
            writer.write_sample(value).unwrap();
        }
        writer.finalize().unwrap();
    }
    cursor.into_inner()
}

pub fn wav_samples(path: &std::path::Path) -> (Vec<i16>, u32) {
    let mut reader = hound::WavReader::open(path).unwrap();
    let rate = reader.spec().sample_rate;
    let samples = reader.samples::<i16>().map(|s| s.unwrap()).collect();
    (samples, rate)
}

/// Voice backend that returns one clip per call. Clip length is the number
/// of words times `samples_per_word`. Text containing `FAIL` errors out and
/// text containing `GARBLED` yields bytes that do not decode.
#[derive(Clone)]
pub struct FakeVoice {
    pub samples_per_word: usize,
    pub calls: Arc<Mutex<Vec<(String, String)>>>,
}

impl FakeVoice {
    pub fn new(samples_per_word: usize) -> Self {
        Self {
            samples_per_word,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn texts(&self) -> Vec<String> {
        self.calls.lock().unwrap().iter().map(|(t, _)| t.clone()).collect()
    }
}

impl SpeechBackend for FakeVoice {
    fn name(&self) -> &str {
        "fake"
    }

    fn synthesize(&self, text: &str, voice_id: &str) -> Result<SpeechOutcome, SynthesisError> {
        self.calls
            .lock()
            .unwrap()
            .push((text.to_string(), voice_id.to_string()));
        if text.trim().is_empty() {
            return Ok(SpeechOutcome::Skipped);
        }
        if text.contains("FAIL") {
            return Err(SynthesisError::Status {
                target: voice_id.to_string(),
                status: 500,
                message: "boom".to_string(),
            });
        }
        if text.contains("GARBLED") {
            return Ok(SpeechOutcome::Audio(b"not an audio stream".to_vec()));
        }
        let words = text.split_whitespace().count();
        Ok(SpeechOutcome::Audio(wav_bytes(
            words * self.samples_per_word,
            0.1,
            RATE,
        )))
    }
}

/// Effect backend that counts calls and returns a short clip, or fails.
#[derive(Clone)]
pub struct FakeEffects {
    pub calls: Arc<AtomicUsize>,
    pub fail: bool,
    pub len: usize,
}

impl FakeEffects {
    pub fn new(len: usize) -> Self {
        Self {
            calls: Arc::new(AtomicUsize::new(0)),
            fail: false,
            len,
        }
    }

    pub fn failing() -> Self {
        Self {
            calls: Arc::new(AtomicUsize::new(0)),
            fail: true,
            len: 0,
        }
    }

    pub fn count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl EffectBackend for FakeEffects {
    fn generate(&self, description: &str) -> Result<Vec<u8>, SynthesisError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(SynthesisError::EmptyAudio {
                target: description.to_string(),
            });
        }
        Ok(wav_bytes(self.len, 0.5, RATE))
    }
}
