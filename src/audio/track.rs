use std::time::Duration;

use super::decode::Pcm;
use super::resample::resample;
use crate::error::AudioError;

/// In-memory mono mix bus. The sample rate is fixed by the first clip.
#[derive(Debug, Clone, Default)]
pub struct Track {
    samples: Vec<f32>,
    sample_rate: Option<u32>,
}

impl Track {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sample_rate(sample_rate: u32) -> Self {
        Self {
            samples: Vec::new(),
            sample_rate: Some(sample_rate),
        }
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn sample_rate(&self) -> Option<u32> {
        self.sample_rate
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn duration(&self) -> Duration {
        match self.sample_rate {
            Some(rate) if rate > 0 => Duration::from_secs_f64(self.samples.len() as f64 / rate as f64),
            _ => Duration::ZERO,
        }
    }

    pub fn append(&mut self, clip: &Pcm) -> Result<(), AudioError> {
        self.append_with_gap(clip, Duration::ZERO)
    }

    /// Appends `gap` of silence followed by `clip`. Nothing is added if the
    /// clip cannot be converted to the track's rate.
    pub fn append_with_gap(&mut self, clip: &Pcm, gap: Duration) -> Result<(), AudioError> {
        let converted = self.conform(clip)?;
        self.append_silence(gap);
        self.samples.extend_from_slice(&converted);
        Ok(())
    }

    /// No-op until the sample rate is known.
    pub fn append_silence(&mut self, length: Duration) {
        if let Some(rate) = self.sample_rate {
            let count = (length.as_secs_f64() * rate as f64).round() as usize;
            self.samples.resize(self.samples.len() + count, 0.0);
        }
    }

    /// Mixes `clip` in starting at `offset`. The track never grows: a clip
    /// starting past the end is dropped and one running past it is cut.
    /// Returns whether anything was mixed.
    pub fn overlay(&mut self, clip: &Pcm, offset: Duration) -> Result<bool, AudioError> {
        let rate = match self.sample_rate {
            Some(rate) => rate,
            None => return Ok(false),
        };

        let start = (offset.as_secs_f64() * rate as f64).round() as usize;
        if start >= self.samples.len() {
            return Ok(false);
        }

        let converted = self.conform(clip)?;
        for (dst, src) in self.samples[start..].iter_mut().zip(converted.iter()) {
            *dst = (*dst + *src).clamp(-1.0, 1.0);
        }
        Ok(true)
    }

    fn conform(&mut self, clip: &Pcm) -> Result<Vec<f32>, AudioError> {
        match self.sample_rate {
            Some(rate) if rate != clip.sample_rate => resample(&clip.samples, clip.sample_rate, rate),
            Some(_) => Ok(clip.samples.clone()),
            None => {
                self.sample_rate = Some(clip.sample_rate);
                Ok(clip.samples.clone())
            }
        }
    }
}
