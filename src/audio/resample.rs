use rubato::{FftFixedIn, Resampler};

use crate::error::AudioError;

const CHUNK: usize = 1024;
const SUB_CHUNKS: usize = 2;

/// FFT resampling of a mono signal. Resampler latency is removed and the
/// output is trimmed to the exact length implied by the rate ratio.
pub fn resample(samples: &[f32], from_rate: u32, to_rate: u32) -> Result<Vec<f32>, AudioError> {
    if from_rate == to_rate || samples.is_empty() {
        return Ok(samples.to_vec());
    }

    let mut resampler =
        FftFixedIn::<f32>::new(from_rate as usize, to_rate as usize, CHUNK, SUB_CHUNKS, 1)
            .map_err(|e| AudioError::Resample(e.to_string()))?;

    let expected = (samples.len() as f64 * to_rate as f64 / from_rate as f64).round() as usize;
    let mut out = Vec::with_capacity(expected + CHUNK);

    // The FFT resampler emits `delay` frames of latency before the signal starts.
    let delay = resampler.output_delay();
    let mut pos = 0;
    while pos < samples.len() || out.len() < expected + delay {
        // The resampler rounds the requested chunk to its FFT size.
        let needed = resampler.input_frames_next();
        let end = (pos + needed).min(samples.len());
        let mut chunk = vec![0.0f32; needed];
        if pos < end {
            chunk[..end - pos].copy_from_slice(&samples[pos..end]);
        }

        let block = vec![chunk];
        let frames = resampler
            .process(&block, None)
            .map_err(|e| AudioError::Resample(e.to_string()))?;
        out.extend_from_slice(&frames[0]);
        pos += needed;
    }

    out.drain(..delay.min(out.len()));
    out.truncate(expected);
    Ok(out)
}
