use std::fs;
use std::path::Path;

use mp3lame_encoder::{Bitrate, Builder, FlushNoGap, MonoPcm, Quality};

use super::track::Track;
use crate::error::AudioError;

// LAME may emit up to this many bytes on flush.
const FLUSH_HEADROOM: usize = 7200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Wav,
    Mp3 { bitrate_kbps: u32 },
}

impl ExportFormat {
    /// `.wav` gets PCM; every other extension gets MP3.
    pub fn for_path(path: &Path, bitrate_kbps: u32) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("wav") => ExportFormat::Wav,
            _ => ExportFormat::Mp3 { bitrate_kbps },
        }
    }
}

/// Writes the track to `path`. A partially written file is removed on error.
pub fn export(track: &Track, path: &Path, format: ExportFormat) -> Result<(), AudioError> {
    let sample_rate = track.sample_rate().ok_or(AudioError::Empty)?;
    if track.is_empty() {
        return Err(AudioError::Empty);
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let pcm = to_i16(track.samples());
    let result = match format {
        ExportFormat::Wav => write_wav(path, &pcm, sample_rate),
        ExportFormat::Mp3 { bitrate_kbps } => write_mp3(path, &pcm, sample_rate, bitrate_kbps),
    };

    if result.is_err() && path.exists() {
        if let Err(err) = fs::remove_file(path) {
            tracing::warn!(path = %path.display(), error = ?err, "could not remove partial output");
        }
    }
    result
}

fn to_i16(samples: &[f32]) -> Vec<i16> {
    samples
        .iter()
        .map(|s| (s.clamp(-1.0, 1.0) * i16::MAX as f32).round() as i16)
        .collect()
}

fn write_wav(path: &Path, pcm: &[i16], sample_rate: u32) -> Result<(), AudioError> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec)?;
    for sample in pcm {
        writer.write_sample(*sample)?;
    }
    writer.finalize()?;
    Ok(())
}

fn write_mp3(path: &Path, pcm: &[i16], sample_rate: u32, bitrate_kbps: u32) -> Result<(), AudioError> {
    let mut builder =
        Builder::new().ok_or_else(|| AudioError::Encode("create LAME builder".to_string()))?;
    builder
        .set_num_channels(1)
        .map_err(|e| AudioError::Encode(format!("set channels: {e:?}")))?;
    builder
        .set_sample_rate(sample_rate)
        .map_err(|e| AudioError::Encode(format!("set sample rate: {e:?}")))?;
    builder
        .set_brate(bitrate(bitrate_kbps))
        .map_err(|e| AudioError::Encode(format!("set bitrate: {e:?}")))?;
    builder
        .set_quality(Quality::Good)
        .map_err(|e| AudioError::Encode(format!("set quality: {e:?}")))?;
    let mut encoder = builder
        .build()
        .map_err(|e| AudioError::Encode(format!("init encoder: {e:?}")))?;

    let mut out = Vec::new();
    out.reserve(mp3lame_encoder::max_required_buffer_size(pcm.len()));
    encoder
        .encode_to_vec(MonoPcm(pcm), &mut out)
        .map_err(|e| AudioError::Encode(format!("encode: {e:?}")))?;
    out.reserve(FLUSH_HEADROOM);
    encoder
        .flush_to_vec::<FlushNoGap>(&mut out)
        .map_err(|e| AudioError::Encode(format!("flush: {e:?}")))?;

    fs::write(path, &out)?;
    Ok(())
}

fn bitrate(kbps: u32) -> Bitrate {
    match kbps {
        128 => Bitrate::Kbps128,
        160 => Bitrate::Kbps160,
        256 => Bitrate::Kbps256,
        320 => Bitrate::Kbps320,
        _ => Bitrate::Kbps192,
    }
}
