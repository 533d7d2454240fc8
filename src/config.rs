use anyhow::{bail, Context};
use directories::BaseDirs;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::assembler::AssemblySettings;
use crate::tts::elevenlabs::MIN_VOICE_ID_LEN;

pub const SUPPORTED_BITRATES: &[u32] = &[128, 160, 192, 256, 320];

pub const MAX_SECONDS_PER_LINE: f64 = 60.0;

/// Legacy per-host overrides, keyed by lowercase speaker label.
const LABEL_VOICE_ENV: &[(&str, &str)] = &[
    ("joe", "ELEVENLABS_JOE_VOICE_ID"),
    ("alex", "ELEVENLABS_ALEX_VOICE_ID"),
];

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub voice: VoiceConfig,
    #[serde(default)]
    pub effects: EffectsConfig,
    #[serde(default)]
    pub assembly: AssemblyConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoiceConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_model_id")]
    pub model_id: String,
    #[serde(default = "default_host1_voice")]
    pub host1_voice: String,
    #[serde(default = "default_host2_voice")]
    pub host2_voice: String,
    /// Voices pinned to specific speaker labels (matched case-insensitively).
    #[serde(default)]
    pub label_voices: BTreeMap<String, String>,
    #[serde(default)]
    pub settings: VoiceSettings,
    #[serde(default = "default_voice_timeout_seconds")]
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VoiceSettings {
    #[serde(default = "default_stability")]
    pub stability: f32,
    #[serde(default = "default_similarity_boost")]
    pub similarity_boost: f32,
    #[serde(default = "default_style")]
    pub style: f32,
    #[serde(default = "default_enabled")]
    pub use_speaker_boost: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectsConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,
    #[serde(default = "default_effect_timeout_seconds")]
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssemblyConfig {
    #[serde(default = "default_silence_ms")]
    pub silence_ms: u64,
    #[serde(default = "default_seconds_per_line")]
    pub seconds_per_line: f64,
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    #[serde(default = "default_mp3_bitrate")]
    pub mp3_bitrate_kbps: u32,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let mut config = Self::load_file()?;
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    fn load_file() -> anyhow::Result<Self> {
        let project = Self::project_path();
        if project.exists() {
            return Self::load_from_path(&project);
        }

        if let Ok(path) = Self::default_path() {
            if path.exists() {
                return Self::load_from_path(&path);
            }
        }

        Ok(Self::default())
    }

    pub fn load_from_path(path: &Path) -> anyhow::Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("read config at {}", path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("parse config at {}", path.display()))
    }

    pub fn init_default() -> anyhow::Result<PathBuf> {
        let path = Self::default_path()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, serde_json::to_string_pretty(&Self::default())?)?;
        Ok(path)
    }

    pub fn default_path() -> anyhow::Result<PathBuf> {
        let base = BaseDirs::new().context("unable to resolve home directory")?;
        Ok(base.config_dir().join("podcast-forge").join("config.json"))
    }

    pub fn effect_cache_dir(&self) -> anyhow::Result<PathBuf> {
        if let Some(dir) = &self.effects.cache_dir {
            return Ok(dir.clone());
        }
        let base = BaseDirs::new().context("unable to resolve home directory")?;
        Ok(base.cache_dir().join("podcast-forge").join("sfx"))
    }

    /// Applies `ELEVENLABS_*` overrides. Values are cleaned first; malformed
    /// numbers or booleans keep the current value.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|raw| clean_env_value(&raw))
                .filter(|value| !value.is_empty())
        };

        if let Some(key) = get("ELEVENLABS_API_KEY") {
            self.voice.api_key = Some(key);
        }
        if let Some(voice) = get("ELEVENLABS_HOST1_VOICE_ID") {
            self.voice.host1_voice = voice;
        }
        if let Some(voice) = get("ELEVENLABS_HOST2_VOICE_ID") {
            self.voice.host2_voice = voice;
        }
        for &(label, key) in LABEL_VOICE_ENV {
            if let Some(voice) = get(key) {
                self.voice.label_voices.insert(label.to_string(), voice);
            }
        }
        if let Some(model) = get("ELEVENLABS_MODEL_ID") {
            self.voice.model_id = model;
        }

        let settings = &mut self.voice.settings;
        override_parsed(get("ELEVENLABS_STABILITY"), "ELEVENLABS_STABILITY", &mut settings.stability);
        override_parsed(
            get("ELEVENLABS_SIMILARITY"),
            "ELEVENLABS_SIMILARITY",
            &mut settings.similarity_boost,
        );
        override_parsed(get("ELEVENLABS_STYLE"), "ELEVENLABS_STYLE", &mut settings.style);

        if let Some(raw) = get("ELEVENLABS_USE_SPEAKER_BOOST") {
            match raw.to_lowercase().as_str() {
                "true" | "1" | "yes" => settings.use_speaker_boost = true,
                "false" | "0" | "no" => settings.use_speaker_boost = false,
                _ => tracing::warn!(value = %raw, "invalid ELEVENLABS_USE_SPEAKER_BOOST; keeping current"),
            }
        }
    }

    /// Voice for a host: a label-pinned voice wins over the slot default.
    pub fn voice_for_label(&self, label: &str, slot_default: &str) -> String {
        let wanted = label.trim().to_lowercase();
        self.voice
            .label_voices
            .iter()
            .find(|(pinned, _)| pinned.trim().to_lowercase() == wanted)
            .map(|(_, voice)| voice.clone())
            .unwrap_or_else(|| slot_default.to_string())
    }

    pub fn api_key(&self) -> anyhow::Result<&str> {
        match self.voice.api_key.as_deref() {
            Some(key) if !key.trim().is_empty() => Ok(key),
            _ => bail!("ElevenLabs API key is required; set ELEVENLABS_API_KEY or voice.api_key"),
        }
    }

    pub fn assembly_settings(&self) -> AssemblySettings {
        AssemblySettings {
            silence: Duration::from_millis(self.assembly.silence_ms),
            seconds_per_line: self.assembly.seconds_per_line,
            concurrency: self.assembly.concurrency,
            mp3_bitrate_kbps: self.assembly.mp3_bitrate_kbps,
            scratch_root: None,
        }
    }

    /// Copy safe to print: the API key is masked.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if copy.voice.api_key.is_some() {
            copy.voice.api_key = Some("***".to_string());
        }
        copy
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        let settings = &self.voice.settings;
        for (name, value) in [
            ("stability", settings.stability),
            ("similarity_boost", settings.similarity_boost),
            ("style", settings.style),
        ] {
            if !(0.0..=1.0).contains(&value) {
                bail!("voice.settings.{name} must be between 0.0 and 1.0");
            }
        }

        for (name, voice) in [
            ("host1_voice", &self.voice.host1_voice),
            ("host2_voice", &self.voice.host2_voice),
        ] {
            if voice.trim().len() < MIN_VOICE_ID_LEN {
                bail!("voice.{name} '{voice}' is not a plausible voice id");
            }
        }

        for (label, voice) in &self.voice.label_voices {
            if voice.trim().len() < MIN_VOICE_ID_LEN {
                bail!("voice.label_voices.{label} '{voice}' is not a plausible voice id");
            }
        }

        if self.voice.model_id.trim().is_empty() {
            bail!("voice.model_id must not be empty");
        }

        if self.voice.timeout_seconds == 0 || self.effects.timeout_seconds == 0 {
            bail!("timeouts must be greater than 0");
        }

        if self.assembly.concurrency == 0 {
            bail!("assembly.concurrency must be greater than 0");
        }

        let per_line = self.assembly.seconds_per_line;
        if !per_line.is_finite() || per_line <= 0.0 || per_line > MAX_SECONDS_PER_LINE {
            bail!("assembly.seconds_per_line must be in (0, {MAX_SECONDS_PER_LINE}]");
        }

        if !SUPPORTED_BITRATES.contains(&self.assembly.mp3_bitrate_kbps) {
            bail!(
                "unsupported mp3 bitrate: {} (expected one of {:?})",
                self.assembly.mp3_bitrate_kbps,
                SUPPORTED_BITRATES
            );
        }

        Ok(())
    }

    fn project_path() -> PathBuf {
        PathBuf::from("podcast-forge.json")
    }
}

/// Strips an inline `#` comment, surrounding whitespace and quotes.
pub fn clean_env_value(raw: &str) -> String {
    let without_comment = raw.split('#').next().unwrap_or("");
    without_comment
        .trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .to_string()
}

fn override_parsed(value: Option<String>, key: &str, target: &mut f32) {
    if let Some(raw) = value {
        match raw.parse::<f32>() {
            Ok(parsed) => *target = parsed,
            Err(_) => tracing::warn!(key, value = %raw, "invalid number in environment; keeping current"),
        }
    }
}

fn default_enabled() -> bool {
    true
}

fn default_base_url() -> String {
    "https://api.elevenlabs.io/v1".to_string()
}

fn default_model_id() -> String {
    "eleven_turbo_v2".to_string()
}

fn default_host1_voice() -> String {
    "NQS8M290ViUV7Mdca3qT".to_string()
}

fn default_host2_voice() -> String {
    "E1eTKENSf2k6nMCQpG8n".to_string()
}

fn default_voice_timeout_seconds() -> u64 {
    90
}

fn default_effect_timeout_seconds() -> u64 {
    30
}

fn default_stability() -> f32 {
    0.4
}

fn default_similarity_boost() -> f32 {
    0.8
}

fn default_style() -> f32 {
    0.15
}

fn default_silence_ms() -> u64 {
    250
}

fn default_seconds_per_line() -> f64 {
    2.0
}

fn default_concurrency() -> usize {
    1
}

fn default_mp3_bitrate() -> u32 {
    192
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            model_id: default_model_id(),
            host1_voice: default_host1_voice(),
            host2_voice: default_host2_voice(),
            label_voices: BTreeMap::new(),
            settings: VoiceSettings::default(),
            timeout_seconds: default_voice_timeout_seconds(),
        }
    }
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            stability: default_stability(),
            similarity_boost: default_similarity_boost(),
            style: default_style(),
            use_speaker_boost: true,
        }
    }
}

impl Default for EffectsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            cache_dir: None,
            timeout_seconds: default_effect_timeout_seconds(),
        }
    }
}

impl Default for AssemblyConfig {
    fn default() -> Self {
        Self {
            silence_ms: default_silence_ms(),
            seconds_per_line: default_seconds_per_line(),
            concurrency: default_concurrency(),
            mp3_bitrate_kbps: default_mp3_bitrate(),
        }
    }
}
