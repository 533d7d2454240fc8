use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::{clean_env_value, VoiceConfig, VoiceSettings};
use crate::error::SynthesisError;

use super::provider::{EffectBackend, SpeechBackend, SpeechOutcome};

pub const MIN_VOICE_ID_LEN: usize = 5;

#[derive(Serialize)]
struct SpeechRequest<'a> {
    text: &'a str,
    model_id: &'a str,
    voice_settings: &'a VoiceSettings,
}

#[derive(Serialize)]
struct EffectRequest<'a> {
    text: &'a str,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VoiceInfo {
    pub voice_id: String,
    pub name: String,
}

#[derive(Deserialize)]
struct VoicesResponse {
    #[serde(default)]
    voices: Vec<VoiceInfo>,
}

#[derive(Debug, Clone)]
struct Endpoint {
    http: Client,
    base_url: String,
    api_key: String,
}

impl Endpoint {
    fn new(base_url: &str, api_key: &str) -> Result<Self, reqwest::Error> {
        Ok(Self {
            http: Client::builder().build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: clean_env_value(api_key),
        })
    }

    fn post(&self, path: &str) -> RequestBuilder {
        self.http
            .post(format!("{}/{}", self.base_url, path))
            .header("xi-api-key", &self.api_key)
    }
}

/// Voice synthesis client. Configuration is fixed at construction.
#[derive(Debug, Clone)]
pub struct ElevenLabsVoice {
    endpoint: Endpoint,
    model_id: String,
    settings: VoiceSettings,
    timeout: Duration,
}

impl ElevenLabsVoice {
    pub fn new(config: &VoiceConfig, api_key: &str) -> Result<Self, reqwest::Error> {
        Ok(Self {
            endpoint: Endpoint::new(&config.base_url, api_key)?,
            model_id: config.model_id.clone(),
            settings: config.settings,
            timeout: Duration::from_secs(config.timeout_seconds),
        })
    }

    pub fn list_voices(&self) -> Result<Vec<VoiceInfo>, SynthesisError> {
        let target = "voices";
        let response = self
            .endpoint
            .http
            .get(format!("{}/voices", self.endpoint.base_url))
            .header("Accept", "application/json")
            .header("xi-api-key", &self.endpoint.api_key)
            .timeout(self.timeout)
            .send()
            .map_err(|err| transport_error(err, target, self.timeout))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(status_error(response, target));
        }

        let parsed: VoicesResponse = response
            .json()
            .map_err(|err| transport_error(err, target, self.timeout))?;
        tracing::info!(count = parsed.voices.len(), "retrieved voices");
        Ok(parsed.voices)
    }
}

impl SpeechBackend for ElevenLabsVoice {
    fn name(&self) -> &str {
        "elevenlabs"
    }

    fn synthesize(&self, text: &str, voice_id: &str) -> Result<SpeechOutcome, SynthesisError> {
        if text.trim().is_empty() {
            tracing::debug!("skipping empty text");
            return Ok(SpeechOutcome::Skipped);
        }

        let voice_id = validate_voice_id(voice_id)?;
        let sample: String = text.chars().take(60).collect();
        tracing::debug!(voice_id = %voice_id, model_id = %self.model_id, text = %sample, "sending speech request");

        let body = SpeechRequest {
            text,
            model_id: &self.model_id,
            voice_settings: &self.settings,
        };
        let response = self
            .endpoint
            .post(&format!("text-to-speech/{voice_id}"))
            .header("Accept", "audio/mpeg")
            .json(&body)
            .timeout(self.timeout)
            .send()
            .map_err(|err| transport_error(err, &voice_id, self.timeout))?;

        if response.status() != StatusCode::OK {
            return Err(status_error(response, &voice_id));
        }

        let audio = read_audio(response, &voice_id, self.timeout)?;
        tracing::debug!(voice_id = %voice_id, bytes = audio.len(), "speech request succeeded");
        Ok(SpeechOutcome::Audio(audio))
    }
}

#[derive(Debug, Clone)]
pub struct ElevenLabsEffects {
    endpoint: Endpoint,
    timeout: Duration,
}

impl ElevenLabsEffects {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        Ok(Self {
            endpoint: Endpoint::new(base_url, api_key)?,
            timeout,
        })
    }
}

impl EffectBackend for ElevenLabsEffects {
    fn generate(&self, description: &str) -> Result<Vec<u8>, SynthesisError> {
        let response = self
            .endpoint
            .post("sound-effects")
            .json(&EffectRequest { text: description })
            .timeout(self.timeout)
            .send()
            .map_err(|err| transport_error(err, description, self.timeout))?;

        if !response.status().is_success() {
            return Err(status_error(response, description));
        }

        read_audio(response, description, self.timeout)
    }
}

/// Cleans a voice id and rejects ids too short to be real.
pub fn validate_voice_id(raw: &str) -> Result<String, SynthesisError> {
    let cleaned = clean_env_value(raw);
    if cleaned.len() < MIN_VOICE_ID_LEN {
        return Err(SynthesisError::InvalidVoice {
            voice_id: raw.to_string(),
        });
    }
    Ok(cleaned)
}

fn read_audio(response: Response, target: &str, timeout: Duration) -> Result<Vec<u8>, SynthesisError> {
    let bytes = response
        .bytes()
        .map_err(|err| transport_error(err, target, timeout))?;
    if bytes.is_empty() {
        return Err(SynthesisError::EmptyAudio {
            target: target.to_string(),
        });
    }
    Ok(bytes.to_vec())
}

fn status_error(response: Response, target: &str) -> SynthesisError {
    let status = response.status().as_u16();
    let body = response.text().unwrap_or_default();
    SynthesisError::Status {
        target: target.to_string(),
        status,
        message: upstream_message(&body),
    }
}

/// Prefers `detail.message` from a JSON error body, else the raw body.
fn upstream_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            value
                .pointer("/detail/message")
                .and_then(|v| v.as_str())
                .map(|s| s.to_string())
        })
        .unwrap_or_else(|| body.trim().to_string())
}

fn transport_error(err: reqwest::Error, target: &str, timeout: Duration) -> SynthesisError {
    if err.is_timeout() {
        SynthesisError::Timeout {
            target: target.to_string(),
            seconds: timeout.as_secs(),
        }
    } else {
        SynthesisError::Network {
            target: target.to_string(),
            source: err,
        }
    }
}
