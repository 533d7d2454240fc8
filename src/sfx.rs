use std::path::PathBuf;

use crate::audio::cache::EffectCache;
use crate::tts::EffectBackend;

/// Produces effect clips on demand, reusing cached files when present.
pub struct EffectLibrary {
    cache: EffectCache,
    backend: Box<dyn EffectBackend>,
}

impl EffectLibrary {
    pub fn new(cache: EffectCache, backend: Box<dyn EffectBackend>) -> Self {
        Self { cache, backend }
    }

    pub fn cache(&self) -> &EffectCache {
        &self.cache
    }

    /// Returns the cached clip path, generating it on a miss. Failures are
    /// logged and yield `None`; effects are never fatal.
    pub fn synthesize_effect(&self, description: &str) -> Option<PathBuf> {
        if let Some(path) = self.cache.get(description) {
            tracing::debug!(description, path = %path.display(), "effect cache hit");
            return Some(path);
        }

        let audio = match self.backend.generate(description) {
            Ok(audio) => audio,
            Err(err) => {
                tracing::warn!(description, error = %err, "effect generation failed");
                return None;
            }
        };

        match self.cache.put(description, &audio) {
            Ok(path) => {
                tracing::info!(description, path = %path.display(), "generated effect");
                Some(path)
            }
            Err(err) => {
                tracing::warn!(description, error = ?err, "effect cache write failed");
                None
            }
        }
    }
}
