use anyhow::Context;
use std::fs;
use std::io::Write;
use std::path::PathBuf;

/// File cache for generated effect clips, keyed by description. Keys never
/// contain path separators, so every entry stays directly inside `dir`.
/// Entries are never evicted.
#[derive(Debug, Clone)]
pub struct EffectCache {
    pub dir: PathBuf,
}

impl EffectCache {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn key(description: &str) -> String {
        description
            .chars()
            .map(|c| if c.is_whitespace() || matches!(c, '/' | '\\') { '_' } else { c })
            .collect()
    }

    pub fn path_for(&self, description: &str) -> PathBuf {
        self.dir.join(format!("{}.mp3", Self::key(description)))
    }

    pub fn get(&self, description: &str) -> Option<PathBuf> {
        let path = self.path_for(description);
        match fs::metadata(&path) {
            Ok(meta) if meta.is_file() && meta.len() > 0 => Some(path),
            _ => None,
        }
    }

    /// Writes through a temp file in the cache dir, then renames into place.
    /// Concurrent writers for one key race benignly: the last rename wins.
    pub fn put(&self, description: &str, audio: &[u8]) -> anyhow::Result<PathBuf> {
        if audio.is_empty() {
            anyhow::bail!("refusing to cache empty clip for '{description}'");
        }

        fs::create_dir_all(&self.dir).context("create effect cache dir")?;
        let path = self.path_for(description);

        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir).context("create cache temp")?;
        tmp.write_all(audio).context("write cache temp")?;
        tmp.persist(&path).context("rename cache file")?;

        Ok(path)
    }
}
