//! Integer preference store shared with the companion settings app
//!
//! The file store keeps a flat JSON object (`{"showdate": 1, "clock_font_color": 8}`)
//! and rewrites it through a temp file + rename on every change.

use anyhow::{anyhow, Context, Result};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Key/value store for integer preferences
pub trait PreferenceStore {
    /// Read a value; missing keys are an error
    fn get_int(&self, key: &str) -> Result<i32>;

    fn set_int(&mut self, key: &str, value: i32) -> Result<()>;

    fn exists(&self, key: &str) -> Result<bool>;
}

/// Preferences persisted as a JSON object on disk
#[derive(Debug)]
pub struct FilePreferences {
    path: PathBuf,
    values: BTreeMap<String, i32>,
}

impl FilePreferences {
    /// Open the store at `path`
    /// A missing or unreadable file starts empty (logged) so the face can still render
    pub fn open(path: PathBuf) -> Self {
        let values = match fs::read_to_string(&path) {
            Ok(contents) => serde_json::from_str(&contents)
                .inspect_err(|e| {
                    warn!(path = %path.display(), error = %e, "Preference file is corrupt, starting empty")
                })
                .unwrap_or_default(),
            Err(e) => {
                debug!(path = %path.display(), error = %e, "No preference file yet");
                BTreeMap::new()
            }
        };
        Self { path, values }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create preference directory: {}", parent.display()))?;
        }

        let json = serde_json::to_string_pretty(&self.values)
            .context("Failed to serialize preferences")?;

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)
            .with_context(|| format!("Failed to write preferences: {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("Failed to replace preferences: {}", self.path.display()))?;
        Ok(())
    }
}

impl PreferenceStore for FilePreferences {
    fn get_int(&self, key: &str) -> Result<i32> {
        self.values
            .get(key)
            .copied()
            .ok_or_else(|| anyhow!("Preference '{}' is not set", key))
    }

    fn set_int(&mut self, key: &str, value: i32) -> Result<()> {
        let previous = self.values.insert(key.to_string(), value);
        if let Err(e) = self.save() {
            // Keep memory and disk in agreement
            match previous {
                Some(old) => self.values.insert(key.to_string(), old),
                None => self.values.remove(key),
            };
            return Err(e);
        }
        debug!(key = key, value = value, "Stored preference");
        Ok(())
    }

    fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.values.contains_key(key))
    }
}

/// In-memory store for tests
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MemoryPreferences {
    pub values: BTreeMap<String, i32>,
    pub fail_reads: bool,
    pub writes: Vec<(String, i32)>,
}

#[cfg(test)]
impl PreferenceStore for MemoryPreferences {
    fn get_int(&self, key: &str) -> Result<i32> {
        if self.fail_reads {
            return Err(anyhow!("read failure injected"));
        }
        self.values
            .get(key)
            .copied()
            .ok_or_else(|| anyhow!("Preference '{}' is not set", key))
    }

    fn set_int(&mut self, key: &str, value: i32) -> Result<()> {
        self.values.insert(key.to_string(), value);
        self.writes.push((key.to_string(), value));
        Ok(())
    }

    fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.values.contains_key(key))
    }
}
