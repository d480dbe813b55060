// ABOUTME: Durable key-value preferences for "don't show again" style flags
// Stored as a small JSON object and rewritten through a temp file on every change

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

use super::ConfigError;

pub const SKIP_REMOVE_CONFIRMATION: &str = "skip_remove_confirmation";
pub const SKIP_MERGE_CONFIRMATION: &str = "skip_merge_confirmation";

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
struct PreferencesFile {
    #[serde(default)]
    flags: BTreeMap<String, bool>,
}

#[derive(Debug, Clone)]
pub struct Preferences {
    path: Option<PathBuf>,
    data: PreferencesFile,
}

impl Preferences {
    /// Preferences that live only for this process.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            data: PreferencesFile::default(),
        }
    }

    /// Open the preferences file; a missing or corrupt file starts empty.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let data = match fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                warn!("Ignoring unreadable preferences file {:?}: {}", path, e);
                PreferencesFile::default()
            }),
            Err(_) => PreferencesFile::default(),
        };
        Self { path: Some(path), data }
    }

    pub fn flag(&self, key: &str) -> bool {
        self.data.flags.get(key).copied().unwrap_or(false)
    }

    pub fn set_flag(&mut self, key: &str, value: bool) -> Result<(), ConfigError> {
        self.data.flags.insert(key.to_string(), value);
        self.save()
    }

    fn save(&self) -> Result<(), ConfigError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        write_atomically(path, &serde_json::to_string_pretty(&self.data)?)
    }
}

fn write_atomically(path: &Path, content: &str) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, content)?;
    fs::rename(&tmp, path)?;
    Ok(())
}
