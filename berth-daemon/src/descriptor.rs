//! Cached record of the last activated plugin, one JSON file per alias.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{io_err, DaemonError};
use crate::paths::descriptor_path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginDescriptor {
    pub id: String,
    /// Local name, `alias:version`.
    pub name: String,
    /// Alias without the version.
    pub short_name: String,
    pub version: String,
    pub enabled: bool,
    /// Remote reference installed from.
    pub source: String,
    pub activated_at: DateTime<Utc>,
}

/// Write the descriptor atomically (temp file + rename).
pub fn save(cache_dir: &Path, descriptor: &PluginDescriptor) -> Result<PathBuf, DaemonError> {
    std::fs::create_dir_all(cache_dir).map_err(|e| io_err(cache_dir, e))?;
    let path = descriptor_path(cache_dir, &descriptor.short_name);
    let tmp = path.with_extension("json.tmp");

    let mut content = serde_json::to_string_pretty(descriptor)?;
    content.push('\n');
    std::fs::write(&tmp, content).map_err(|e| io_err(&tmp, e))?;
    std::fs::rename(&tmp, &path).map_err(|e| io_err(&path, e))?;
    tracing::debug!(path = %path.display(), "plugin descriptor saved");
    Ok(path)
}

pub fn load(cache_dir: &Path, alias: &str) -> Result<Option<PluginDescriptor>, DaemonError> {
    let path = descriptor_path(cache_dir, alias);
    match std::fs::read_to_string(&path) {
        Ok(content) => Ok(Some(serde_json::from_str(&content)?)),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(io_err(&path, err)),
    }
}

/// Returns whether a descriptor existed.
pub fn delete(cache_dir: &Path, alias: &str) -> Result<bool, DaemonError> {
    let path = descriptor_path(cache_dir, alias);
    match std::fs::remove_file(&path) {
        Ok(()) => Ok(true),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(err) => Err(io_err(&path, err)),
    }
}
