//! Digest file: SHA-256-based idempotency tracking for a config artifact.
//!
//! The digest file holds one line: the hex SHA-256 of the exact bytes last
//! written to the config it guards. It is the only input to the change
//! decision; file timestamps are never consulted.

use std::io::ErrorKind;
use std::path::Path;

use sha2::{Digest, Sha256};

use crate::error::{io_err, SyncError};

/// Hex SHA-256 of `content`.
pub fn compute(content: &str) -> String {
    let mut h = Sha256::new();
    h.update(content.as_bytes());
    hex::encode(h.finalize())
}

/// Load the stored digest at `path`.
///
/// Returns `None` if the file does not exist or its first line is empty.
pub fn load(path: &Path) -> Result<Option<String>, SyncError> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(io_err(path, err)),
    };
    let first = contents.lines().next().unwrap_or("").trim();
    if first.is_empty() {
        return Ok(None);
    }
    Ok(Some(first.to_string()))
}

/// Remove the digest file if present. Returns whether a file was removed.
pub fn discard(path: &Path) -> Result<bool, SyncError> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
        Err(err) => Err(io_err(path, err)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn compute_is_stable_hex() {
        let a = compute("{}\n");
        assert_eq!(a, compute("{}\n"));
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, compute("{ }\n"));
    }

    #[test]
    fn missing_file_loads_none() {
        let tmp = TempDir::new().unwrap();
        assert_eq!(load(&tmp.path().join(".checksum")).unwrap(), None);
    }

    #[test]
    fn load_trims_first_line() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(".checksum");
        std::fs::write(&path, "  deadbeef  \nleftover\n").unwrap();
        assert_eq!(load(&path).unwrap().as_deref(), Some("deadbeef"));
    }

    #[test]
    fn empty_file_loads_none() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(".checksum");
        std::fs::write(&path, "\n").unwrap();
        assert_eq!(load(&path).unwrap(), None);
    }

    #[test]
    fn discard_reports_presence() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(".checksum");
        std::fs::write(&path, "cafebabe").unwrap();
        assert!(discard(&path).unwrap());
        assert!(!discard(&path).unwrap());
        assert!(!path.exists());
    }
}
