//! Atomic config + digest writer.
//!
//! ## `persist`: 5-step protocol
//!
//! 1. Ensure the destination's parent directory exists.
//! 2. Stage config and digest in the per-run scratch directory.
//! 3. Remove the old digest.
//! 4. Rename staged config to the destination.
//! 5. Rename staged digest into place.
//!
//! A crash between any two steps leaves either no digest (the next run
//! sees "changed") or a digest matching the config on disk.

use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::detector::ChangeDecision;
use crate::digest;
use crate::error::{io_err, SyncError};

// ---------------------------------------------------------------------------
// Write result
// ---------------------------------------------------------------------------

/// Outcome of a single config write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteResult {
    /// Config and digest were replaced.
    Written { path: PathBuf },
    /// Skipped: the stored digest matches the candidate.
    Unchanged { path: PathBuf },
    /// Dry-run mode: the config *would* have been written.
    WouldWrite { path: PathBuf },
}

impl WriteResult {
    pub fn is_change(&self) -> bool {
        !matches!(self, WriteResult::Unchanged { .. })
    }
}

// ---------------------------------------------------------------------------
// Scratch directory
// ---------------------------------------------------------------------------

/// Per-run scratch directory next to `dest`, so renames stay on one
/// filesystem. Removed when dropped.
pub fn scratch_dir_for(dest: &Path) -> Result<TempDir, SyncError> {
    let parent = parent_of(dest);
    std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
    tempfile::Builder::new()
        .prefix(".berth-")
        .tempdir_in(parent)
        .map_err(|e| io_err(parent, e))
}

fn parent_of(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

// ---------------------------------------------------------------------------
// persist
// ---------------------------------------------------------------------------

/// Write `rendered` to `dest` and its digest to `digest_path` when the
/// decision says so. The scratch directory lives only for this call.
pub fn persist(
    dest: &Path,
    digest_path: &Path,
    rendered: &str,
    decision: &ChangeDecision,
    dry_run: bool,
) -> Result<WriteResult, SyncError> {
    if !decision.changed {
        tracing::debug!("unchanged: {}", dest.display());
        return Ok(WriteResult::Unchanged {
            path: dest.to_path_buf(),
        });
    }

    if dry_run {
        tracing::info!("[dry-run] would write: {}", dest.display());
        return Ok(WriteResult::WouldWrite {
            path: dest.to_path_buf(),
        });
    }

    let scratch = scratch_dir_for(dest)?;
    write_config(dest, digest_path, rendered, &decision.new_digest, scratch.path())?;

    tracing::info!("wrote: {}", dest.display());
    Ok(WriteResult::Written {
        path: dest.to_path_buf(),
    })
}

/// Unconditionally replace `dest` and `digest_path`.
pub fn write_config(
    dest: &Path,
    digest_path: &Path,
    rendered: &str,
    digest: &str,
    scratch: &Path,
) -> Result<(), SyncError> {
    // Step 1: parent directories.
    let dest_parent = parent_of(dest);
    std::fs::create_dir_all(dest_parent).map_err(|e| io_err(dest_parent, e))?;
    let digest_parent = parent_of(digest_path);
    std::fs::create_dir_all(digest_parent).map_err(|e| io_err(digest_parent, e))?;

    // Step 2: stage both files.
    let staged_config = scratch.join("config");
    let staged_digest = scratch.join("digest");
    std::fs::write(&staged_config, rendered).map_err(|e| io_err(&staged_config, e))?;
    std::fs::write(&staged_digest, format!("{digest}\n")).map_err(|e| io_err(&staged_digest, e))?;

    // Step 3: the old digest no longer vouches for anything.
    digest::discard(digest_path)?;

    // Step 4: config.
    std::fs::rename(&staged_config, dest).map_err(|e| io_err(dest, e))?;

    // Step 5: digest; it may live on another filesystem than the scratch dir.
    if std::fs::rename(&staged_digest, digest_path).is_err() {
        std::fs::copy(&staged_digest, digest_path).map_err(|e| io_err(digest_path, e))?;
    }

    Ok(())
}

/// Remove a config and its digest. Returns whether the config existed.
pub fn remove_config(dest: &Path, digest_path: &Path) -> Result<bool, SyncError> {
    digest::discard(digest_path)?;
    match std::fs::remove_file(dest) {
        Ok(()) => {
            tracing::info!("removed: {}", dest.display());
            Ok(true)
        }
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(err) => Err(io_err(dest, err)),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detector::decide;
    use std::fs;

    fn run(dest: &Path, sum: &Path, rendered: &str, dry_run: bool) -> WriteResult {
        let decision = decide(rendered, dest, sum, dry_run).unwrap();
        persist(dest, sum, rendered, &decision, dry_run).unwrap()
    }

    #[test]
    fn first_write_returns_written() {
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("daemon.json");
        let sum = tmp.path().join(".checksum");
        let result = run(&dest, &sum, "{}\n", false);
        assert!(matches!(result, WriteResult::Written { .. }));
        assert_eq!(fs::read_to_string(&dest).unwrap(), "{}\n");
        let leftovers: Vec<_> = fs::read_dir(tmp.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().starts_with(".berth-"))
            .collect();
        assert!(leftovers.is_empty(), "scratch dir must be removed after write");
        assert_eq!(
            fs::read_to_string(&sum).unwrap().trim(),
            digest::compute("{}\n")
        );
    }

    #[test]
    fn second_write_same_content_returns_unchanged() {
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("daemon.json");
        let sum = tmp.path().join(".checksum");
        run(&dest, &sum, "{}\n", false);
        let result = run(&dest, &sum, "{}\n", false);
        assert!(matches!(result, WriteResult::Unchanged { .. }));
    }

    #[test]
    fn changed_content_returns_written() {
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("daemon.json");
        let sum = tmp.path().join(".checksum");
        run(&dest, &sum, "{}\n", false);
        let result = run(&dest, &sum, "{\"debug\": true}\n", false);
        assert!(matches!(result, WriteResult::Written { .. }));
    }

    #[test]
    fn dry_run_does_not_write_files() {
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("daemon.json");
        let sum = tmp.path().join(".checksum");
        let result = run(&dest, &sum, "{}\n", true);
        assert!(matches!(result, WriteResult::WouldWrite { .. }));
        assert!(!dest.exists(), "dry-run must not create files");
        assert!(!sum.exists());
    }

    #[test]
    fn scratch_dir_is_removed_on_drop() {
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("daemon.json");
        let scratch_path = {
            let scratch = scratch_dir_for(&dest).unwrap();
            scratch.path().to_path_buf()
        };
        assert!(!scratch_path.exists());
    }

    #[test]
    fn creates_parent_directories() {
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("etc").join("docker").join("daemon.json");
        let sum = tmp.path().join("etc").join("docker").join(".checksum");
        run(&dest, &sum, "{}\n", false);
        assert!(dest.exists());
        assert!(sum.exists());
    }

    #[test]
    fn remove_config_reports_presence() {
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("daemon.json");
        let sum = tmp.path().join(".checksum");
        run(&dest, &sum, "{}\n", false);
        assert!(remove_config(&dest, &sum).unwrap());
        assert!(!dest.exists() && !sum.exists());
        assert!(!remove_config(&dest, &sum).unwrap());
    }

    #[test]
    #[cfg(unix)]
    fn rename_failure_leaves_original_and_no_digest() {
        use std::os::unix::fs::PermissionsExt;

        let root = TempDir::new().unwrap();
        let readonly_dir = root.path().join("readonly");
        fs::create_dir_all(&readonly_dir).unwrap();
        let dest = readonly_dir.join("daemon.json");
        fs::write(&dest, "original").unwrap();
        let sum = root.path().join(".checksum");
        fs::write(&sum, "stale").unwrap();

        let mut perms = fs::metadata(&readonly_dir).unwrap().permissions();
        perms.set_mode(0o555);
        fs::set_permissions(&readonly_dir, perms).unwrap();

        let scratch = TempDir::new().unwrap();
        let result = write_config(&dest, &sum, "new content", "abc", scratch.path());

        let mut perms = fs::metadata(&readonly_dir).unwrap().permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&readonly_dir, perms).unwrap();

        // Running as root bypasses directory permissions; only assert on failure.
        if result.is_err() {
            assert_eq!(fs::read_to_string(&dest).unwrap(), "original");
            assert!(!sum.exists(), "a failed write must not leave a vouching digest");
        }
    }
}
