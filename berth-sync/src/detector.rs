//! Digest-gated change decision.

use std::path::Path;

use crate::digest;
use crate::error::SyncError;

/// Whether a candidate config differs from what was last written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeDecision {
    pub changed: bool,
    pub new_digest: String,
    pub old_digest: Option<String>,
}

/// Decide whether `rendered` must be written to `dest`.
///
/// A digest whose config file has gone missing is stale: it is discarded
/// (left in place under `dry_run`) and treated as absent, so a manually
/// deleted config is always recreated.
pub fn decide(
    rendered: &str,
    dest: &Path,
    digest_path: &Path,
    dry_run: bool,
) -> Result<ChangeDecision, SyncError> {
    let new_digest = digest::compute(rendered);

    let old_digest = if dest.exists() {
        digest::load(digest_path)?
    } else {
        if !dry_run && digest::discard(digest_path)? {
            tracing::info!(
                "discarded stale digest {} (config {} missing)",
                digest_path.display(),
                dest.display()
            );
        }
        None
    };

    let changed = old_digest.as_deref() != Some(new_digest.as_str());
    tracing::debug!(
        "{}: digest {} -> {} (changed: {changed})",
        dest.display(),
        old_digest.as_deref().unwrap_or("<none>"),
        new_digest
    );

    Ok(ChangeDecision {
        changed,
        new_digest,
        old_digest,
    })
}
