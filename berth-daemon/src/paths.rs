use std::path::{Path, PathBuf};

/// Control socket of the local daemon.
pub const DEFAULT_SOCKET: &str = "/run/berth/daemon.sock";

/// Directory holding plugin descriptors.
pub const PLUGIN_CACHE_DIR: &str = "/var/cache/berth";

pub fn descriptor_path(cache_dir: &Path, alias: &str) -> PathBuf {
    cache_dir.join(format!("plugin_{alias}.json"))
}
