//! Default locations for config artifacts.
//!
//! Home-relative helpers come in two forms, following the `_at` convention:
//! - `fn_at(home: &Path, …)`: explicit home; used in tests with `TempDir`
//! - `fn(…)`: derives home from `dirs::home_dir()`, delegates to `_at`

use std::path::{Path, PathBuf};

use crate::error::CoreError;

pub const DAEMON_CONFIG: &str = "/etc/docker/daemon.json";
pub const DAEMON_CHECKSUM: &str = "/etc/docker/.checksum";
pub const DESIRED_STATE: &str = "/etc/berth/desired.yaml";

/// `<location>.checksum`: digest sibling of a client config.
pub fn client_checksum_path(location: &Path) -> PathBuf {
    let mut name = location.as_os_str().to_owned();
    name.push(".checksum");
    PathBuf::from(name)
}

/// Replace a leading `~` component with `home`.
pub fn expand_home_at(home: &Path, path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => home.join(rest),
        Err(_) => path.to_path_buf(),
    }
}

/// `expand_home_at` convenience wrapper. Paths without `~` never touch `$HOME`.
pub fn expand_home(path: &Path) -> Result<PathBuf, CoreError> {
    if !path.starts_with("~") {
        return Ok(path.to_path_buf());
    }
    Ok(expand_home_at(&home()?, path))
}

fn home() -> Result<PathBuf, CoreError> {
    dirs::home_dir().ok_or(CoreError::HomeNotFound)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checksum_sits_next_to_location() {
        assert_eq!(
            client_checksum_path(Path::new("/root/.docker/config.json")),
            PathBuf::from("/root/.docker/config.json.checksum")
        );
    }

    #[test]
    fn tilde_expands_against_home() {
        let home = Path::new("/home/ops");
        assert_eq!(
            expand_home_at(home, Path::new("~/.docker/config.json")),
            PathBuf::from("/home/ops/.docker/config.json")
        );
        assert_eq!(
            expand_home_at(home, Path::new("/etc/docker/daemon.json")),
            PathBuf::from("/etc/docker/daemon.json")
        );
    }
}
