//! `berth version`: daemon and API versions.

use berth_core::Outcome;
use berth_daemon::probe_version;

use crate::GlobalArgs;

pub fn run(global: &GlobalArgs) -> Outcome {
    probe_version(&global.client())
}
