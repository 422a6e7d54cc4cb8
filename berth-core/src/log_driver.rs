//! Log driver classification: built-in driver or `name:version` plugin.

use std::fmt;

use crate::error::CoreError;

pub const BUILTIN_LOG_DRIVERS: &[&str] = &[
    "awslogs",
    "fluentd",
    "gcplogs",
    "gelf",
    "journald",
    "json-file",
    "local",
    "logentries",
    "none",
    "splunk",
    "syslog",
];

const EXPECTED_FORMAT: &str = "use the format $driver:$driver_version";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogDriver {
    Builtin(String),
    Plugin { name: String, version: String },
}

impl LogDriver {
    pub fn parse(driver: &str) -> Result<Self, CoreError> {
        if BUILTIN_LOG_DRIVERS.contains(&driver) {
            return Ok(LogDriver::Builtin(driver.to_string()));
        }

        let Some((name, version)) = driver.split_once(':') else {
            return Err(CoreError::LogDriver {
                driver: driver.to_string(),
                reason: format!("not a built-in driver; {EXPECTED_FORMAT}"),
            });
        };
        if name.is_empty() || version.is_empty() {
            return Err(CoreError::LogDriver {
                driver: driver.to_string(),
                reason: format!("plugin name or version is missing; {EXPECTED_FORMAT}"),
            });
        }

        Ok(LogDriver::Plugin {
            name: name.to_string(),
            version: version.to_string(),
        })
    }

    pub fn is_plugin(&self) -> bool {
        matches!(self, LogDriver::Plugin { .. })
    }
}

impl fmt::Display for LogDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogDriver::Builtin(name) => f.write_str(name),
            LogDriver::Plugin { name, version } => write!(f, "{name}:{version}"),
        }
    }
}
