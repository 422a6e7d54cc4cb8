//! berth core library: desired-state types and the pure config builders.
//!
//! - [`types`]: [`CanonicalConfig`], [`Outcome`], state enums
//! - [`options`]: daemon option normalizer
//! - [`auth`]: registry credential validation and encoding
//! - [`formats`]: CLI table format strings
//! - [`log_driver`]: built-in vs. plugin log drivers
//! - [`desired`]: desired-state YAML loading
//! - [`paths`]: default artifact locations

pub mod auth;
pub mod desired;
pub mod error;
pub mod formats;
pub mod log_driver;
pub mod options;
pub mod paths;
pub mod types;

pub use auth::{AuthEntry, AuthError, AuthKind, AuthPolicy, AuthReport};
pub use desired::{ClientConfigSpec, DaemonConfigSpec, DesiredState, PluginSpec};
pub use error::CoreError;
pub use formats::FormatCategory;
pub use log_driver::LogDriver;
pub use options::{normalize, ConfigOption, Normalized, OptionKind};
pub use types::{CanonicalConfig, ConfigState, Outcome, PluginState};
