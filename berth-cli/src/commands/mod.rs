pub mod client;
pub mod config;
pub mod plugin;
pub mod plugins;
pub mod version;
