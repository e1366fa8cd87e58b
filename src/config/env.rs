//! Environment variable overrides for configuration.
//!
//! Supports overriding config values with environment variables:
//! - `WOF_DISCORD_TOKEN` - Discord bot token
//! - `WOF_TOKEN_FILE` - File holding the token
//! - `WOF_CONFIG_FILE` - Server config store
//! - `WOF_GLOBAL_FILE` - Global wall store
//! - `WOF_PORTAL_BIND` - Web portal bind address
//! - `WOF_REFRESH_INTERVAL_SECS` - Wall refresh period, 0 disables

use std::env;
use std::path::PathBuf;

use tracing::warn;

use crate::config::types::Config;

/// Environment variable prefix for all config overrides.
const ENV_PREFIX: &str = "WOF";

/// Apply environment variable overrides to a config.
pub fn apply_env_overrides(config: Config) -> Config {
    apply_overrides(config, |key| env::var(key).ok())
}

fn apply_overrides(mut config: Config, lookup: impl Fn(&str) -> Option<String>) -> Config {
    let var = |name: &str| lookup(&format!("{}_{}", ENV_PREFIX, name));

    if let Some(token) = var("DISCORD_TOKEN") {
        config.discord.token = token;
    }
    if let Some(path) = var("TOKEN_FILE") {
        config.discord.token_file = path;
    }

    if let Some(path) = var("CONFIG_FILE") {
        config.storage.config_file = PathBuf::from(path);
    }
    if let Some(path) = var("GLOBAL_FILE") {
        config.storage.global_file = PathBuf::from(path);
    }

    if let Some(bind) = var("PORTAL_BIND") {
        config.portal.bind = bind;
    }

    if let Some(secs) = var("REFRESH_INTERVAL_SECS") {
        match secs.trim().parse() {
            Ok(secs) => config.wall.refresh_interval_secs = secs,
            Err(_) => warn!("Ignoring {}_REFRESH_INTERVAL_SECS='{}'", ENV_PREFIX, secs),
        }
    }

    config
}

/// Get the config file path from environment or use default.
///
/// Checks `WOF_CONFIG`, otherwise returns "wall-of-fame.conf".
pub fn get_config_path() -> String {
    env::var(format!("{}_CONFIG", ENV_PREFIX)).unwrap_or_else(|_| "wall-of-fame.conf".to_string())
}
