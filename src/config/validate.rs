//! Configuration validation.
//!
//! Every problem is collected so a bad config is reported in one go.

use crate::common::error::ConfigError;
use crate::config::types::Config;
use crate::wall::model::{MAX_THRESHOLD, MIN_THRESHOLD};

/// Validate a configuration and return detailed errors.
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let mut errors = Vec::new();

    let prefix_len = config.defaults.prefix.chars().count();
    if prefix_len != 1 {
        errors.push(format!(
            "defaults.prefix must be exactly one character (got {})",
            prefix_len
        ));
    }
    let threshold = config.defaults.react_threshold;
    if !(MIN_THRESHOLD..=MAX_THRESHOLD).contains(&threshold) {
        errors.push(format!(
            "defaults.react_threshold must be between {} and {} (got {})",
            MIN_THRESHOLD, MAX_THRESHOLD, threshold
        ));
    }
    if config.defaults.react_emoji.trim().is_empty() {
        errors.push("defaults.react_emoji is required".to_string());
    }

    if config.storage.config_file.as_os_str().is_empty() {
        errors.push("storage.config_file is required".to_string());
    }
    if config.storage.global_file.as_os_str().is_empty() {
        errors.push("storage.global_file is required".to_string());
    }
    if config.storage.config_file == config.storage.global_file {
        errors.push("storage.config_file and storage.global_file must differ".to_string());
    }

    if let Err(e) = config.portal.bind_addr() {
        errors.push(match e {
            ConfigError::ValidationError { message } => message,
            other => other.to_string(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError {
            message: errors.join("\n"),
        })
    }
}
