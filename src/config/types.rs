//! Configuration type definitions.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::common::error::ConfigError;
use crate::wall::emoji::normalize_emoji;
use crate::wall::ServerDefaults;

/// Root configuration structure. Every section is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub discord: DiscordConfig,
    pub storage: StorageConfig,
    pub portal: PortalConfig,
    pub wall: WallConfig,
    pub defaults: DefaultsConfig,
}

/// Discord login.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DiscordConfig {
    /// Bot token. Takes precedence over `token_file` when non-empty.
    pub token: String,
    /// File holding the bare token.
    pub token_file: String,
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            token_file: "login.key".to_string(),
        }
    }
}

impl DiscordConfig {
    /// The token to log in with, read from `token_file` if not set inline.
    pub fn resolve_token(&self) -> Result<String, ConfigError> {
        let token = if self.token.trim().is_empty() {
            let path = Path::new(&self.token_file);
            std::fs::read_to_string(path)
                .map_err(|e| ConfigError::IoError {
                    path: path.display().to_string(),
                    source: e,
                })?
                .trim()
                .to_string()
        } else {
            self.token.trim().to_string()
        };

        if token.is_empty() {
            return Err(ConfigError::MissingField {
                field: "discord.token".to_string(),
            });
        }
        Ok(token)
    }
}

/// Locations of the JSON stores.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub config_file: PathBuf,
    pub global_file: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            config_file: PathBuf::from("config.json"),
            global_file: PathBuf::from("global.json"),
        }
    }
}

/// Web portal settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PortalConfig {
    pub enabled: bool,
    pub bind: String,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bind: "0.0.0.0:2243".to_string(),
        }
    }
}

impl PortalConfig {
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.bind.parse().map_err(|_| ConfigError::ValidationError {
            message: format!("portal.bind '{}' is not a socket address", self.bind),
        })
    }
}

/// Wall channel maintenance.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WallConfig {
    /// Seconds between full wall rebuilds. 0 disables the timer.
    pub refresh_interval_secs: u64,
}

impl WallConfig {
    pub fn refresh_interval(&self) -> Option<Duration> {
        (self.refresh_interval_secs > 0).then(|| Duration::from_secs(self.refresh_interval_secs))
    }
}

/// Settings given to a server the first time it is seen.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DefaultsConfig {
    pub prefix: String,
    pub react_threshold: u32,
    pub react_emoji: String,
    pub global_subscribe: bool,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        let defaults = ServerDefaults::default();
        Self {
            prefix: defaults.prefix.to_string(),
            react_threshold: defaults.react_threshold,
            react_emoji: defaults.react_emoji,
            global_subscribe: defaults.global_subscribe,
        }
    }
}

impl DefaultsConfig {
    /// Convert to per-server defaults. Expects a validated config.
    pub fn server_defaults(&self) -> ServerDefaults {
        let fallback = ServerDefaults::default();
        ServerDefaults {
            prefix: self.prefix.chars().next().unwrap_or(fallback.prefix),
            react_threshold: self.react_threshold,
            react_emoji: normalize_emoji(&self.react_emoji),
            global_subscribe: self.global_subscribe,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.discord.token_file, "login.key");
        assert_eq!(config.storage.config_file, PathBuf::from("config.json"));
        assert_eq!(config.storage.global_file, PathBuf::from("global.json"));
        assert!(config.portal.enabled);
        assert_eq!(config.portal.bind_addr().unwrap().port(), 2243);
        assert_eq!(config.wall.refresh_interval(), None);

        let defaults = config.defaults.server_defaults();
        assert_eq!(defaults.prefix, '-');
        assert_eq!(defaults.react_threshold, 5);
        assert_eq!(defaults.react_emoji, "\u{2B50}");
        assert!(defaults.global_subscribe);
    }

    #[test]
    fn test_refresh_interval() {
        let wall = WallConfig {
            refresh_interval_secs: 90,
        };
        assert_eq!(wall.refresh_interval(), Some(Duration::from_secs(90)));
    }

    #[test]
    fn test_shortcode_emoji_default() {
        let defaults = DefaultsConfig {
            react_emoji: ":fire:".to_string(),
            ..Default::default()
        };
        assert_eq!(defaults.server_defaults().react_emoji, "🔥");
    }

    #[test]
    fn test_inline_token_wins() {
        let discord = DiscordConfig {
            token: "  abc.def  ".to_string(),
            token_file: "/nonexistent/login.key".to_string(),
        };
        assert_eq!(discord.resolve_token().unwrap(), "abc.def");
    }

    #[test]
    fn test_token_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("login.key");
        std::fs::write(&path, "file-token\n").unwrap();

        let discord = DiscordConfig {
            token: String::new(),
            token_file: path.display().to_string(),
        };
        assert_eq!(discord.resolve_token().unwrap(), "file-token");
    }

    #[test]
    fn test_missing_token_file() {
        let discord = DiscordConfig {
            token: String::new(),
            token_file: "/nonexistent/login.key".to_string(),
        };
        assert!(matches!(
            discord.resolve_token(),
            Err(ConfigError::IoError { .. })
        ));
    }

    #[test]
    fn test_empty_token_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("login.key");
        std::fs::write(&path, "   \n").unwrap();

        let discord = DiscordConfig {
            token: String::new(),
            token_file: path.display().to_string(),
        };
        assert!(matches!(
            discord.resolve_token(),
            Err(ConfigError::MissingField { .. })
        ));
    }
}
