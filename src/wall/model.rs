//! Persisted wall of fame records.

use serde::{Deserialize, Deserializer, Serialize};

/// Lowest accepted reaction threshold.
pub const MIN_THRESHOLD: u32 = 1;
/// Highest accepted reaction threshold.
pub const MAX_THRESHOLD: u32 = 50;

/// Settings a freshly registered server starts with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerDefaults {
    pub prefix: char,
    pub react_threshold: u32,
    pub react_emoji: String,
    pub global_subscribe: bool,
}

impl Default for ServerDefaults {
    fn default() -> Self {
        Self {
            prefix: '-',
            react_threshold: 5,
            react_emoji: "\u{2B50}".to_string(),
            global_subscribe: true,
        }
    }
}

/// Per-server configuration, keyed by guild id in `config.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub wall_content: Vec<WallItem>,
    pub prefix: char,
    #[serde(deserialize_with = "threshold_from_number_or_string")]
    pub react_threshold: u32,
    pub react_emoji: String,
    #[serde(default = "default_global_subscribe")]
    pub global_subscribe: bool,
}

impl ServerConfig {
    pub fn new(defaults: &ServerDefaults) -> Self {
        Self {
            wall_content: Vec::new(),
            prefix: defaults.prefix,
            react_threshold: defaults.react_threshold,
            react_emoji: defaults.react_emoji.clone(),
            global_subscribe: defaults.global_subscribe,
        }
    }
}

fn default_global_subscribe() -> bool {
    true
}

/// Older config files stored the threshold as the raw command argument.
fn threshold_from_number_or_string<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u32),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

/// The user who wrote a nominated message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WallAuthor {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub username: String,
}

/// A nominated message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WallItem {
    pub message: String,
    pub author: WallAuthor,
    /// Creation time of the original message, epoch milliseconds.
    pub timestamp: i64,
    #[serde(default)]
    pub upvotes: u32,
    #[serde(default)]
    pub downvotes: u32,
    pub server_name: String,
}
