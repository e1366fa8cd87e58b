//! JSON-backed stores for server configs and the global wall.
//!
//! Both stores keep their whole content in memory and rewrite the backing
//! file in full after every mutation. There is no transaction spanning the
//! two files.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serenity::model::id::GuildId;
use tracing::{debug, info};

use crate::common::error::{StoreError, StoreResult};
use crate::wall::model::{ServerConfig, ServerDefaults, WallItem};

/// A JSON document on disk.
#[derive(Debug, Clone)]
pub struct JsonFile {
    path: PathBuf,
}

impl JsonFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the document, or `T::default()` when the file does not exist yet.
    pub fn load<T: DeserializeOwned + Default>(&self) -> StoreResult<T> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("{} not found, starting empty", self.path.display());
                return Ok(T::default());
            }
            Err(source) => {
                return Err(StoreError::Io {
                    path: self.path.display().to_string(),
                    source,
                })
            }
        };

        if raw.trim().is_empty() {
            return Ok(T::default());
        }

        serde_json::from_str(&raw).map_err(|source| StoreError::Json {
            path: self.path.display().to_string(),
            source,
        })
    }

    /// Overwrite the document with `value`.
    pub fn save<T: Serialize>(&self, value: &T) -> StoreResult<()> {
        let json = serde_json::to_string(value).map_err(|source| StoreError::Json {
            path: self.path.display().to_string(),
            source,
        })?;

        fs::write(&self.path, json).map_err(|source| StoreError::Io {
            path: self.path.display().to_string(),
            source,
        })?;

        debug!("Wrote {}", self.path.display());
        Ok(())
    }
}

/// Server id -> [`ServerConfig`], mirrored to `config.json`.
#[derive(Debug)]
pub struct ConfigStore {
    file: JsonFile,
    servers: BTreeMap<u64, ServerConfig>,
}

impl ConfigStore {
    pub fn load(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let file = JsonFile::new(path);
        let servers: BTreeMap<u64, ServerConfig> = file.load()?;
        info!(
            "Loaded {} server configs from {}",
            servers.len(),
            file.path().display()
        );
        Ok(Self { file, servers })
    }

    pub fn get(&self, guild_id: GuildId) -> Option<&ServerConfig> {
        self.servers.get(&guild_id.get())
    }

    pub fn contains(&self, guild_id: GuildId) -> bool {
        self.servers.contains_key(&guild_id.get())
    }

    pub fn len(&self) -> usize {
        self.servers.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.servers.is_empty()
    }

    /// Create a default config for `guild_id` unless one exists.
    ///
    /// Returns `true` if a new entry was created and persisted.
    pub fn insert_default(
        &mut self,
        guild_id: GuildId,
        defaults: &ServerDefaults,
    ) -> StoreResult<bool> {
        if self.contains(guild_id) {
            return Ok(false);
        }
        self.servers
            .insert(guild_id.get(), ServerConfig::new(defaults));
        self.save()?;
        Ok(true)
    }

    /// Drop the config for `guild_id`, persisting if anything was removed.
    pub fn remove(&mut self, guild_id: GuildId) -> StoreResult<Option<ServerConfig>> {
        let removed = self.servers.remove(&guild_id.get());
        if removed.is_some() {
            self.save()?;
        }
        Ok(removed)
    }

    pub fn set_prefix(&mut self, guild_id: GuildId, prefix: char) -> StoreResult<()> {
        self.update(guild_id, |config| config.prefix = prefix)
    }

    pub fn set_threshold(&mut self, guild_id: GuildId, threshold: u32) -> StoreResult<()> {
        self.update(guild_id, |config| config.react_threshold = threshold)
    }

    pub fn push_wall_item(&mut self, guild_id: GuildId, item: WallItem) -> StoreResult<()> {
        self.update(guild_id, |config| config.wall_content.push(item))
    }

    fn update(
        &mut self,
        guild_id: GuildId,
        apply: impl FnOnce(&mut ServerConfig),
    ) -> StoreResult<()> {
        let config = self
            .servers
            .get_mut(&guild_id.get())
            .ok_or(StoreError::UnknownServer {
                guild_id: guild_id.get(),
            })?;
        apply(config);
        self.save()
    }

    pub fn save(&self) -> StoreResult<()> {
        self.file.save(&self.servers)
    }
}

/// Every nomination across all servers in arrival order, mirrored to `global.json`.
#[derive(Debug)]
pub struct GlobalWall {
    file: JsonFile,
    items: Vec<WallItem>,
}

impl GlobalWall {
    pub fn load(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let file = JsonFile::new(path);
        let items: Vec<WallItem> = file.load()?;
        info!(
            "Loaded {} global wall entries from {}",
            items.len(),
            file.path().display()
        );
        Ok(Self { file, items })
    }

    pub fn items(&self) -> &[WallItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn append(&mut self, item: WallItem) -> StoreResult<()> {
        self.items.push(item);
        self.file.save(&self.items)
    }
}
