//! Gateway event handling.
//!
//! `WallHandler` owns the stores and reacts to the events the bot cares
//! about. It is driven by a single loop in `client`, so no two events are
//! handled at the same time and the stores need no locking.

use std::collections::BTreeSet;
use std::sync::Arc;

use serenity::model::id::GuildId;
use tracing::{debug, error, info, warn};

use crate::discord::commands::{CommandHandler, IncomingMessage};
use crate::discord::platform::ChatPlatform;
use crate::wall::nomination::{self, Candidate};
use crate::wall::{ConfigStore, GlobalWall, ServerDefaults, WallItem, WallManager};

/// A server the bot is in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuildRef {
    pub id: GuildId,
    pub name: String,
}

/// Event handler holding all mutable bot state.
pub struct WallHandler<P: ?Sized> {
    configs: ConfigStore,
    global: GlobalWall,
    defaults: ServerDefaults,
    walls: WallManager<P>,
    commands: CommandHandler<P>,
    known_guilds: BTreeSet<GuildId>,
}

impl<P: ChatPlatform + ?Sized> WallHandler<P> {
    pub fn new(
        platform: Arc<P>,
        configs: ConfigStore,
        global: GlobalWall,
        defaults: ServerDefaults,
    ) -> Self {
        Self {
            configs,
            global,
            defaults,
            walls: WallManager::new(Arc::clone(&platform)),
            commands: CommandHandler::new(platform),
            known_guilds: BTreeSet::new(),
        }
    }

    #[cfg(test)]
    pub fn configs(&self) -> &ConfigStore {
        &self.configs
    }

    #[cfg(test)]
    pub fn global(&self) -> &GlobalWall {
        &self.global
    }

    /// Connection is up: remember the servers and reset every wall.
    pub async fn handle_ready(&mut self, guilds: impl IntoIterator<Item = GuildId>) {
        self.known_guilds.extend(guilds);
        info!("Ready in {} servers", self.known_guilds.len());
        self.refresh_all().await;
    }

    /// Guild data arrived. Only a fresh invite counts as a join.
    pub async fn handle_guild_create(
        &mut self,
        guild: GuildRef,
        is_new: Option<bool>,
    ) -> anyhow::Result<()> {
        if is_new != Some(true) {
            debug!("Already in server '{}' ({})", guild.name, guild.id);
            return Ok(());
        }
        self.handle_guild_join(guild).await
    }

    /// The bot left a server, or the server is in an outage.
    pub fn handle_guild_delete(&mut self, guild_id: GuildId, unavailable: bool) -> anyhow::Result<()> {
        if unavailable {
            warn!("Server {} became unavailable", guild_id);
            return Ok(());
        }
        self.handle_guild_remove(guild_id)
    }

    async fn handle_guild_join(&mut self, guild: GuildRef) -> anyhow::Result<()> {
        info!("Joined server '{}' ({})", guild.name, guild.id);
        self.known_guilds.insert(guild.id);

        // A missing channel has already been reported to the server; the
        // config and greeting are still worth having.
        let wall_ready = match self.walls.ensure(guild.id).await {
            Ok(_) => true,
            Err(e) => {
                warn!("Setting up '{}' without a wall: {}", guild.name, e);
                false
            }
        };
        if self.configs.contains(guild.id) {
            return Ok(());
        }

        self.configs.insert_default(guild.id, &self.defaults)?;
        if wall_ready {
            if let Err(e) = self.refresh(guild.id).await {
                error!("Failed to refresh wall of {}: {}", guild.id, e);
            }
        }

        let greeting = format!(
            "Hello! Thanks for inviting me to your server. I shall do my setup and we'll be ready to go! My prefix is {}",
            self.defaults.prefix
        );
        self.walls.announce(guild.id, &greeting).await?;
        Ok(())
    }

    fn handle_guild_remove(&mut self, guild_id: GuildId) -> anyhow::Result<()> {
        self.known_guilds.remove(&guild_id);
        if self.configs.remove(guild_id)?.is_some() {
            info!("Removed config of server {}", guild_id);
        }
        Ok(())
    }

    pub async fn handle_message(&mut self, msg: IncomingMessage) -> anyhow::Result<()> {
        if msg.author_is_bot {
            return Ok(());
        }
        let Some(guild_id) = msg.guild_id else {
            return Ok(());
        };

        if self.configs.insert_default(guild_id, &self.defaults)? {
            info!("Created missing config for server {}", guild_id);
        }

        self.commands
            .handle_command(&mut self.configs, guild_id, &msg)
            .await?;
        Ok(())
    }

    /// A reaction was added to `candidate` in `guild`.
    ///
    /// Returns the number of wall entries created.
    pub async fn handle_reaction(
        &mut self,
        guild: &GuildRef,
        candidate: &Candidate,
    ) -> anyhow::Result<usize> {
        let Some(config) = self.configs.get(guild.id) else {
            debug!("Ignoring reaction in unconfigured server {}", guild.id);
            return Ok(0);
        };

        let hits = nomination::nominations(config, &candidate.reactions);
        for _ in 0..hits {
            let item = nomination::wall_item(candidate, &guild.name);
            self.nominate(guild.id, item).await?;
        }
        Ok(hits)
    }

    async fn nominate(&mut self, guild_id: GuildId, item: WallItem) -> anyhow::Result<()> {
        info!(
            "Nominated message by {} in '{}'",
            item.author.username, item.server_name
        );

        self.configs.push_wall_item(guild_id, item.clone())?;
        self.global.append(item.clone())?;
        self.walls.append(guild_id, &item).await?;
        Ok(())
    }

    /// Reset the wall of every known server.
    pub async fn refresh_all(&mut self) {
        let guilds: Vec<GuildId> = self.known_guilds.iter().copied().collect();
        for guild_id in guilds {
            if let Err(e) = self.refresh(guild_id).await {
                error!("Failed to refresh wall of {}: {}", guild_id, e);
            }
        }
    }

    async fn refresh(&self, guild_id: GuildId) -> anyhow::Result<()> {
        let items: &[WallItem] = match self.configs.get(guild_id) {
            Some(config) if !config.global_subscribe => &config.wall_content,
            Some(_) => self.global.items(),
            None => {
                warn!("Refreshing wall of {} without a config", guild_id);
                self.global.items()
            }
        };
        self.walls.refresh(guild_id, items).await?;
        Ok(())
    }
}
