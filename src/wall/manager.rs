//! The per-server `wall_of_fame` channel.
//!
//! The channel is an append-only feed. A refresh recreates it (clone, then
//! delete the original) so the replayed wall starts at the top of a fresh
//! channel.

use std::sync::Arc;

use serenity::model::id::{ChannelId, GuildId};
use tracing::{debug, error, info, warn};

use crate::common::error::{PlatformError, PlatformResult};
use crate::discord::platform::{ChannelRef, ChatPlatform};
use crate::wall::model::WallItem;

/// Name of the channel the wall lives in.
pub const WALL_CHANNEL_NAME: &str = "wall_of_fame";

/// First message of every wall channel.
pub const BANNER: &str =
    "**This is the Wall of Fame! This is where all of my wall of fame nominations will be posted.**";

pub const UPVOTE_EMOJI: &str = "🔼";
pub const DOWNVOTE_EMOJI: &str = "🔽";

/// Channel names used for greetings and error reports, most preferred first.
pub const REPORTING_CHANNELS: [&str; 4] = ["bot_channel", "bot_chat", "bot", "general"];

/// Find the wall channel in a channel list.
pub fn locate_wall(channels: &[ChannelRef]) -> Option<&ChannelRef> {
    channels.iter().find(|c| c.name == WALL_CHANNEL_NAME)
}

/// Pick the channel greetings and error reports go to.
///
/// Only the head of [`REPORTING_CHANNELS`] is matched exactly. Failing that,
/// the first channel with `bot` in its name is used, then the first channel.
pub fn find_reporting_channel(channels: &[ChannelRef]) -> Option<&ChannelRef> {
    let preferred = REPORTING_CHANNELS[0];
    let mut backup = None;

    for channel in channels {
        if channel.name == preferred {
            return Some(channel);
        }
        if backup.is_none() && channel.name.contains("bot") {
            backup = Some(channel);
        }
    }

    backup.or_else(|| channels.first())
}

/// Render a wall entry as posted in the channel.
pub fn format_wall_item(item: &WallItem) -> String {
    format!(
        "*\"{}\"* \n@{}  {} {} {} {} from {}",
        item.message,
        item.author.username,
        UPVOTE_EMOJI,
        item.upvotes,
        DOWNVOTE_EMOJI,
        item.downvotes,
        item.server_name
    )
}

/// Creates, resets and posts into wall channels.
pub struct WallManager<P: ?Sized> {
    platform: Arc<P>,
}

impl<P: ?Sized> Clone for WallManager<P> {
    fn clone(&self) -> Self {
        Self {
            platform: Arc::clone(&self.platform),
        }
    }
}

impl<P: ChatPlatform + ?Sized> WallManager<P> {
    pub fn new(platform: Arc<P>) -> Self {
        Self { platform }
    }

    pub async fn locate(&self, guild_id: GuildId) -> PlatformResult<Option<ChannelRef>> {
        let channels = self.platform.channels(guild_id).await?;
        Ok(locate_wall(&channels).cloned())
    }

    /// Return the wall channel, creating it (with banner) if missing.
    pub async fn ensure(&self, guild_id: GuildId) -> PlatformResult<ChannelRef> {
        if let Some(channel) = self.locate(guild_id).await? {
            return Ok(channel);
        }

        info!("No #{} in {}, creating it", WALL_CHANNEL_NAME, guild_id);
        match self.platform.create_channel(guild_id, WALL_CHANNEL_NAME).await {
            Ok(channel) => {
                self.platform.send(channel.id, BANNER).await?;
                Ok(channel)
            }
            Err(e) => {
                error!("Failed to create #{} in {}: {}", WALL_CHANNEL_NAME, guild_id, e);
                self.report_error(guild_id, "create wall_of_fame channel", &e)
                    .await;
                Err(e)
            }
        }
    }

    /// Recreate the wall channel and replay `items` into it.
    pub async fn refresh(&self, guild_id: GuildId, items: &[WallItem]) -> PlatformResult<ChannelRef> {
        let old = self.ensure(guild_id).await?;
        let fresh = self.platform.clone_channel(guild_id, &old).await?;
        self.platform.delete_channel(old.id).await?;
        self.platform.send(fresh.id, BANNER).await?;

        for item in items {
            self.post_item(fresh.id, item).await?;
        }

        info!(
            "Refreshed #{} in {} with {} entries",
            WALL_CHANNEL_NAME,
            guild_id,
            items.len()
        );
        Ok(fresh)
    }

    /// Post one new entry without resetting the channel.
    pub async fn append(&self, guild_id: GuildId, item: &WallItem) -> PlatformResult<()> {
        let channel = self.ensure(guild_id).await?;
        self.post_item(channel.id, item).await
    }

    async fn post_item(&self, channel_id: ChannelId, item: &WallItem) -> PlatformResult<()> {
        let message_id = self.platform.send(channel_id, &format_wall_item(item)).await?;
        self.platform
            .react(channel_id, message_id, UPVOTE_EMOJI)
            .await?;
        self.platform
            .react(channel_id, message_id, DOWNVOTE_EMOJI)
            .await?;
        Ok(())
    }

    /// Resolve the reporting channel of a server.
    pub async fn reporting_channel(&self, guild_id: GuildId) -> PlatformResult<Option<ChannelRef>> {
        let channels = self.platform.channels(guild_id).await?;
        Ok(find_reporting_channel(&channels).cloned())
    }

    /// Post `text` to the reporting channel, if the server has one.
    pub async fn announce(&self, guild_id: GuildId, text: &str) -> PlatformResult<()> {
        match self.reporting_channel(guild_id).await? {
            Some(channel) => {
                debug!("Announcing in #{} ({})", channel.name, channel.id);
                self.platform.send(channel.id, text).await?;
            }
            None => warn!("No channel to announce in for {}", guild_id),
        }
        Ok(())
    }

    /// Tell the server something went wrong. Failures here are only logged.
    pub async fn report_error(&self, guild_id: GuildId, about: &str, cause: &PlatformError) {
        let channel = match self.reporting_channel(guild_id).await {
            Ok(Some(channel)) => channel,
            Ok(None) => {
                warn!("No channel to report '{}' in for {}", about, guild_id);
                return;
            }
            Err(e) => {
                warn!("Could not list channels of {}: {}", guild_id, e);
                return;
            }
        };

        let title = format!("There was an error trying to {}", about);
        if let Err(e) = self
            .platform
            .send_embed(channel.id, &title, "Reason", &cause.to_string())
            .await
        {
            warn!("Failed to report error in #{}: {}", channel.name, e);
        }
    }
}
