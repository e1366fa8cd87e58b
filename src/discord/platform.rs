//! Gateway operations the bot performs, behind a trait.
//!
//! `SerenityPlatform` is the real implementation. Everything above this module
//! works against [`ChatPlatform`] so it can run against the in-memory
//! platform in tests.

use std::sync::Arc;

use serenity::async_trait;
use serenity::builder::{CreateChannel, CreateEmbed, CreateMessage};
use serenity::http::Http;
use serenity::model::channel::{ChannelType, ReactionType};
use serenity::model::id::{ChannelId, GuildId, MessageId};
use tracing::debug;

use crate::common::error::{PlatformError, PlatformResult};

/// A text channel, as far as the bot cares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelRef {
    pub id: ChannelId,
    pub name: String,
}

impl ChannelRef {
    pub fn new(id: ChannelId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

#[async_trait]
pub trait ChatPlatform: Send + Sync {
    /// Text channels of a server, in display order.
    async fn channels(&self, guild_id: GuildId) -> PlatformResult<Vec<ChannelRef>>;

    async fn create_channel(&self, guild_id: GuildId, name: &str) -> PlatformResult<ChannelRef>;

    /// Create a copy of `channel` (name, topic, category, permissions).
    async fn clone_channel(
        &self,
        guild_id: GuildId,
        channel: &ChannelRef,
    ) -> PlatformResult<ChannelRef>;

    async fn delete_channel(&self, channel_id: ChannelId) -> PlatformResult<()>;

    /// Post a plain message, returning its id.
    async fn send(&self, channel_id: ChannelId, content: &str) -> PlatformResult<MessageId>;

    /// Post a message whose body is an embed with a single field.
    async fn send_embed(
        &self,
        channel_id: ChannelId,
        title: &str,
        field_name: &str,
        field_value: &str,
    ) -> PlatformResult<MessageId>;

    async fn react(
        &self,
        channel_id: ChannelId,
        message_id: MessageId,
        emoji: &str,
    ) -> PlatformResult<()>;
}

/// [`ChatPlatform`] backed by serenity's HTTP client.
#[derive(Clone)]
pub struct SerenityPlatform {
    http: Arc<Http>,
}

impl SerenityPlatform {
    pub fn new(http: Arc<Http>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl ChatPlatform for SerenityPlatform {
    async fn channels(&self, guild_id: GuildId) -> PlatformResult<Vec<ChannelRef>> {
        let mut channels: Vec<_> = guild_id
            .channels(self.http.as_ref())
            .await?
            .into_values()
            .filter(|c| c.kind == ChannelType::Text)
            .collect();
        channels.sort_by_key(|c| (c.position, c.id));

        Ok(channels
            .into_iter()
            .map(|c| ChannelRef::new(c.id, c.name))
            .collect())
    }

    async fn create_channel(&self, guild_id: GuildId, name: &str) -> PlatformResult<ChannelRef> {
        let builder = CreateChannel::new(name).kind(ChannelType::Text);
        let channel = guild_id.create_channel(self.http.as_ref(), builder).await?;
        debug!("Created #{} ({}) in {}", channel.name, channel.id, guild_id);
        Ok(ChannelRef::new(channel.id, channel.name))
    }

    async fn clone_channel(
        &self,
        guild_id: GuildId,
        channel: &ChannelRef,
    ) -> PlatformResult<ChannelRef> {
        let source = channel
            .id
            .to_channel(self.http.as_ref())
            .await?
            .guild()
            .ok_or(PlatformError::NotGuildChannel {
                channel_id: channel.id.get(),
            })?;

        let mut builder = CreateChannel::new(source.name.clone())
            .kind(source.kind)
            .position(source.position)
            .nsfw(source.nsfw)
            .permissions(source.permission_overwrites.clone());
        if let Some(topic) = &source.topic {
            builder = builder.topic(topic.clone());
        }
        if let Some(parent) = source.parent_id {
            builder = builder.category(parent);
        }

        let copy = guild_id.create_channel(self.http.as_ref(), builder).await?;
        debug!("Cloned #{} {} -> {}", copy.name, source.id, copy.id);
        Ok(ChannelRef::new(copy.id, copy.name))
    }

    async fn delete_channel(&self, channel_id: ChannelId) -> PlatformResult<()> {
        channel_id.delete(self.http.as_ref()).await?;
        Ok(())
    }

    async fn send(&self, channel_id: ChannelId, content: &str) -> PlatformResult<MessageId> {
        let message = channel_id.say(self.http.as_ref(), content).await?;
        Ok(message.id)
    }

    async fn send_embed(
        &self,
        channel_id: ChannelId,
        title: &str,
        field_name: &str,
        field_value: &str,
    ) -> PlatformResult<MessageId> {
        let embed = CreateEmbed::new()
            .title(title)
            .field(field_name, field_value, false);
        let message = channel_id
            .send_message(self.http.as_ref(), CreateMessage::new().embed(embed))
            .await?;
        Ok(message.id)
    }

    async fn react(
        &self,
        channel_id: ChannelId,
        message_id: MessageId,
        emoji: &str,
    ) -> PlatformResult<()> {
        let reaction = ReactionType::Unicode(emoji.to_string());
        self.http
            .create_reaction(channel_id, message_id, &reaction)
            .await?;
        Ok(())
    }
}

/// In-memory platform recording every call.
#[cfg(test)]
pub mod mock {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;

    /// Something the bot posted.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum Posted {
        Text(String),
        Embed { title: String, field: String },
    }

    #[derive(Debug, Default)]
    struct State {
        next_id: u64,
        channels: HashMap<GuildId, Vec<ChannelRef>>,
        posts: Vec<(ChannelId, MessageId, Posted)>,
        reactions: Vec<(ChannelId, MessageId, String)>,
        created: Vec<(GuildId, String)>,
        deleted: Vec<ChannelId>,
        fail_create: bool,
    }

    #[derive(Debug, Default)]
    pub struct MockPlatform {
        state: Mutex<State>,
    }

    impl MockPlatform {
        pub fn new() -> Self {
            Self {
                state: Mutex::new(State {
                    next_id: 1000,
                    ..State::default()
                }),
            }
        }

        /// Add a text channel, returning its id.
        pub fn add_channel(&self, guild_id: GuildId, name: &str) -> ChannelId {
            let mut state = self.state.lock().unwrap();
            let id = ChannelId::new(state.alloc());
            state
                .channels
                .entry(guild_id)
                .or_default()
                .push(ChannelRef::new(id, name));
            id
        }

        pub fn fail_channel_creation(&self) {
            self.state.lock().unwrap().fail_create = true;
        }

        pub fn channel_names(&self, guild_id: GuildId) -> Vec<String> {
            let state = self.state.lock().unwrap();
            state
                .channels
                .get(&guild_id)
                .map(|cs| cs.iter().map(|c| c.name.clone()).collect())
                .unwrap_or_default()
        }

        pub fn find_channel(&self, guild_id: GuildId, name: &str) -> Option<ChannelId> {
            let state = self.state.lock().unwrap();
            state
                .channels
                .get(&guild_id)?
                .iter()
                .find(|c| c.name == name)
                .map(|c| c.id)
        }

        pub fn posts_in(&self, channel_id: ChannelId) -> Vec<Posted> {
            let state = self.state.lock().unwrap();
            state
                .posts
                .iter()
                .filter(|(c, _, _)| *c == channel_id)
                .map(|(_, _, p)| p.clone())
                .collect()
        }

        pub fn texts_in(&self, channel_id: ChannelId) -> Vec<String> {
            self.posts_in(channel_id)
                .into_iter()
                .filter_map(|p| match p {
                    Posted::Text(t) => Some(t),
                    Posted::Embed { .. } => None,
                })
                .collect()
        }

        pub fn post_count(&self) -> usize {
            self.state.lock().unwrap().posts.len()
        }

        pub fn reactions_on(&self, message_id: MessageId) -> Vec<String> {
            let state = self.state.lock().unwrap();
            state
                .reactions
                .iter()
                .filter(|(_, m, _)| *m == message_id)
                .map(|(_, _, e)| e.clone())
                .collect()
        }

        pub fn reaction_count(&self) -> usize {
            self.state.lock().unwrap().reactions.len()
        }

        /// Ids of the messages posted into `channel_id`, oldest first.
        pub fn message_ids_in(&self, channel_id: ChannelId) -> Vec<MessageId> {
            let state = self.state.lock().unwrap();
            state
                .posts
                .iter()
                .filter(|(c, _, _)| *c == channel_id)
                .map(|(_, m, _)| *m)
                .collect()
        }

        pub fn created(&self) -> Vec<(GuildId, String)> {
            self.state.lock().unwrap().created.clone()
        }

        pub fn deleted(&self) -> Vec<ChannelId> {
            self.state.lock().unwrap().deleted.clone()
        }
    }

    impl State {
        fn alloc(&mut self) -> u64 {
            self.next_id += 1;
            self.next_id
        }

        fn post(&mut self, channel_id: ChannelId, posted: Posted) -> MessageId {
            let id = MessageId::new(self.alloc());
            self.posts.push((channel_id, id, posted));
            id
        }
    }

    #[async_trait]
    impl ChatPlatform for MockPlatform {
        async fn channels(&self, guild_id: GuildId) -> PlatformResult<Vec<ChannelRef>> {
            let state = self.state.lock().unwrap();
            Ok(state.channels.get(&guild_id).cloned().unwrap_or_default())
        }

        async fn create_channel(
            &self,
            guild_id: GuildId,
            name: &str,
        ) -> PlatformResult<ChannelRef> {
            let mut state = self.state.lock().unwrap();
            if state.fail_create {
                return Err(serenity::Error::Other("Missing Permissions").into());
            }
            let channel = ChannelRef::new(ChannelId::new(state.alloc()), name);
            state.created.push((guild_id, name.to_string()));
            state
                .channels
                .entry(guild_id)
                .or_default()
                .push(channel.clone());
            Ok(channel)
        }

        async fn clone_channel(
            &self,
            guild_id: GuildId,
            channel: &ChannelRef,
        ) -> PlatformResult<ChannelRef> {
            let mut state = self.state.lock().unwrap();
            let copy = ChannelRef::new(ChannelId::new(state.alloc()), channel.name.clone());
            state
                .channels
                .entry(guild_id)
                .or_default()
                .push(copy.clone());
            Ok(copy)
        }

        async fn delete_channel(&self, channel_id: ChannelId) -> PlatformResult<()> {
            let mut state = self.state.lock().unwrap();
            let mut found = false;
            for channels in state.channels.values_mut() {
                let before = channels.len();
                channels.retain(|c| c.id != channel_id);
                found |= channels.len() != before;
            }
            if !found {
                return Err(serenity::Error::Other("Unknown Channel").into());
            }
            state.deleted.push(channel_id);
            Ok(())
        }

        async fn send(&self, channel_id: ChannelId, content: &str) -> PlatformResult<MessageId> {
            let mut state = self.state.lock().unwrap();
            Ok(state.post(channel_id, Posted::Text(content.to_string())))
        }

        async fn send_embed(
            &self,
            channel_id: ChannelId,
            title: &str,
            field_name: &str,
            field_value: &str,
        ) -> PlatformResult<MessageId> {
            let mut state = self.state.lock().unwrap();
            let posted = Posted::Embed {
                title: title.to_string(),
                field: format!("{}: {}", field_name, field_value),
            };
            Ok(state.post(channel_id, posted))
        }

        async fn react(
            &self,
            channel_id: ChannelId,
            message_id: MessageId,
            emoji: &str,
        ) -> PlatformResult<()> {
            let mut state = self.state.lock().unwrap();
            state
                .reactions
                .push((channel_id, message_id, emoji.to_string()));
            Ok(())
        }
    }
}
