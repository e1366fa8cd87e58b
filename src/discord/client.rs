//! Discord bot client.
//!
//! Provides a high-level interface for creating and running the bot, hiding
//! serenity implementation details from the rest of the application.
//! Serenity calls the event handler concurrently; every event is forwarded
//! into one channel and handled in order by a single loop.

use std::sync::Arc;
use std::time::Duration;

use serenity::async_trait;
use serenity::http::HttpBuilder;
use serenity::model::channel::{Message, Reaction, ReactionType};
use serenity::model::gateway::Ready;
use serenity::model::guild::{Guild, UnavailableGuild};
use serenity::model::id::GuildId;
use serenity::model::Timestamp;
use serenity::prelude::*;
use serenity::Client;
use tokio::sync::{mpsc, watch};
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::discord::commands::IncomingMessage;
use crate::discord::directory::CacheDirectory;
use crate::discord::handler::{GuildRef, WallHandler};
use crate::discord::platform::{ChatPlatform, SerenityPlatform};
use crate::wall::nomination::{Candidate, ReactionTally};
use crate::wall::{ConfigStore, GlobalWall, ServerDefaults, WallAuthor};

/// A gateway event, reduced to plain data when it arrives.
#[derive(Debug, Clone)]
pub enum DiscordBotEvent {
    /// Bot connected and ready.
    Ready { user: String, guilds: Vec<GuildId> },
    /// Guild data received, either at startup or after joining.
    GuildCreate { guild: GuildRef, is_new: Option<bool> },
    /// Bot removed from a guild, or the guild went unavailable.
    GuildDelete { guild_id: GuildId, unavailable: bool },
    /// Message received.
    Message(IncomingMessage),
    /// Reaction added. Counts are those at the time of the event.
    ReactionAdd { guild: GuildRef, candidate: Candidate },
}

struct DiscordBotEvents {
    discord_events_tx: mpsc::UnboundedSender<DiscordBotEvent>,
}

impl DiscordBotEvents {
    fn new(discord_events_tx: mpsc::UnboundedSender<DiscordBotEvent>) -> Self {
        Self { discord_events_tx }
    }

    fn forward(&self, event: DiscordBotEvent) {
        if let Err(error) = self.discord_events_tx.send(event) {
            warn!("Failed to process discord event: {}", error);
        }
    }
}

#[async_trait]
impl EventHandler for DiscordBotEvents {
    async fn ready(&self, _context: Context, ready: Ready) {
        self.forward(DiscordBotEvent::Ready {
            user: ready.user.name.clone(),
            guilds: ready.guilds.iter().map(|g| g.id).collect(),
        });
    }

    async fn guild_create(&self, _context: Context, guild: Guild, is_new: Option<bool>) {
        debug!("Guild data for '{}' ({} channels)", guild.name, guild.channels.len());
        self.forward(DiscordBotEvent::GuildCreate {
            guild: GuildRef {
                id: guild.id,
                name: guild.name,
            },
            is_new,
        });
    }

    async fn guild_delete(&self, _context: Context, incomplete: UnavailableGuild, _full: Option<Guild>) {
        self.forward(DiscordBotEvent::GuildDelete {
            guild_id: incomplete.id,
            unavailable: incomplete.unavailable,
        });
    }

    async fn message(&self, _context: Context, message: Message) {
        self.forward(DiscordBotEvent::Message(IncomingMessage {
            guild_id: message.guild_id,
            channel_id: message.channel_id,
            message_id: message.id,
            author_is_bot: message.author.bot,
            content: message.content,
        }));
    }

    async fn reaction_add(&self, context: Context, reaction: Reaction) {
        let Some(guild_id) = reaction.guild_id else {
            return;
        };
        // Fetched here rather than in the event loop, which may be busy
        // refreshing walls while the count keeps moving.
        let message = match reaction.message(&context).await {
            Ok(message) => message,
            Err(e) => {
                warn!("Could not fetch reacted message {}: {}", reaction.message_id, e);
                return;
            }
        };
        let guild = GuildRef {
            id: guild_id,
            name: guild_name(&context, guild_id).await,
        };
        self.forward(DiscordBotEvent::ReactionAdd {
            guild,
            candidate: candidate(&message),
        });
    }
}

/// Builder for creating the Discord bot.
pub struct DiscordBotBuilder {
    token: String,
    configs: ConfigStore,
    global: GlobalWall,
    defaults: ServerDefaults,
    refresh_interval: Option<Duration>,
}

impl DiscordBotBuilder {
    pub fn new(token: String, configs: ConfigStore, global: GlobalWall) -> Self {
        Self {
            token,
            configs,
            global,
            defaults: ServerDefaults::default(),
            refresh_interval: None,
        }
    }

    /// Settings for servers the bot meets for the first time.
    pub fn defaults(mut self, defaults: ServerDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    /// Reset every wall this often. `None` disables periodic refresh.
    pub fn refresh_interval(mut self, interval: Option<Duration>) -> Self {
        self.refresh_interval = interval;
        self
    }

    /// Build the Discord bot.
    pub async fn build(self) -> anyhow::Result<DiscordBot> {
        let (discord_events_tx, discord_events_rx) = mpsc::unbounded_channel::<DiscordBotEvent>();

        let client = build_client(&self.token, discord_events_tx).await?;
        let platform = Arc::new(SerenityPlatform::new(client.http.clone()));
        let handler = WallHandler::new(platform, self.configs, self.global, self.defaults);

        Ok(DiscordBot {
            client,
            handler,
            discord_events_rx,
            refresh_interval: self.refresh_interval,
        })
    }
}

async fn build_client(
    token: &str,
    discord_events_tx: mpsc::UnboundedSender<DiscordBotEvent>,
) -> anyhow::Result<Client> {
    let intents = GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT
        | GatewayIntents::GUILD_MESSAGE_REACTIONS;

    // Build a custom reqwest client with timeout settings
    let reqwest_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(15))
        .connect_timeout(Duration::from_secs(10))
        .build()?;

    let http = HttpBuilder::new(token).client(reqwest_client).build();

    let events = DiscordBotEvents::new(discord_events_tx);
    let client = serenity::client::ClientBuilder::new_with_http(http, intents)
        .event_handler(events)
        .await?;
    Ok(client)
}

pub struct DiscordBot {
    client: Client,
    handler: WallHandler<SerenityPlatform>,
    discord_events_rx: mpsc::UnboundedReceiver<DiscordBotEvent>,
    refresh_interval: Option<Duration>,
}

impl DiscordBot {
    /// Read-only view of the servers the bot is connected to.
    pub fn guild_directory(&self) -> CacheDirectory {
        CacheDirectory::new(self.client.cache.clone())
    }

    /// Run until the gateway connection ends or `shutdown_rx` flips to `true`.
    ///
    /// A failed connection is returned as an error; there is no reconnect loop
    /// beyond what serenity does internally.
    pub async fn run(self, mut shutdown_rx: watch::Receiver<bool>) -> anyhow::Result<()> {
        let DiscordBot {
            mut client,
            mut handler,
            mut discord_events_rx,
            refresh_interval,
        } = self;

        let shard_manager = client.shard_manager.clone();
        let mut refresh_timer = refresh_interval.map(refresh_timer);

        info!("Connecting to Discord...");

        let result = tokio::select! {
            result = client.start() => {
                match &result {
                    Ok(()) => info!("Discord client disconnected normally"),
                    Err(e) => error!("Discord client error: {}", e),
                }
                result.map_err(anyhow::Error::from)
            }
            _ = process_events(&mut discord_events_rx, &mut handler, refresh_timer.as_mut()) => Ok(()),
            _ = async {
                // Wait for shutdown signal
                loop {
                    if shutdown_rx.changed().await.is_err() || *shutdown_rx.borrow() {
                        break;
                    }
                }
                info!("Initiating graceful Discord shutdown...");
                shard_manager.shutdown_all().await;
                info!("Discord shutdown complete");
            } => Ok(()),
        };

        info!("Discord task ended");
        result
    }
}

/// Handle events one at a time until the channel closes. The refresh timer,
/// when set, fires between events.
async fn process_events<P: ChatPlatform + ?Sized>(
    discord_events_rx: &mut mpsc::UnboundedReceiver<DiscordBotEvent>,
    handler: &mut WallHandler<P>,
    mut refresh_timer: Option<&mut Interval>,
) {
    loop {
        tokio::select! {
            event = discord_events_rx.recv() => {
                match event {
                    Some(event) => dispatch(handler, event).await,
                    None => {
                        debug!("Discord events channel closed.");
                        break;
                    }
                }
            }

            _ = async {
                match refresh_timer.as_mut() {
                    Some(timer) => {
                        timer.tick().await;
                    }
                    None => std::future::pending::<()>().await,
                }
            } => {
                info!("Periodic wall refresh");
                handler.refresh_all().await;
            }
        }
    }
}

async fn dispatch<P: ChatPlatform + ?Sized>(handler: &mut WallHandler<P>, event: DiscordBotEvent) {
    match event {
        DiscordBotEvent::Ready { user, guilds } => {
            info!("Discord bot connected as {}", user);
            handler.handle_ready(guilds).await;
        }
        DiscordBotEvent::GuildCreate { guild, is_new } => {
            if let Err(e) = handler.handle_guild_create(guild, is_new).await {
                error!("Failed to set up new server: {}", e);
            }
        }
        DiscordBotEvent::GuildDelete { guild_id, unavailable } => {
            if let Err(e) = handler.handle_guild_delete(guild_id, unavailable) {
                error!("Failed to forget server {}: {}", guild_id, e);
            }
        }
        DiscordBotEvent::Message(message) => {
            if let Err(e) = handler.handle_message(message).await {
                error!("Command handler error: {}", e);
            }
        }
        DiscordBotEvent::ReactionAdd { guild, candidate } => {
            if let Err(e) = handler.handle_reaction(&guild, &candidate).await {
                error!("Failed to handle reaction: {}", e);
            }
        }
    }
}

fn refresh_timer(every: Duration) -> Interval {
    let mut timer = tokio::time::interval_at(Instant::now() + every, every);
    timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
    timer
}

async fn guild_name(context: &Context, guild_id: GuildId) -> String {
    if let Some(guild) = context.cache.guild(guild_id) {
        return guild.name.clone();
    }
    match guild_id.to_partial_guild(context).await {
        Ok(guild) => guild.name,
        Err(e) => {
            warn!("Could not resolve name of {}: {}", guild_id, e);
            guild_id.to_string()
        }
    }
}

fn candidate(message: &Message) -> Candidate {
    let reactions = message
        .reactions
        .iter()
        .map(|r| ReactionTally::new(emoji_name(&r.reaction_type), r.count))
        .collect();

    Candidate {
        content: message.content.clone(),
        author: WallAuthor {
            id: message.author.id.to_string(),
            username: message.author.name.clone(),
        },
        created_ms: epoch_millis(&message.timestamp),
        reactions,
    }
}

fn epoch_millis(timestamp: &Timestamp) -> i64 {
    timestamp.timestamp_millis()
}

/// Unicode reactions match on the emoji itself, custom ones on their name.
fn emoji_name(reaction: &ReactionType) -> String {
    match reaction {
        ReactionType::Unicode(emoji) => emoji.clone(),
        ReactionType::Custom { name, .. } => name.clone().unwrap_or_default(),
        _ => String::new(),
    }
}
