//! Prefix commands (`help`, `prefix`, `threshold`).
//!
//! Handles command parsing and execution for chat commands. The prefix is a
//! single character configured per server.

use std::sync::Arc;

use serenity::model::id::{ChannelId, GuildId, MessageId};
use tracing::{debug, info};

use crate::common::error::CommandError;
use crate::discord::platform::ChatPlatform;
use crate::wall::model::{MAX_THRESHOLD, MIN_THRESHOLD};
use crate::wall::ConfigStore;

const NO_MOUTH_EMOJI: &str = "😶";

const HELP_TEXT: &str = "```Commands: \n\thelp - Displays this message\n\tprefix <prefix> - changes the prefix to whatever specified\n\tthreshold <threshold> - Updates the servers react threshold (the number of reacts to a message before its added to the wall)```";

/// A server message, reduced to what command handling needs.
#[derive(Debug, Clone)]
pub struct IncomingMessage {
    pub guild_id: Option<GuildId>,
    pub channel_id: ChannelId,
    pub message_id: MessageId,
    pub author_is_bot: bool,
    pub content: String,
}

/// Split a command line into name and arguments.
///
/// Returns `None` unless `content` starts with `prefix`. Arguments are split
/// on single spaces, so repeated spaces yield empty arguments.
pub fn parse_command(prefix: char, content: &str) -> Option<(&str, Vec<&str>)> {
    let line = content.strip_prefix(prefix)?;
    let mut parts = line.split(' ');
    let name = parts.next().unwrap_or_default();
    Some((name, parts.collect()))
}

/// Command handler for the bot.
pub struct CommandHandler<P: ?Sized> {
    platform: Arc<P>,
}

impl<P: ChatPlatform + ?Sized> CommandHandler<P> {
    pub fn new(platform: Arc<P>) -> Self {
        Self { platform }
    }

    /// Parse and execute a command.
    ///
    /// Returns `true` if the message was a known command, `false` otherwise.
    pub async fn handle_command(
        &self,
        store: &mut ConfigStore,
        guild_id: GuildId,
        msg: &IncomingMessage,
    ) -> anyhow::Result<bool> {
        let Some(prefix) = store.get(guild_id).map(|c| c.prefix) else {
            return Ok(false);
        };
        let Some((command, args)) = parse_command(prefix, &msg.content) else {
            return Ok(false);
        };

        debug!("Processing command: {} with args: {:?}", command, args);

        let result = match command {
            "help" => self.handle_help(msg).await,
            "prefix" => self.handle_prefix(store, guild_id, msg, &args).await,
            "threshold" => self.handle_threshold(store, guild_id, msg, &args).await,
            _ => return Ok(false),
        };

        match result {
            Ok(()) => Ok(true),
            Err(e) => match e.downcast_ref::<CommandError>() {
                Some(syntax) => {
                    info!("Rejected command in {}: {}", guild_id, syntax);
                    self.reply(
                        msg,
                        &format!("There was an error with your syntax. Try **{}help**", prefix),
                    )
                    .await?;
                    Ok(true)
                }
                None => Err(e),
            },
        }
    }

    async fn handle_help(&self, msg: &IncomingMessage) -> anyhow::Result<()> {
        self.reply(msg, HELP_TEXT).await
    }

    async fn handle_prefix(
        &self,
        store: &mut ConfigStore,
        guild_id: GuildId,
        msg: &IncomingMessage,
        args: &[&str],
    ) -> anyhow::Result<()> {
        let Some(requested) = args.first() else {
            self.platform
                .react(msg.channel_id, msg.message_id, NO_MOUTH_EMOJI)
                .await?;
            return self.reply(msg, "^ Your prefix can be seen here...").await;
        };

        let mut chars = requested.chars();
        match (chars.next(), chars.next()) {
            (Some(prefix), None) => {
                store.set_prefix(guild_id, prefix)?;
                info!("Prefix of {} changed to '{}'", guild_id, prefix);
                self.reply(msg, &format!("Prefix has been changed to **{}**", prefix))
                    .await
            }
            _ => {
                let current = store.get(guild_id).map(|c| c.prefix).unwrap_or('-');
                self.reply(
                    msg,
                    &format!("Prefix can only be one character. e.g. **{}**", current),
                )
                .await
            }
        }
    }

    async fn handle_threshold(
        &self,
        store: &mut ConfigStore,
        guild_id: GuildId,
        msg: &IncomingMessage,
        args: &[&str],
    ) -> anyhow::Result<()> {
        let requested = args.first().ok_or_else(|| CommandError::MissingArgument {
            command: "threshold".to_string(),
        })?;

        match requested.trim().parse::<u32>() {
            Ok(threshold) if threshold > MIN_THRESHOLD && threshold < MAX_THRESHOLD => {
                store.set_threshold(guild_id, threshold)?;
                info!("Threshold of {} changed to {}", guild_id, threshold);
                self.reply(msg, &format!("Updated server threshold to: **{}**", threshold))
                    .await
            }
            _ => {
                self.reply(
                    msg,
                    &format!(
                        "Threshold must be a number between **{}** and **{}**",
                        MIN_THRESHOLD + 1,
                        MAX_THRESHOLD - 1
                    ),
                )
                .await
            }
        }
    }

    async fn reply(&self, msg: &IncomingMessage, text: &str) -> anyhow::Result<()> {
        self.platform.send(msg.channel_id, text).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discord::platform::mock::MockPlatform;
    use crate::wall::ServerDefaults;
    use tempfile::TempDir;
    use tokio_test::assert_ok;

    const CHANNEL: u64 = 77;

    struct Fixture {
        _dir: TempDir,
        platform: Arc<MockPlatform>,
        handler: CommandHandler<MockPlatform>,
        store: ConfigStore,
        guild: GuildId,
    }

    fn fixture() -> Fixture {
        let dir = TempDir::new().unwrap();
        let mut store = ConfigStore::load(dir.path().join("config.json")).unwrap();
        let guild = GuildId::new(3);
        store.insert_default(guild, &ServerDefaults::default()).unwrap();
        let platform = Arc::new(MockPlatform::new());
        Fixture {
            _dir: dir,
            handler: CommandHandler::new(Arc::clone(&platform)),
            platform,
            store,
            guild,
        }
    }

    fn message(content: &str) -> IncomingMessage {
        IncomingMessage {
            guild_id: Some(GuildId::new(3)),
            channel_id: ChannelId::new(CHANNEL),
            message_id: MessageId::new(500),
            author_is_bot: false,
            content: content.to_string(),
        }
    }

    impl Fixture {
        async fn run(&mut self, content: &str) -> bool {
            self.handler
                .handle_command(&mut self.store, self.guild, &message(content))
                .await
                .unwrap()
        }

        fn replies(&self) -> Vec<String> {
            self.platform.texts_in(ChannelId::new(CHANNEL))
        }

        fn threshold(&self) -> u32 {
            self.store.get(self.guild).unwrap().react_threshold
        }
    }

    #[test]
    fn test_parse_command() {
        assert_eq!(parse_command('-', "-help"), Some(("help", vec![])));
        assert_eq!(parse_command('-', "-prefix !"), Some(("prefix", vec!["!"])));
        assert_eq!(parse_command('-', "-prefix  !"), Some(("prefix", vec!["", "!"])));
        assert_eq!(parse_command('-', "help"), None);
        assert_eq!(parse_command('!', "-help"), None);
    }

    #[tokio::test]
    async fn test_help_posts_usage() {
        let mut f = fixture();
        assert!(f.run("-help").await);
        assert_eq!(f.replies(), vec![HELP_TEXT.to_string()]);
        assert!(HELP_TEXT.starts_with("```Commands: \n\thelp - Displays this message\n"));
        assert!(HELP_TEXT.contains("\tthreshold <threshold> - Updates the servers react threshold"));
    }

    #[tokio::test]
    async fn test_non_command_ignored() {
        let mut f = fixture();
        assert!(!f.run("hello there").await);
        assert!(!f.run("-dance").await);
        assert_eq!(f.platform.post_count(), 0);
    }

    #[tokio::test]
    async fn test_new_prefix_is_recognised() {
        let mut f = fixture();
        assert!(f.run("-prefix !").await);
        assert_eq!(f.replies(), vec!["Prefix has been changed to **!**".to_string()]);

        let reloaded = ConfigStore::load(f._dir.path().join("config.json")).unwrap();
        assert_eq!(reloaded.get(f.guild).unwrap().prefix, '!');

        assert!(f.run("!help").await);
        assert!(!f.run("-help").await);
    }

    #[tokio::test]
    async fn test_prefix_without_argument_reacts() {
        let mut f = fixture();
        assert!(f.run("-prefix").await);

        assert_eq!(
            f.platform.reactions_on(MessageId::new(500)),
            vec![NO_MOUTH_EMOJI.to_string()]
        );
        assert_eq!(f.replies(), vec!["^ Your prefix can be seen here...".to_string()]);
        assert_eq!(f.store.get(f.guild).unwrap().prefix, '-');
    }

    #[tokio::test]
    async fn test_long_prefix_rejected() {
        let mut f = fixture();
        assert!(f.run("-prefix !!").await);

        assert_eq!(
            f.replies(),
            vec!["Prefix can only be one character. e.g. **-**".to_string()]
        );
        assert_eq!(f.store.get(f.guild).unwrap().prefix, '-');
    }

    #[tokio::test]
    async fn test_threshold_bounds() {
        let mut f = fixture();

        for rejected in ["0", "1", "50", "abc", "-3"] {
            assert!(f.run(&format!("-threshold {}", rejected)).await);
            assert_eq!(f.threshold(), 5, "{} should be rejected", rejected);
        }

        for accepted in [2, 25, 49] {
            assert!(f.run(&format!("-threshold {}", accepted)).await);
            assert_eq!(f.threshold(), accepted);
        }

        let replies = f.replies();
        assert_eq!(replies.len(), 8);
        assert_eq!(replies[0], "Threshold must be a number between **2** and **49**");
        assert_eq!(replies[7], "Updated server threshold to: **49**");
    }

    #[tokio::test]
    async fn test_missing_threshold_is_syntax_error() {
        let mut f = fixture();
        assert!(f.run("-threshold").await);

        assert_eq!(
            f.replies(),
            vec!["There was an error with your syntax. Try **-help**".to_string()]
        );
    }

    #[tokio::test]
    async fn test_unknown_server_is_not_a_command() {
        let mut f = fixture();
        let result = f
            .handler
            .handle_command(&mut f.store, GuildId::new(999), &message("-help"))
            .await;

        assert!(!assert_ok!(result));
    }
}
