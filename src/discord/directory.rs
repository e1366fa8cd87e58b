//! Guild listing for the web portal, read from serenity's cache.

use std::sync::Arc;

use serenity::cache::Cache;

use crate::portal::{GuildDirectory, GuildSummary};

/// [`GuildDirectory`] over the gateway cache.
#[derive(Clone)]
pub struct CacheDirectory {
    cache: Arc<Cache>,
}

impl CacheDirectory {
    pub fn new(cache: Arc<Cache>) -> Self {
        Self { cache }
    }
}

impl GuildDirectory for CacheDirectory {
    fn guild_count(&self) -> usize {
        self.cache.guild_count()
    }

    fn guilds(&self) -> Vec<GuildSummary> {
        let mut guilds: Vec<GuildSummary> = self
            .cache
            .guilds()
            .into_iter()
            .filter_map(|id| {
                let guild = self.cache.guild(id)?;
                Some(GuildSummary {
                    id: id.get(),
                    name: guild.name.clone(),
                    member_count: guild.member_count,
                })
            })
            .collect();
        guilds.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        guilds
    }
}
