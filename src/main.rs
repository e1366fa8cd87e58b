//! Wall of Fame - Discord bot that copies community-nominated messages into
//! a dedicated `wall_of_fame` channel on every server it serves.

mod common;
mod config;
mod discord;
mod portal;
mod wall;

use std::sync::Arc;

use anyhow::Result;
use tokio::signal;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use config::{env::get_config_path, load_and_validate, Config};
use discord::DiscordBotBuilder;
use wall::{ConfigStore, GlobalWall};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("Wall of Fame v{} starting...", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config_path = get_config_path();
    info!("Loading configuration from {}...", config_path);

    let config = load_and_validate(&config_path).map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    let token = config.discord.resolve_token().map_err(|e| {
        error!("No Discord token: {}", e);
        error!(
            "Set discord.token, WOF_DISCORD_TOKEN, or put the token in {}",
            config.discord.token_file
        );
        e
    })?;

    let (configs, global) = load_stores(&config).map_err(|e| {
        error!("Failed to load stored walls: {}", e);
        e
    })?;

    info!("Configuration loaded successfully");
    info!("  Servers configured: {}", configs.len());
    info!("  Global wall entries: {}", global.len());
    match config.wall.refresh_interval() {
        Some(every) => info!("  Wall refresh every {}s", every.as_secs()),
        None => info!("  Periodic wall refresh disabled"),
    }

    let bot = DiscordBotBuilder::new(token, configs, global)
        .defaults(config.defaults.server_defaults())
        .refresh_interval(config.wall.refresh_interval())
        .build()
        .await?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let portal_task = if config.portal.enabled {
        let bind = config.portal.bind_addr()?;
        let directory: portal::SharedDirectory = Arc::new(bot.guild_directory());
        let mut portal_shutdown = shutdown_rx.clone();
        Some(tokio::spawn(async move {
            let shutdown = async move {
                while portal_shutdown.changed().await.is_ok() {
                    if *portal_shutdown.borrow() {
                        break;
                    }
                }
            };
            if let Err(e) = portal::serve(bind, directory, shutdown).await {
                error!("Web portal failed: {}", e);
            }
        }))
    } else {
        info!("Web portal disabled");
        None
    };

    let mut discord_task = tokio::spawn(bot.run(shutdown_rx));

    let outcome = tokio::select! {
        biased;
        _ = shutdown_signal() => {
            info!("Shutdown signal received - disconnecting...");
            if shutdown_tx.send(true).is_err() {
                warn!("Discord task already gone");
            }
            (&mut discord_task).await
        }
        outcome = &mut discord_task => {
            // Stop the portal as well.
            if shutdown_tx.send(true).is_err() {
                debug!("No portal listening for shutdown");
            }
            outcome
        }
    };

    if let Some(portal_task) = portal_task {
        if let Err(e) = portal_task.await {
            warn!("Web portal task panicked: {}", e);
        }
    }

    match outcome {
        Ok(Ok(())) => {
            info!("Exiting...");
            Ok(())
        }
        Ok(Err(e)) => {
            error!("Discord bot stopped: {}", e);
            Err(e)
        }
        Err(e) => {
            error!("Discord task panicked: {}", e);
            Err(e.into())
        }
    }
}

fn load_stores(config: &Config) -> common::error::Result<(ConfigStore, GlobalWall)> {
    let configs = ConfigStore::load(&config.storage.config_file)?;
    let global = GlobalWall::load(&config.storage.global_file)?;
    Ok((configs, global))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C"),
        _ = terminate => info!("Received SIGTERM"),
    }
}
