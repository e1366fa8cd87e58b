//! Discord bot integration.
//!
//! `client` owns the serenity connection and the event loop, `handler` holds
//! the bot state, and `platform` is the seam between the wall logic and the
//! Discord HTTP API.

pub mod client;
pub mod commands;
pub mod directory;
pub mod handler;
pub mod platform;

// Re-export main types for external use
pub use client::DiscordBotBuilder;
