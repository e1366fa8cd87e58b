//! Read-only web portal listing the servers the bot is connected to.
//!
//! The portal never talks to Discord itself. It is handed a
//! [`GuildDirectory`] when composed and renders whatever that reports.

mod pages;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::{any, get};
use axum::Router;
use tower_http::trace::TraceLayer;
use tracing::info;

/// A connected server as shown on the portal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuildSummary {
    pub id: u64,
    pub name: String,
    pub member_count: u64,
}

/// Snapshot provider for the servers the bot currently sees.
pub trait GuildDirectory: Send + Sync {
    fn guild_count(&self) -> usize;

    /// Connected servers, in display order.
    fn guilds(&self) -> Vec<GuildSummary>;
}

pub type SharedDirectory = Arc<dyn GuildDirectory>;

/// Build the portal router.
pub fn router(directory: SharedDirectory) -> Router {
    Router::new()
        .route("/", any(pages::root))
        .route("/wall-of-fame", get(pages::overview))
        .route("/wall-of-fame/list", get(pages::server_list))
        .layer(TraceLayer::new_for_http())
        .with_state(directory)
}

/// Serve the portal until `shutdown` resolves.
pub async fn serve<F>(bind: SocketAddr, directory: SharedDirectory, shutdown: F) -> anyhow::Result<()>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!("Web portal listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router(directory))
        .with_graceful_shutdown(shutdown)
        .await?;
    info!("Web portal stopped");
    Ok(())
}
