//! friendsync binary entry point

use anyhow::Context;
use friendsync::{FriendSync, config};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// One-shot directory refresh
///
/// # Setup
/// 1. Load configuration from file and environment
/// 2. Initialize tracing/logging
/// 3. Connect the record store
/// 4. Refresh both lists for the user id given as first argument
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Load configuration
    let config = config::AppConfig::load()?;

    // 2. Initialize tracing/logging
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("friendsync={}", config.logging.level).into());
    if config.logging.format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().pretty())
            .init();
    }

    friendsync::metrics::init_metrics();
    tracing::info!(backend = ?config.store.backend, "Configuration loaded");

    let user_id = std::env::args()
        .nth(1)
        .context("usage: friendsync <user-id>")?;

    // 3. Connect the record store
    let client = FriendSync::new(config).await?;

    // 4. Refresh
    client
        .directory
        .refresh_directory(&client.session, &user_id)
        .await?;

    let friends = client.session.friend_list().await;
    let potential_friends = client.session.potential_friend_list().await;
    tracing::info!(
        user_id = %user_id,
        friends = friends.len(),
        potential_friends = potential_friends.len(),
        "Directory refreshed"
    );
    for user in &friends {
        tracing::info!(id = %user.id, username = ?user.username, "friend");
    }
    for user in &potential_friends {
        tracing::info!(id = %user.id, username = ?user.username, "potential friend");
    }

    tracing::debug!(metrics = %friendsync::metrics::gather_text(), "Metrics snapshot");

    Ok(())
}
