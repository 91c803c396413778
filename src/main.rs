use anyhow::Result;
use clap::Parser;
use tracing::{error, info, warn};

use standup_bot::core::config::{AppConfig, Cli};
use standup_bot::core::models::Retention;
use standup_bot::slack::{SlackClient, StandupBot, spawn_connection_manager};

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::try_from(Cli::parse())?;
    standup_bot::setup_logging(config.debug);

    // The Slack HTTP stack and the websocket may each enable a different rustls backend.
    if let Err(e) = rustls::crypto::ring::default_provider().install_default() {
        warn!("Failed to install default crypto provider: {:?}", e);
    }

    info!(
        "Starting standup bot with a {} day history limit",
        config.history_days_limit
    );

    let client = SlackClient::new(config.slack_bot_token.clone());
    let (events, connection) = spawn_connection_manager(client.clone(), config.reconnect_delay);
    let bot = StandupBot::new(client, Retention::days(config.history_days_limit));

    match bot.run(events).await {
        Ok(()) => {
            warn!("Connection manager stopped, exiting");
            connection.abort();
            Ok(())
        }
        Err(e) if e.is_fatal() => {
            error!("Invalid credentials: {}", e);
            std::process::exit(1);
        }
        Err(e) => Err(e.into()),
    }
}
