use std::time::Duration;

use clap::Parser;

use crate::errors::SlackError;

pub const DEFAULT_API_BASE: &str = "https://slack.com/api";
pub const DEFAULT_HISTORY_DAYS: u32 = 7;

/// Command line surface of the bot binary.
#[derive(Debug, Parser)]
#[command(
    name = "standup-bot",
    about = "Slack bot that replays the latest standup status of every channel member",
    after_help = "You can obtain <SLACK_BOT_TOKEN> from https://<yourteam>.slack.com/services/new/bot"
)]
pub struct Cli {
    /// Slack bot token (xoxb-...)
    #[arg(value_name = "SLACK_BOT_TOKEN", env = "SLACK_BOT_TOKEN", hide_env_values = true)]
    pub token: String,

    /// Print debug information
    #[arg(long)]
    pub debug: bool,

    /// History limit (in days)
    #[arg(
        long = "history-limit",
        value_name = "DAYS",
        default_value_t = DEFAULT_HISTORY_DAYS,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub history_limit: u32,

    /// Seconds to wait before re-opening a dropped real-time connection
    #[arg(long, default_value_t = 5)]
    pub reconnect_delay_secs: u64,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub slack_bot_token: String,
    pub history_days_limit: u32,
    pub debug: bool,
    pub reconnect_delay: Duration,
}

impl AppConfig {
    #[must_use]
    pub fn new(slack_bot_token: impl Into<String>, history_days_limit: u32) -> Self {
        Self {
            slack_bot_token: slack_bot_token.into(),
            history_days_limit,
            debug: false,
            reconnect_delay: Duration::from_secs(5),
        }
    }

    /// # Errors
    ///
    /// Returns `ConfigError` when the token is blank or the history limit is zero.
    pub fn validate(&self) -> Result<(), SlackError> {
        if self.slack_bot_token.trim().is_empty() {
            return Err(SlackError::ConfigError(
                "SLACK_BOT_TOKEN must not be empty".to_string(),
            ));
        }
        if self.history_days_limit < 1 {
            return Err(SlackError::ConfigError(format!(
                "history limit must be at least 1 day, got {}",
                self.history_days_limit
            )));
        }
        Ok(())
    }
}

impl TryFrom<Cli> for AppConfig {
    type Error = SlackError;

    fn try_from(cli: Cli) -> Result<Self, Self::Error> {
        let config = Self {
            slack_bot_token: cli.token.trim().to_string(),
            history_days_limit: cli.history_limit,
            debug: cli.debug,
            reconnect_delay: Duration::from_secs(cli.reconnect_delay_secs),
        };
        config.validate()?;
        Ok(config)
    }
}
