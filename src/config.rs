//! Command-line / environment configuration.
//!
//! Every option can be given as a flag or through the environment variable
//! named next to it.  [`Cli::into_settings`] validates the raw values; a
//! failure there is fatal and happens before anything is scheduled.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::error::ConfigError;

/// Delay between startup and the first scan.
pub const INITIAL_SCAN_DELAY: Duration = Duration::from_secs(5);

/// Longest accepted scan interval: one year, in minutes.
pub const MAX_SCAN_INTERVAL_MINS: u64 = 365 * 24 * 60;

#[derive(Debug, Parser)]
#[command(name = "rss-relay", version, about = "Forward new RSS items to Telegram chats")]
pub struct Cli {
    /// Telegram bot token.
    #[arg(long, env = "BOT_TOKEN", hide_env_values = true, default_value = "")]
    pub bot_token: String,

    /// Feed URLs, comma separated.
    #[arg(long, env = "RSS_URLS", value_delimiter = ',', allow_hyphen_values = true)]
    pub rss_urls: Vec<String>,

    /// Destination chat ids, comma separated.  Group ids are negative.
    #[arg(long, env = "GROUP_IDS", value_delimiter = ',', allow_hyphen_values = true)]
    pub group_ids: Vec<String>,

    /// Minutes between scans.
    #[arg(long, env = "SCAN_INTERVAL", default_value_t = 30)]
    pub scan_interval: u64,

    /// Where scan state is kept between runs.
    #[arg(long, env = "DATA_FILE", default_value = "rss_data.json")]
    pub data_file: PathBuf,

    #[arg(long, env = "TELEGRAM_API_URL", default_value = "https://api.telegram.org")]
    pub telegram_api_url: String,

    /// Per-request timeout for feed fetches, in seconds.
    #[arg(long, env = "FETCH_TIMEOUT_SECS", default_value_t = 10)]
    pub fetch_timeout_secs: u64,

    /// Per-request timeout for Bot API calls, in seconds.
    #[arg(long, env = "DELIVERY_TIMEOUT_SECS", default_value_t = 10)]
    pub delivery_timeout_secs: u64,

    #[arg(long, env = "USER_AGENT", default_value = concat!("rss-relay/", env!("CARGO_PKG_VERSION")))]
    pub user_agent: String,

    /// Fetch every feed once, report what was found, and exit.
    #[arg(long)]
    pub check: bool,
}

/// Validated runtime settings.
#[derive(Debug, Clone)]
pub struct Settings {
    pub bot_token: String,
    pub feeds: Vec<String>,
    pub destinations: Vec<String>,
    pub scan_interval: Duration,
    pub data_file: PathBuf,
    pub telegram_api_url: String,
    pub fetch_timeout: Duration,
    pub delivery_timeout: Duration,
    pub user_agent: String,
}

impl Cli {
    /// Feeds only, for `--check`, which needs no bot or destinations.
    pub fn feeds(&self) -> Result<Vec<String>, ConfigError> {
        let feeds = normalize(&self.rss_urls);
        if feeds.is_empty() {
            return Err(ConfigError::NoFeeds);
        }
        Ok(feeds)
    }

    pub fn into_settings(self) -> Result<Settings, ConfigError> {
        let bot_token = self.bot_token.trim().to_string();
        if bot_token.is_empty() {
            return Err(ConfigError::MissingBotToken);
        }
        let feeds = self.feeds()?;
        let destinations = normalize(&self.group_ids);
        if destinations.is_empty() {
            return Err(ConfigError::NoDestinations);
        }
        let scan_interval = match self.scan_interval {
            mins @ 1..=MAX_SCAN_INTERVAL_MINS => Duration::from_secs(mins * 60),
            mins => return Err(ConfigError::InvalidInterval(mins)),
        };

        Ok(Settings {
            bot_token,
            feeds,
            destinations,
            scan_interval,
            data_file: self.data_file,
            telegram_api_url: self.telegram_api_url,
            fetch_timeout: Duration::from_secs(self.fetch_timeout_secs),
            delivery_timeout: Duration::from_secs(self.delivery_timeout_secs),
            user_agent: self.user_agent,
        })
    }
}

/// Trim, drop empties, and de-duplicate keeping first occurrence.
fn normalize(values: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(values.len());
    for value in values.iter().map(|v| v.trim()).filter(|v| !v.is_empty()) {
        if !out.iter().any(|seen| seen == value) {
            out.push(value.to_string());
        }
    }
    out
}
