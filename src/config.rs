use {
    crate::kernel::retry::RetryPolicy,
    anyhow::Result,
    clap::{
        crate_authors,
        crate_description,
        crate_name,
        crate_version,
        Args,
        Parser,
    },
    std::{
        fs,
        time::Duration,
    },
};

#[derive(Parser, Debug)]
#[command(name = crate_name!())]
#[command(author = crate_authors!())]
#[command(about = crate_description!())]
#[command(version = crate_version!())]
pub enum Options {
    /// Run the auction engine service.
    Run(RunOptions),
}

#[derive(Args, Clone, Debug)]
pub struct RunOptions {
    #[command(flatten)]
    pub config: ConfigOptions,

    /// Postgres connection string for auction state.
    #[arg(long = "database-url")]
    #[arg(env = "DATABASE_URL")]
    pub database_url: String,

    /// Bot token used to publish cards and deliver notes.
    #[arg(long = "telegram-bot-token")]
    #[arg(env = "TELEGRAM_BOT_TOKEN")]
    pub telegram_bot_token: String,
}

#[derive(Args, Clone, Debug)]
#[command(next_help_heading = "Config Options")]
#[group(id = "Config")]
pub struct ConfigOptions {
    /// Path to a configuration file with auction timing and channel settings
    #[arg(long = "config")]
    #[arg(env = "AUCTION_CONFIG")]
    #[arg(default_value = "config.yaml")]
    pub config: String,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct Config {
    /// Channel the auction cards are published to.
    pub channel_id: i64,

    /// How long an auction stays open after its last accepted bid.
    #[serde(with = "humantime_serde", default = "default_bid_timeout")]
    pub bid_timeout: Duration,

    /// Cadence of the announcement refresh cycle.
    #[serde(with = "humantime_serde", default = "default_refresh_interval")]
    pub refresh_interval: Duration,

    /// Cadence of the timer integrity cycle.
    #[serde(with = "humantime_serde", default = "default_integrity_interval")]
    pub integrity_interval: Duration,

    /// Per-request timeout against the announcer API.
    #[serde(with = "humantime_serde", default = "default_request_timeout")]
    pub request_timeout: Duration,

    /// Backoff policy shared by storage retries and announcer calls.
    #[serde(default)]
    pub retry: RetryPolicy,
}

fn default_bid_timeout() -> Duration {
    Duration::from_secs(240 * 60)
}

fn default_refresh_interval() -> Duration {
    Duration::from_secs(60)
}

fn default_integrity_interval() -> Duration {
    Duration::from_secs(300)
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(10)
}

impl Config {
    pub fn load(path: &str) -> Result<Config> {
        let yaml_content = fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&yaml_content)?;
        Ok(config)
    }
}
