use anyhow::{ensure, Context, Result};
use scraper::Selector;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use url::Url;

/// File looked up in the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "harvester.toml";

/// Environment variables override file values, e.g.
/// `HARVESTER__SOURCE__START_URL` or `HARVESTER__CHANNEL_CAPACITY`.
pub const ENV_PREFIX: &str = "HARVESTER";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub source: SourceConfig,
    pub channel_capacity: usize,
    pub idle_delay_ms: u64,
    pub user_agent: String,
    pub request_timeout_secs: u64,
    pub max_retries: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub start_url: String,
    pub listing_selector: String,
    pub fragment_selector: String,
    #[serde(default)]
    pub next_page_selector: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(DEFAULT_CONFIG_FILE)
    }

    /// Defaults, then the file at `path` if it exists, then the environment.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let settings = config::Config::builder()
            .set_default("channel_capacity", 32)?
            .set_default("idle_delay_ms", 500)?
            .set_default(
                "user_agent",
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/108.0.0.0 Safari/537.36",
            )?
            .set_default("request_timeout_secs", 25)?
            .set_default("max_retries", 3)?
            .set_default("source.start_url", "https://www.facebook.com/marketplace/")?
            .set_default("source.listing_selector", r#"a[href^="/marketplace/item"]"#)?
            .set_default("source.fragment_selector", r#"span[dir="auto"]"#)?
            .set_default("source.next_page_selector", r#"a[rel="next"]"#)?
            .add_source(config::File::from(path).required(false))
            .add_source(config::Environment::with_prefix(ENV_PREFIX).prefix_separator("__").separator("__"))
            .build()
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?;

        let config: Config = settings
            .try_deserialize()
            .context("Invalid configuration")?;
        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(self.channel_capacity > 0, "channel_capacity must be greater than zero");

        Url::parse(&self.source.start_url)
            .with_context(|| format!("Invalid source.start_url: {}", self.source.start_url))?;

        let mut selectors = vec![&self.source.listing_selector, &self.source.fragment_selector];
        if let Some(next) = &self.source.next_page_selector {
            selectors.push(next);
        }
        for selector in selectors {
            Selector::parse(selector)
                .map_err(|e| anyhow::anyhow!("Invalid CSS selector {:?}: {:?}", selector, e))?;
        }

        Ok(())
    }

    pub fn idle_delay(&self) -> Duration {
        Duration::from_millis(self.idle_delay_ms)
    }
}
