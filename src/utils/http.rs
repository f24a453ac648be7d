use anyhow::{Context, Result};
use reqwest::{Client, ClientBuilder, Response};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, warn};

use crate::config::Config;

pub fn create_client(config: &Config) -> Result<Client> {
    let client = ClientBuilder::new()
        .user_agent(&config.user_agent)
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .cookie_store(true)
        .pool_max_idle_per_host(2)
        .build()
        .context("Failed to build HTTP client")?;

    Ok(client)
}

/// Backoff stops doubling after this many retries (64x the base delay).
const MAX_BACKOFF_EXPONENT: u32 = 6;

/// GET `url`, retrying failed requests and non-2xx responses with
/// exponential backoff (2s, 4s, ... capped at 64s).
pub async fn fetch_with_retry(client: &Client, url: &str, max_retries: u32) -> Result<Response> {
    fetch_with_backoff(client, url, max_retries, Duration::from_secs(1)).await
}

pub(crate) fn backoff_delay(base_delay: Duration, attempt: u32) -> Duration {
    base_delay.saturating_mul(2u32.pow(attempt.min(MAX_BACKOFF_EXPONENT)))
}

pub(crate) async fn fetch_with_backoff(
    client: &Client,
    url: &str,
    max_retries: u32,
    base_delay: Duration,
) -> Result<Response> {
    let max_retries = max_retries.max(1);
    let mut last_error = anyhow::anyhow!("no request was sent");

    for attempt in 1..=max_retries {
        match client.get(url).send().await {
            Ok(response) if response.status().is_success() => return Ok(response),
            Ok(response) => {
                warn!("HTTP error {}: {}", response.status(), url);
                last_error = anyhow::anyhow!("HTTP error: {}", response.status());
            }
            Err(e) => {
                error!("Request failed for {}: {}", url, e);
                last_error = e.into();
            }
        }

        if attempt < max_retries {
            let delay = backoff_delay(base_delay, attempt);
            warn!("Retrying {} in {:?} (attempt {}/{})", url, delay, attempt + 1, max_retries);
            sleep(delay).await;
        }
    }

    Err(last_error).context(format!("Failed to fetch {} after {} attempts", url, max_retries))
}
