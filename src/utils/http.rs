use anyhow::{Context, Result};
use reqwest::{Client, ClientBuilder, Response};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::config::Config;

pub fn create_client(config: &Config) -> Result<Client> {
    let client = ClientBuilder::new()
        .user_agent(config.user_agent.as_str())
        .timeout(Duration::from_secs(config.http_timeout_seconds))
        .pool_max_idle_per_host(config.max_concurrent_pages.max(1))
        .build()?;

    Ok(client)
}

/// Single GET that treats any non-2xx status as an error.
pub async fn fetch(client: &Client, url: &str) -> Result<Response> {
    let response = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("Request failed for {}", url))?;

    let status = response.status();
    if !status.is_success() {
        return Err(anyhow::anyhow!("HTTP error {} for {}", status, url));
    }

    Ok(response)
}

/// Longest pause between two download attempts.
pub const MAX_BACKOFF: Duration = Duration::from_secs(300);

/// Pause before retry number `attempt` (1-based): `base`, then doubling,
/// capped at [`MAX_BACKOFF`].
pub fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    let factor = 2u32
        .checked_pow(attempt.saturating_sub(1))
        .unwrap_or(u32::MAX);
    base.checked_mul(factor)
        .unwrap_or(MAX_BACKOFF)
        .min(MAX_BACKOFF)
}

/// [`fetch`] up to `max_attempts` times with exponential backoff.
pub async fn fetch_with_retry(
    client: &Client,
    url: &str,
    max_attempts: u32,
    base_delay: Duration,
) -> Result<Response> {
    let max_attempts = max_attempts.max(1);
    let mut last_error = None;

    for attempt in 1..=max_attempts {
        match fetch(client, url).await {
            Ok(response) => return Ok(response),
            Err(e) => {
                warn!("Attempt {}/{} for {} failed: {:#}", attempt, max_attempts, url, e);
                last_error = Some(e);
            }
        }

        if attempt < max_attempts {
            let delay = backoff_delay(base_delay, attempt);
            debug!("Retrying {} in {:?}", url, delay);
            sleep(delay).await;
        }
    }

    Err(last_error.unwrap_or_else(|| anyhow::anyhow!("No attempt made")))
        .with_context(|| format!("Failed to fetch {} after {} attempts", url, max_attempts))
}
