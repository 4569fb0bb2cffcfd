use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::Result;

/// Optional override file, looked up in the working directory.
pub const CONFIG_FILE: &str = "ean_scraper";
/// Environment overrides, e.g. `EAN_SCRAPER__SITE__MAX_ATTEMPTS=5`.
pub const ENV_PREFIX: &str = "EAN_SCRAPER";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub sheet_url: String,
    pub output_csv: PathBuf,
    pub image_dir: PathBuf,
    pub user_agent: String,
    pub http_timeout_seconds: u64,
    pub download_retries: u32,
    pub download_backoff_ms: u64,
    pub max_concurrent_pages: usize,
    pub headless: bool,
    pub site: SiteConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    pub name: String,
    pub base_url: String,
    pub search_path: String,
    pub navigation_timeout_ms: u64,
    pub selector_timeout_ms: u64,
    pub settle_delay_ms: u64,
    pub retry_delay_ms: u64,
    pub max_attempts: u32,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            sheet_url: "https://docs.google.com/spreadsheets/d/e/2PACX-1vRVRzQdPegvGFlgxs55vjD9VCNYjn83TrQ_yZy9F9TXhdbQLzdx14rzEvve-s_zfBo3wrR7Gp4pngAz/pub?output=csv".to_string(),
            output_csv: PathBuf::from("./opdateret_ark2.csv"),
            image_dir: PathBuf::from("./images"),
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/108.0.0.0 Safari/537.36".to_string(),
            http_timeout_seconds: 60,
            download_retries: 3,
            download_backoff_ms: 2_000,
            max_concurrent_pages: 4,
            headless: true,
            site: SiteConfig::default(),
        }
    }
}

impl Default for SiteConfig {
    fn default() -> Self {
        SiteConfig {
            name: "Dovgan".to_string(),
            base_url: "https://www.dovgan.de".to_string(),
            search_path: "/search".to_string(),
            navigation_timeout_ms: 300_000, // 5 minutes
            selector_timeout_ms: 5_000,
            settle_delay_ms: 2_000,
            retry_delay_ms: 3_000,
            max_attempts: 3,
        }
    }
}

impl Config {
    /// Built-in defaults, then `ean_scraper.{toml,yaml,json}` if present, then
    /// `EAN_SCRAPER__*` environment variables.
    pub fn load() -> Result<Self> {
        let settings = ::config::Config::builder()
            .add_source(::config::Config::try_from(&Config::default())?)
            .add_source(::config::File::with_name(CONFIG_FILE).required(false))
            .add_source(
                ::config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}

impl Config {
    /// First pause between image download attempts; doubles after that.
    pub fn download_backoff(&self) -> Duration {
        Duration::from_millis(self.download_backoff_ms)
    }
}

impl SiteConfig {
    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_millis(self.navigation_timeout_ms)
    }

    pub fn selector_timeout(&self) -> Duration {
        Duration::from_millis(self.selector_timeout_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn search_url(&self, article_number: &str) -> String {
        let query = serde_urlencoded::to_string([("query", article_number.trim())])
            .unwrap_or_else(|_| format!("query={}", article_number.trim()));
        format!(
            "{}{}?{}",
            self.base_url.trim_end_matches('/'),
            self.search_path,
            query
        )
    }

    /// Turns a result link into an absolute product URL on this site.
    pub fn product_url(&self, href: &str) -> String {
        let href = href.trim();
        if href.starts_with("http://") || href.starts_with("https://") {
            return href.to_string();
        }

        let base = self.base_url.trim_end_matches('/');
        if href.starts_with('/') {
            format!("{}{}", base, href)
        } else {
            format!("{}/{}", base, href)
        }
    }
}
