use async_trait::async_trait;
use std::sync::Arc;
use tokio::time::sleep;
use tracing::{error, info, warn};

use crate::browser::{BrowserSession, LookupPage};
use crate::config::{Config, SiteConfig};
use crate::error::{Result, ScrapeError};
use crate::models::{LookupOutcome, ProductFields};
use crate::parsers::{extract_product, extract_product_link, FIELD_VALUE, SEARCH_RESULT_IMAGE};
use crate::scrapers::ProductLookup;
use crate::storage::ImageStore;

pub struct DovganScraper {
    config: Arc<Config>,
    images: Arc<dyn ImageStore>,
}

impl DovganScraper {
    pub fn new(config: Arc<Config>, images: Arc<dyn ImageStore>) -> Self {
        Self { config, images }
    }

    /// Search, follow the first hit, read the product fields.
    async fn attempt(&self, page: &mut dyn LookupPage, article_number: &str) -> Result<ProductFields> {
        let site = self.site_config();

        let search_url = site.search_url(article_number);
        page.goto(&search_url, site.navigation_timeout()).await?;
        page.wait_for_selector(SEARCH_RESULT_IMAGE, site.selector_timeout())
            .await?;

        let search_html = page.content().await?;
        let href = extract_product_link(&search_html).ok_or_else(|| {
            ScrapeError::SelectorNotFound {
                selector: format!("a > {}", SEARCH_RESULT_IMAGE),
                timeout: site.selector_timeout(),
            }
        })?;
        let product_url = site.product_url(&href);

        page.goto(&product_url, site.navigation_timeout()).await?;
        page.wait_for_selector(FIELD_VALUE, site.selector_timeout())
            .await?;
        if !site.settle_delay().is_zero() {
            sleep(site.settle_delay()).await;
        }

        let product_html = page.content().await?;
        extract_product(&product_html, &product_url)
    }

    async fn run_attempts(&self, page: &mut dyn LookupPage, article_number: &str) -> LookupOutcome {
        let site = self.site_config();
        let max_attempts = site.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            match self.attempt(page, article_number).await {
                Ok(fields) => return self.found(fields).await,
                Err(e) if !e.is_retryable() => {
                    warn!("Article {}: {}", article_number, e);
                    return LookupOutcome::NotFound {
                        reason: e.to_string(),
                    };
                }
                Err(e) => {
                    error!(
                        "Article {}: attempt {}/{} failed: {}",
                        article_number, attempt, max_attempts, e
                    );
                    if attempt >= max_attempts {
                        error!(
                            "Max retries reached. Unable to get EAN for {}",
                            article_number
                        );
                        return LookupOutcome::Failed {
                            attempts: attempt,
                            last_error: e.to_string(),
                        };
                    }
                    warn!("Retrying article {} in {:?}...", article_number, site.retry_delay());
                    sleep(site.retry_delay()).await;
                }
            }
        }
    }

    async fn found(&self, fields: ProductFields) -> LookupOutcome {
        let ProductFields { barcode, image_url } = fields;
        if !barcode.looks_like_ean() {
            warn!("Barcode {} does not look like an EAN", barcode);
        }

        info!("Fetching image for EAN {}", barcode);
        let image_saved = match self.images.save_image(&image_url, &barcode).await {
            Ok(_) => true,
            Err(e) => {
                error!("Image for EAN {} was not saved: {}", barcode, e);
                false
            }
        };

        LookupOutcome::Found {
            barcode,
            image_url,
            image_saved,
        }
    }
}

#[async_trait]
impl ProductLookup for DovganScraper {
    async fn lookup(&self, session: &dyn BrowserSession, article_number: &str) -> LookupOutcome {
        info!("Searching {} for article {}", self.site_config().name, article_number);
        let mut page = match session.open_page().await {
            Ok(page) => page,
            Err(e) => {
                error!("Could not open a page for article {}: {}", article_number, e);
                return LookupOutcome::Failed {
                    attempts: 0,
                    last_error: e.to_string(),
                };
            }
        };

        let outcome = self.run_attempts(page.as_mut(), article_number).await;

        // Single exit: the page is released whatever the outcome
        if let Err(e) = page.close().await {
            warn!("Failed to close page for article {}: {}", article_number, e);
        }
        outcome
    }

    fn site_config(&self) -> &SiteConfig {
        &self.config.site
    }
}
