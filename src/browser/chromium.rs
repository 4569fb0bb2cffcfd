use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::Page;
use futures::StreamExt;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout, Instant};
use tracing::{debug, info, warn};

use super::{BrowserSession, LookupPage};
use crate::config::Config;
use crate::error::{Result, ScrapeError};

const SELECTOR_POLL_INTERVAL: Duration = Duration::from_millis(250);

fn browser_error(e: impl std::fmt::Display) -> ScrapeError {
    ScrapeError::Browser(e.to_string())
}

/// Chromium driven over CDP. One instance is shared by every lookup.
pub struct ChromiumSession {
    browser: Mutex<Browser>,
    handler: JoinHandle<()>,
}

impl ChromiumSession {
    pub async fn launch(config: &Config) -> Result<Self> {
        let mut builder = BrowserConfig::builder()
            .request_timeout(config.site.navigation_timeout())
            .window_size(1366, 900);
        if !config.headless {
            builder = builder.with_head();
        }
        let browser_config = builder.build().map_err(browser_error)?;

        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(browser_error)?;

        // The CDP connection only makes progress while this stream is polled
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("Browser handler event error: {}", e);
                }
            }
        });

        info!("Launched Chromium (headless: {})", config.headless);
        Ok(Self {
            browser: Mutex::new(browser),
            handler,
        })
    }
}

#[async_trait]
impl BrowserSession for ChromiumSession {
    async fn open_page(&self) -> Result<Box<dyn LookupPage>> {
        let page = self
            .browser
            .lock()
            .await
            .new_page("about:blank")
            .await
            .map_err(browser_error)?;

        Ok(Box::new(ChromiumPage::new(page)))
    }

    async fn close(&self) -> Result<()> {
        let mut browser = self.browser.lock().await;
        browser.close().await.map_err(browser_error)?;
        if let Err(e) = browser.wait().await {
            warn!("Browser process did not exit cleanly: {}", e);
        }
        self.handler.abort();
        info!("Browser closed");
        Ok(())
    }
}

/// `None` when `limit` is too large to represent, i.e. no deadline.
fn deadline_after(limit: Duration) -> Option<Instant> {
    Instant::now().checked_add(limit)
}

fn deadline_passed(deadline: Option<Instant>) -> bool {
    deadline.map_or(false, |deadline| Instant::now() >= deadline)
}

/// Closes the tab in the background if the lookup future is dropped before
/// `close` runs.
struct ChromiumPage {
    page: Option<Page>,
    runtime_handle: tokio::runtime::Handle,
}

impl ChromiumPage {
    fn new(page: Page) -> Self {
        Self {
            page: Some(page),
            runtime_handle: tokio::runtime::Handle::current(),
        }
    }

    fn page(&self) -> Result<&Page> {
        self.page
            .as_ref()
            .ok_or_else(|| ScrapeError::Browser("page already closed".to_string()))
    }
}

#[async_trait]
impl LookupPage for ChromiumPage {
    async fn goto(&mut self, url: &str, limit: Duration) -> Result<()> {
        let page = self.page()?;
        let navigation = async {
            page.goto(url).await?;
            page.wait_for_navigation().await?;
            Ok::<(), chromiumoxide::error::CdpError>(())
        };

        match timeout(limit, navigation).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(ScrapeError::Network {
                url: url.to_string(),
                message: e.to_string(),
            }),
            Err(_) => Err(ScrapeError::NavigationTimeout {
                url: url.to_string(),
                timeout: limit,
            }),
        }
    }

    async fn wait_for_selector(&mut self, selector: &str, limit: Duration) -> Result<()> {
        let page = self.page()?;
        let deadline = deadline_after(limit);

        loop {
            if page.find_element(selector).await.is_ok() {
                return Ok(());
            }
            if deadline_passed(deadline) {
                return Err(ScrapeError::SelectorNotFound {
                    selector: selector.to_string(),
                    timeout: limit,
                });
            }
            sleep(SELECTOR_POLL_INTERVAL).await;
        }
    }

    async fn content(&mut self) -> Result<String> {
        self.page()?.content().await.map_err(browser_error)
    }

    async fn close(mut self: Box<Self>) -> Result<()> {
        match self.page.take() {
            Some(page) => page.close().await.map_err(browser_error),
            None => Ok(()),
        }
    }
}

impl Drop for ChromiumPage {
    fn drop(&mut self) {
        if let Some(page) = self.page.take() {
            self.runtime_handle.spawn(async move {
                if let Err(e) = page.close().await {
                    warn!("Background page close failed: {}", e);
                }
            });
        }
    }
}
