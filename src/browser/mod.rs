use async_trait::async_trait;
use std::time::Duration;

use crate::error::Result;

mod chromium;
pub use chromium::ChromiumSession;

/// A running browser that hands out isolated pages.
#[async_trait]
pub trait BrowserSession: Send + Sync {
    async fn open_page(&self) -> Result<Box<dyn LookupPage>>;
    async fn close(&self) -> Result<()>;
}

/// One browser tab owned by a single lookup.
#[async_trait]
pub trait LookupPage: Send {
    /// Navigates and waits for the page to finish loading.
    async fn goto(&mut self, url: &str, timeout: Duration) -> Result<()>;
    async fn wait_for_selector(&mut self, selector: &str, timeout: Duration) -> Result<()>;
    /// Current rendered DOM as HTML.
    async fn content(&mut self) -> Result<String>;
    async fn close(self: Box<Self>) -> Result<()>;
}
