use async_trait::async_trait;

use crate::browser::BrowserSession;
use crate::config::SiteConfig;
use crate::models::LookupOutcome;

mod dovgan;

pub use dovgan::DovganScraper;

#[async_trait]
pub trait ProductLookup: Send + Sync {
    /// Never fails: every error ends up in the outcome.
    async fn lookup(&self, session: &dyn BrowserSession, article_number: &str) -> LookupOutcome;
    fn site_config(&self) -> &SiteConfig;
}
