//! In-memory browser and image store for unit tests.

use async_trait::async_trait;
use scraper::{Html, Selector};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::sleep;

use crate::browser::{BrowserSession, LookupPage};
use crate::error::{Result, ScrapeError};
use crate::models::Barcode;
use crate::storage::ImageStore;

#[derive(Clone)]
pub struct PageScript {
    html: String,
    fail_first: usize,
    load_time: Duration,
}

impl PageScript {
    pub fn html(html: &str) -> Self {
        Self {
            html: html.to_string(),
            fail_first: 0,
            load_time: Duration::ZERO,
        }
    }

    /// The first `n` navigations to this URL time out.
    pub fn failing_first(mut self, n: usize) -> Self {
        self.fail_first = n;
        self
    }

    pub fn loading_for(mut self, load_time: Duration) -> Self {
        self.load_time = load_time;
        self
    }
}

#[derive(Default)]
struct BrowserState {
    visits: HashMap<String, usize>,
    opened: usize,
    closed: usize,
    open_now: usize,
    max_open: usize,
    closed_browser: bool,
}

#[derive(Clone, Default)]
pub struct ScriptedBrowser {
    pages: Arc<HashMap<String, PageScript>>,
    state: Arc<Mutex<BrowserState>>,
    refuse_pages: bool,
}

impl ScriptedBrowser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, url: &str, script: PageScript) -> Self {
        Arc::make_mut(&mut self.pages).insert(url.to_string(), script);
        self
    }

    pub fn refusing_pages(mut self) -> Self {
        self.refuse_pages = true;
        self
    }

    pub fn visits(&self, url: &str) -> usize {
        self.state.lock().unwrap().visits.get(url).copied().unwrap_or(0)
    }

    pub fn opened(&self) -> usize {
        self.state.lock().unwrap().opened
    }

    pub fn closed(&self) -> usize {
        self.state.lock().unwrap().closed
    }

    pub fn max_open(&self) -> usize {
        self.state.lock().unwrap().max_open
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().unwrap().closed_browser
    }
}

#[async_trait]
impl BrowserSession for ScriptedBrowser {
    async fn open_page(&self) -> Result<Box<dyn LookupPage>> {
        if self.refuse_pages {
            return Err(ScrapeError::Browser("target crashed".to_string()));
        }

        let mut state = self.state.lock().unwrap();
        state.opened += 1;
        state.open_now += 1;
        state.max_open = state.max_open.max(state.open_now);

        Ok(Box::new(ScriptedPage {
            browser: self.clone(),
            current: String::new(),
        }))
    }

    async fn close(&self) -> Result<()> {
        self.state.lock().unwrap().closed_browser = true;
        Ok(())
    }
}

struct ScriptedPage {
    browser: ScriptedBrowser,
    current: String,
}

#[async_trait]
impl LookupPage for ScriptedPage {
    async fn goto(&mut self, url: &str, timeout: Duration) -> Result<()> {
        let visit = {
            let mut state = self.browser.state.lock().unwrap();
            let visits = state.visits.entry(url.to_string()).or_insert(0);
            *visits += 1;
            *visits
        };

        let script = self.browser.pages.get(url).cloned().ok_or_else(|| ScrapeError::Network {
            url: url.to_string(),
            message: "404 Not Found".to_string(),
        })?;

        if visit <= script.fail_first {
            sleep(timeout).await;
            return Err(ScrapeError::NavigationTimeout {
                url: url.to_string(),
                timeout,
            });
        }

        sleep(script.load_time).await;
        self.current = script.html;
        Ok(())
    }

    async fn wait_for_selector(&mut self, selector: &str, timeout: Duration) -> Result<()> {
        let present = {
            let document = Html::parse_document(&self.current);
            let parsed = Selector::parse(selector).unwrap();
            let found = document.select(&parsed).next().is_some();
            found
        };

        if present {
            return Ok(());
        }
        sleep(timeout).await;
        Err(ScrapeError::SelectorNotFound {
            selector: selector.to_string(),
            timeout,
        })
    }

    async fn content(&mut self) -> Result<String> {
        Ok(self.current.clone())
    }

    async fn close(self: Box<Self>) -> Result<()> {
        let mut state = self.browser.state.lock().unwrap();
        state.closed += 1;
        state.open_now -= 1;
        Ok(())
    }
}

/// Remembers every save instead of downloading.
#[derive(Default)]
pub struct RecordingImageStore {
    saved: Mutex<Vec<(String, String)>>,
    fail: bool,
}

impl RecordingImageStore {
    pub fn failing() -> Self {
        Self {
            saved: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    /// `(url, barcode)` pairs in save order.
    pub fn saved(&self) -> Vec<(String, String)> {
        self.saved.lock().unwrap().clone()
    }
}

#[async_trait]
impl ImageStore for RecordingImageStore {
    async fn save_image(&self, url: &str, barcode: &Barcode) -> Result<PathBuf> {
        if self.fail {
            return Err(ScrapeError::Download {
                url: url.to_string(),
                message: "HTTP error: 500".to_string(),
            });
        }

        self.saved
            .lock()
            .unwrap()
            .push((url.to_string(), barcode.to_string()));
        Ok(PathBuf::from(format!("images/{}.jpg", barcode)))
    }
}
