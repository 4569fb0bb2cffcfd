use async_trait::async_trait;
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use reqwest::Client;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

use crate::error::{Result, ScrapeError};
use crate::models::Barcode;
use crate::storage::ImageStore;
use crate::utils::http::fetch_with_retry;

// Characters that would escape the image directory or break on Windows
const FILE_NAME_UNSAFE: &AsciiSet = &CONTROLS
    .add(b'/')
    .add(b'\\')
    .add(b':')
    .add(b'*')
    .add(b'?')
    .add(b'"')
    .add(b'<')
    .add(b'>')
    .add(b'|')
    .add(b'%');

pub fn image_file_name(barcode: &Barcode) -> String {
    let name = utf8_percent_encode(barcode.as_str(), FILE_NAME_UNSAFE).to_string();
    let name = if name.starts_with('.') {
        name.replacen('.', "%2E", 1)
    } else {
        name
    };
    format!("{}.jpg", name)
}

pub struct FsImageStore {
    client: Client,
    dir: PathBuf,
    max_attempts: u32,
    backoff: Duration,
}

impl FsImageStore {
    pub fn new(client: Client, dir: impl Into<PathBuf>, max_attempts: u32, backoff: Duration) -> Self {
        Self {
            client,
            dir: dir.into(),
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl ImageStore for FsImageStore {
    async fn save_image(&self, url: &str, barcode: &Barcode) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let download_error = |message: String| ScrapeError::Download {
            url: url.to_string(),
            message,
        };

        let response = fetch_with_retry(&self.client, url, self.max_attempts, self.backoff)
            .await
            .map_err(|e| download_error(format!("{:#}", e)))?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| download_error(e.to_string()))?;

        let path = self.dir.join(image_file_name(barcode));
        tokio::fs::write(&path, &bytes).await?;

        info!("Saved image as {} ({} bytes)", path.display(), bytes.len());
        Ok(path)
    }
}
