use async_trait::async_trait;
use std::path::PathBuf;

use crate::error::Result;
use crate::models::Barcode;

mod images;
pub use images::{image_file_name, FsImageStore};

/// Where product images end up, keyed by barcode.
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Fetches `url` and stores it as `<barcode>.jpg`, replacing any earlier file.
    async fn save_image(&self, url: &str, barcode: &Barcode) -> Result<PathBuf>;
}
