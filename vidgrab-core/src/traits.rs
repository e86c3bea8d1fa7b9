// Downloader backend trait definition

use async_trait::async_trait;
use std::path::PathBuf;

use crate::errors::DownloadError;
use crate::models::DownloadOptions;

/// Trait for downloader backend implementations
#[async_trait]
pub trait DownloaderBackend: Send + Sync {
    /// Name of the backend (for logging)
    fn name(&self) -> &'static str;

    /// Fetch `url` into `options.output_path`; returns the path written
    async fn download(&self, url: &str, options: &DownloadOptions)
        -> Result<PathBuf, DownloadError>;
}
