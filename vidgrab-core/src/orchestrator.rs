// Orchestrator - picks the output path and runs backends with fallback

use std::path::PathBuf;
use std::sync::Arc;

use crate::config::DownloadConfig;
use crate::errors::DownloadError;
use crate::models::DownloadOptions;
use crate::quality::Quality;
use crate::storage;
use crate::traits::DownloaderBackend;
use crate::ytdlp::YtDlpBackend;

pub struct Downloader {
    backends: Vec<Box<dyn DownloaderBackend>>,
    config: DownloadConfig,
}

impl Downloader {
    pub fn new(config: DownloadConfig) -> Self {
        Self {
            backends: Vec::new(),
            config,
        }
    }

    /// Downloader with the yt-dlp backend registered
    pub fn with_ytdlp(config: DownloadConfig) -> Self {
        let mut downloader = Self::new(config);
        let backend = YtDlpBackend::new(&downloader.config);
        downloader.add_backend(Box::new(backend));
        downloader
    }

    pub fn add_backend(&mut self, backend: Box<dyn DownloaderBackend>) {
        self.backends.push(backend);
    }

    pub fn config(&self) -> &DownloadConfig {
        &self.config
    }

    pub fn into_shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// Download `url` at `quality` into a fresh file in the downloads
    /// directory. The returned path exists.
    pub async fn download_video(
        &self,
        url: &str,
        quality: Quality,
    ) -> Result<PathBuf, DownloadError> {
        let url = url.trim();
        if url.is_empty() {
            return Err(DownloadError::InvalidUrl("empty URL".to_string()));
        }

        storage::ensure_dir(&self.config.output_dir)?;
        let output_path =
            storage::unique_video_path(&self.config.output_dir, &self.config.merge_output_format);
        let options = DownloadOptions::new(quality, output_path, &self.config);

        let mut failures = Vec::new();
        for backend in &self.backends {
            tracing::info!(backend = backend.name(), url, quality = %quality, "Trying backend");

            match backend.download(url, &options).await {
                Ok(path) if path.exists() => {
                    tracing::info!(backend = backend.name(), path = %path.display(), "Download finished");
                    return Ok(path);
                }
                Ok(path) => {
                    tracing::error!(backend = backend.name(), path = %path.display(), "Backend reported success but file is missing");
                    failures.push(format!("{}: output missing", backend.name()));
                }
                Err(e) => {
                    tracing::error!(backend = backend.name(), error = %e, code = e.code(), "Download error");
                    failures.push(format!("{}: {}", backend.name(), e));
                }
            }
        }

        if failures.is_empty() {
            return Err(DownloadError::AllBackendsFailed("no backend configured".to_string()));
        }
        Err(DownloadError::AllBackendsFailed(failures.join("; ")))
    }
}
