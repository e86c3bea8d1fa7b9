//! Shared fixtures for the server and loopback tests.

#![allow(dead_code)]

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use vidgrab_core::config::DownloadConfig;
use vidgrab_core::{DownloadError, DownloadOptions, Downloader, DownloaderBackend};

pub const FAKE_VIDEO: &[u8] = b"\x00\x00\x00\x18ftypmp42fake-video-bytes";

/// Backend that "downloads" by writing `FAKE_VIDEO` to the requested path
#[derive(Default)]
pub struct FakeBackend {
    pub calls: Arc<Mutex<Vec<(String, String)>>>,
}

#[async_trait]
impl DownloaderBackend for FakeBackend {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn download(
        &self,
        url: &str,
        options: &DownloadOptions,
    ) -> Result<PathBuf, DownloadError> {
        self.calls
            .lock()
            .unwrap()
            .push((url.to_string(), options.format.clone()));
        tokio::fs::write(&options.output_path, FAKE_VIDEO).await?;
        Ok(options.output_path.clone())
    }
}

/// Backend that always fails the way yt-dlp does on a dead link
pub struct BrokenBackend;

#[async_trait]
impl DownloaderBackend for BrokenBackend {
    fn name(&self) -> &'static str {
        "broken"
    }

    async fn download(&self, _: &str, _: &DownloadOptions) -> Result<PathBuf, DownloadError> {
        Err(DownloadError::from("ERROR: [generic] Video unavailable".to_string()))
    }
}

/// Backend that writes `size` bytes, for bodies larger than one chunk
pub struct LargeBackend {
    pub size: usize,
}

#[async_trait]
impl DownloaderBackend for LargeBackend {
    fn name(&self) -> &'static str {
        "large"
    }

    async fn download(
        &self,
        _: &str,
        options: &DownloadOptions,
    ) -> Result<PathBuf, DownloadError> {
        tokio::fs::write(&options.output_path, vec![0x42u8; self.size]).await?;
        Ok(options.output_path.clone())
    }
}

/// Sets the flag when dropped, i.e. when the download future is cancelled
struct CancelGuard(Arc<AtomicBool>);

impl Drop for CancelGuard {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

/// Backend that hangs like a long yt-dlp run
pub struct SlowBackend {
    pub delay: Duration,
    pub dropped: Arc<AtomicBool>,
}

#[async_trait]
impl DownloaderBackend for SlowBackend {
    fn name(&self) -> &'static str {
        "slow"
    }

    async fn download(
        &self,
        _: &str,
        options: &DownloadOptions,
    ) -> Result<PathBuf, DownloadError> {
        let _guard = CancelGuard(self.dropped.clone());
        tokio::time::sleep(self.delay).await;
        tokio::fs::write(&options.output_path, FAKE_VIDEO).await?;
        Ok(options.output_path.clone())
    }
}

pub fn download_config(root: &Path) -> DownloadConfig {
    DownloadConfig {
        output_dir: root.join("Downloads"),
        // never run a real yt-dlp from the health probe
        ytdlp_path: Some(root.join("no-such-yt-dlp")),
        ..DownloadConfig::default()
    }
}

/// Downloader with a `FakeBackend`; returns the shared call log too
pub fn fake_downloader(root: &Path) -> (Arc<Downloader>, Arc<Mutex<Vec<(String, String)>>>) {
    let backend = FakeBackend::default();
    let calls = backend.calls.clone();
    let mut downloader = Downloader::new(download_config(root));
    downloader.add_backend(Box::new(backend));
    (downloader.into_shared(), calls)
}

pub fn broken_downloader(root: &Path) -> Arc<Downloader> {
    let mut downloader = Downloader::new(download_config(root));
    downloader.add_backend(Box::new(BrokenBackend));
    downloader.into_shared()
}

pub fn large_downloader(root: &Path, size: usize) -> Arc<Downloader> {
    let mut downloader = Downloader::new(download_config(root));
    downloader.add_backend(Box::new(LargeBackend { size }));
    downloader.into_shared()
}

/// Downloader whose only backend takes `delay`; the flag flips if it is cancelled
pub fn slow_downloader(root: &Path, delay: Duration) -> (Arc<Downloader>, Arc<AtomicBool>) {
    let dropped = Arc::new(AtomicBool::new(false));
    let mut downloader = Downloader::new(download_config(root));
    downloader.add_backend(Box::new(SlowBackend {
        delay,
        dropped: dropped.clone(),
    }));
    (downloader.into_shared(), dropped)
}
