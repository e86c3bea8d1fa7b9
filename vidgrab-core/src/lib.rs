//! Download core for vidgrab: quality mapping, the yt-dlp backend, the
//! loopback HTTP server the desktop UI talks to, and its client.

pub mod client;
pub mod config;
pub mod diagnostics;
pub mod errors;
pub mod logging;
pub mod models;
pub mod orchestrator;
pub mod quality;
pub mod server;
pub mod storage;
pub mod tools;
pub mod traits;
pub mod ytdlp;

pub use client::LoopbackClient;
pub use config::AppConfig;
pub use errors::{ClientError, ConfigError, DownloadError, ServerError};
pub use models::{DownloadOptions, DownloadOutcome, DownloadProgress, HealthStatus};
pub use orchestrator::Downloader;
pub use quality::Quality;
pub use server::{spawn_background, ServerHandle};
pub use traits::DownloaderBackend;
