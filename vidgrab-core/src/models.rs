// Common data models for the download pipeline

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::config::DownloadConfig;
use crate::quality::Quality;

/// Everything a backend needs to fetch one URL into one file
#[derive(Debug, Clone)]
pub struct DownloadOptions {
    /// yt-dlp `-f` expression
    pub format: String,
    /// Exact output path (yt-dlp `-o`)
    pub output_path: PathBuf,
    /// Container used when video and audio are merged
    pub merge_output_format: String,
    pub user_agent: String,
    pub timeout_secs: Option<u64>,
}

impl DownloadOptions {
    pub fn new(quality: Quality, output_path: PathBuf, config: &DownloadConfig) -> Self {
        Self {
            format: quality.format_selector(),
            output_path,
            merge_output_format: config.merge_output_format.clone(),
            user_agent: config.user_agent.clone(),
            timeout_secs: config.timeout_secs,
        }
    }
}

/// Parsed yt-dlp progress line (logged, never sent to the HTTP caller)
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadProgress {
    pub percent: f32,
    pub status: String,
}

/// What the loopback client reports back to the UI
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadOutcome {
    pub file_name: String,
    pub bytes: u64,
}

/// yt-dlp availability, shown by `/health`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInfo {
    pub name: String,
    pub version: Option<String>,
    pub path: Option<String>,
    pub is_available: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub ytdlp: ToolInfo,
}
