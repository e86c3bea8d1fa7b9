// Error types for the download pipeline, config loading and the loopback link

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DownloadError {
    /// yt-dlp (or the python interpreter running it) could not be started
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    /// yt-dlp exited with a failure status; carries its stderr
    #[error("Execution error: {0}")]
    ExecutionError(String),

    /// Process was killed after the configured timeout
    #[error("Timed out after {0}s")]
    Timeout(u64),

    /// yt-dlp reported success but nothing was written at the expected path
    #[error("Output file missing: {}", .0.display())]
    MissingOutput(PathBuf),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Every configured backend failed
    #[error("All backends failed: {0}")]
    AllBackendsFailed(String),
}

impl DownloadError {
    /// Stable short code used as a structured log field
    pub fn code(&self) -> &'static str {
        match self {
            Self::ToolNotFound(_) => "tool_not_found",
            Self::ExecutionError(_) => "execution_error",
            Self::Timeout(_) => "timeout",
            Self::MissingOutput(_) => "missing_output",
            Self::InvalidUrl(_) => "invalid_url",
            Self::Io(_) => "io",
            Self::AllBackendsFailed(_) => "all_backends_failed",
        }
    }
}

// Classify raw yt-dlp stderr into the closest variant
impl From<String> for DownloadError {
    fn from(s: String) -> Self {
        if s.contains("Unsupported URL") || s.contains("is not a valid URL") {
            return Self::InvalidUrl(s);
        }

        if s.contains("command not found") || s.contains("No such file or directory") {
            return Self::ToolNotFound(s);
        }

        Self::ExecutionError(s)
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value}")]
    InvalidEnv { key: &'static str, value: String },

    #[error("Failed to read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Server I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Loopback request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status
    #[error("Server returned {status}: {body}")]
    Status { status: u16, body: String },
}
