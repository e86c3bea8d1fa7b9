// Application configuration
//
// Resolution order: built-in defaults, then `<config dir>/vidgrab/config.json`
// when it exists, then environment variables.

use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};

use crate::errors::ConfigError;

pub const DEFAULT_PORT: u16 = 10000;
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub download: DownloadConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: IpAddr,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadConfig {
    /// Where finished files land
    pub output_dir: PathBuf,
    /// Explicit yt-dlp executable; searched for when unset
    pub ytdlp_path: Option<PathBuf>,
    /// Python interpreter used as `<python> -m yt_dlp` instead of the binary
    pub python: Option<String>,
    pub user_agent: String,
    pub merge_output_format: String,
    /// Kill yt-dlp after this many seconds; no limit when unset
    pub timeout_secs: Option<u64>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            download: DownloadConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: DEFAULT_PORT,
        }
    }
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            ytdlp_path: None,
            python: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            merge_output_format: "mp4".to_string(),
            timeout_secs: None,
        }
    }
}

impl ServerConfig {
    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Base URL the loopback client talks to
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr())
    }
}

/// `~/Downloads`, or `./Downloads` when no home directory is known
pub fn default_output_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("Downloads")
}

/// `<config dir>/vidgrab/config.json`
pub fn config_file_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("vidgrab").join("config.json"))
}

impl AppConfig {
    /// Defaults + config file + environment
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match config_file_path() {
            Some(path) if path.exists() => Self::from_file(&path)?,
            _ => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Overlay environment variables; `lookup` is injectable for tests
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("VIDGRAB_HOST") {
            self.server.host = value.parse().map_err(|_| ConfigError::InvalidEnv {
                key: "VIDGRAB_HOST",
                value,
            })?;
        }
        if let Some(value) = lookup("VIDGRAB_PORT") {
            self.server.port = value.parse().map_err(|_| ConfigError::InvalidEnv {
                key: "VIDGRAB_PORT",
                value,
            })?;
        }
        if let Some(value) = lookup("VIDGRAB_DOWNLOAD_DIR") {
            self.download.output_dir = PathBuf::from(value);
        }
        if let Some(value) = lookup("VIDGRAB_YTDLP") {
            self.download.ytdlp_path = Some(PathBuf::from(value));
        }
        // Same override the desktop build has always honoured
        if let Some(value) = lookup("YTDLP_PYTHON") {
            self.download.python = Some(value);
        }
        if let Some(value) = lookup("VIDGRAB_USER_AGENT") {
            self.download.user_agent = value;
        }
        if let Some(value) = lookup("VIDGRAB_DOWNLOAD_TIMEOUT") {
            let secs: u64 = value.parse().map_err(|_| ConfigError::InvalidEnv {
                key: "VIDGRAB_DOWNLOAD_TIMEOUT",
                value,
            })?;
            self.download.timeout_secs = (secs > 0).then_some(secs);
        }
        Ok(())
    }
}
