// yt-dlp backend - runs the external tool for one URL into one file

use async_trait::async_trait;
use regex::Regex;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};

use crate::config::DownloadConfig;
use crate::diagnostics::diagnose_error;
use crate::errors::DownloadError;
use crate::models::{DownloadOptions, DownloadProgress};
use crate::tools::YtDlpCommand;
use crate::traits::DownloaderBackend;

pub struct YtDlpBackend {
    command: YtDlpCommand,
}

impl YtDlpBackend {
    pub fn new(config: &DownloadConfig) -> Self {
        Self {
            command: YtDlpCommand::resolve(config),
        }
    }

    pub fn with_command(command: YtDlpCommand) -> Self {
        Self { command }
    }
}

/// Arguments for a single download; the URL always goes last
pub fn build_args(url: &str, options: &DownloadOptions) -> Vec<String> {
    vec![
        "-f".to_string(),
        options.format.clone(),
        "-o".to_string(),
        options.output_path.to_string_lossy().to_string(),
        "--merge-output-format".to_string(),
        options.merge_output_format.clone(),
        "--no-playlist".to_string(),
        // quiet, but keep one progress line per update on stdout
        "--quiet".to_string(),
        "--progress".to_string(),
        "--newline".to_string(),
        "--no-warnings".to_string(),
        "--user-agent".to_string(),
        options.user_agent.clone(),
        // a URL starting with '-' must not be read as an option
        "--".to_string(),
        url.to_string(),
    ]
}

/// Parse yt-dlp progress line like:
/// [download]   6.2% of ~ 343.72MiB at  420.30KiB/s ETA 12:32 (frag 29/454)
pub fn parse_progress(line: &str) -> Option<DownloadProgress> {
    lazy_static::lazy_static! {
        static ref PROGRESS_RE: Regex = Regex::new(
            r"\[download\]\s+(\d+\.?\d*)%\s+of\s+~?\s*(\d+\.?\d*\s*\w+)(?:\s+at\s+(\S+/s|Unknown\s+B/s))?(?:\s+ETA\s+(\S+))?"
        ).unwrap();
        static ref DEST_RE: Regex = Regex::new(r"\[download\]\s+Destination:\s+(.+)").unwrap();
        static ref MERGE_RE: Regex = Regex::new(r"\[Merger?\]\s+Merging").unwrap();
        static ref ALREADY_RE: Regex = Regex::new(r"has already been downloaded").unwrap();
    }

    if let Some(caps) = PROGRESS_RE.captures(line) {
        let percent: f32 = caps.get(1)?.as_str().parse().ok()?;
        let size = caps.get(2).map(|m| m.as_str()).unwrap_or("?");
        let speed = caps.get(3).map(|m| m.as_str());
        let eta = caps.get(4).map(|m| m.as_str());

        let status = match (speed, eta) {
            (Some(speed), Some(eta)) => format!("{:.1}% of {} @ {} ETA {}", percent, size, speed, eta),
            (Some(speed), None) => format!("{:.1}% of {} @ {}", percent, size, speed),
            _ => format!("{:.1}% of {}", percent, size),
        };
        return Some(DownloadProgress { percent, status });
    }

    if let Some(caps) = DEST_RE.captures(line) {
        let filename = caps.get(1).map(|m| m.as_str()).unwrap_or("file");
        return Some(DownloadProgress {
            percent: 0.0,
            status: format!("Starting: {}", filename.trim()),
        });
    }

    if MERGE_RE.is_match(line) {
        return Some(DownloadProgress {
            percent: 99.0,
            status: "Merging video and audio".to_string(),
        });
    }

    if ALREADY_RE.is_match(line) {
        return Some(DownloadProgress {
            percent: 100.0,
            status: "File already downloaded".to_string(),
        });
    }

    None
}

#[async_trait]
impl DownloaderBackend for YtDlpBackend {
    fn name(&self) -> &'static str {
        "yt-dlp"
    }

    async fn download(
        &self,
        url: &str,
        options: &DownloadOptions,
    ) -> Result<PathBuf, DownloadError> {
        let args = build_args(url, options);
        tracing::info!(
            program = %self.command.program,
            format = %options.format,
            output = %options.output_path.display(),
            "Starting yt-dlp"
        );

        let mut child = self
            .command
            .tokio_command()
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| DownloadError::ToolNotFound(format!("{}: {}", self.command.program, e)))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| DownloadError::ExecutionError("Failed to capture stdout".to_string()))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| DownloadError::ExecutionError("Failed to capture stderr".to_string()))?;

        let stderr_task = tokio::spawn(async move {
            let mut buf = String::new();
            stderr.read_to_string(&mut buf).await?;
            Ok::<_, std::io::Error>(buf)
        });

        // Dropping this future kills the child (kill_on_drop)
        let run = async move {
            let mut lines = BufReader::new(stdout).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                if let Some(progress) = parse_progress(&line) {
                    tracing::debug!(percent = progress.percent, status = %progress.status, "yt-dlp progress");
                }
            }
            child.wait().await
        };

        let status = match options.timeout_secs {
            Some(secs) => match tokio::time::timeout(Duration::from_secs(secs), run).await {
                Ok(status) => status?,
                Err(_) => {
                    stderr_task.abort();
                    tracing::error!(timeout_secs = secs, "yt-dlp timed out, killed");
                    return Err(DownloadError::Timeout(secs));
                }
            },
            None => run.await?,
        };

        let stderr_output = match stderr_task.await {
            Ok(Ok(text)) => text,
            _ => String::new(),
        };

        if !status.success() {
            let reason = diagnose_error(&stderr_output);
            tracing::error!(
                code = ?status.code(),
                reason = reason.map(|r| r.description()).unwrap_or("none"),
                permanent = reason.is_some_and(|r| r.is_permanent()),
                stderr = %stderr_output.trim(),
                "yt-dlp failed"
            );
            let message = if stderr_output.trim().is_empty() {
                format!("yt-dlp exited with {}", status)
            } else {
                stderr_output.trim().to_string()
            };
            return Err(DownloadError::from(message));
        }

        if !options.output_path.exists() {
            return Err(DownloadError::MissingOutput(options.output_path.clone()));
        }

        Ok(options.output_path.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quality::Quality;

    fn options(dir: &std::path::Path) -> DownloadOptions {
        DownloadOptions::new(
            Quality::P720,
            dir.join("video_test.mp4"),
            &DownloadConfig::default(),
        )
    }

    #[test]
    fn test_build_args() {
        let opts = options(std::path::Path::new("/downloads"));
        let args = build_args("https://example.com/watch?v=1", &opts);

        assert_eq!(args[0], "-f");
        assert_eq!(args[1], "bestvideo[height<=720]+bestaudio/best");
        assert_eq!(args[2], "-o");
        assert_eq!(args[3], "/downloads/video_test.mp4");
        assert!(args.windows(2).any(|w| w[0] == "--merge-output-format" && w[1] == "mp4"));
        assert!(args.windows(2).any(|w| w[0] == "--user-agent" && w[1] == "Mozilla/5.0"));
        assert_eq!(args.last().map(String::as_str), Some("https://example.com/watch?v=1"));
    }

    #[test]
    fn test_parse_progress_line() {
        let line = "[download]  12.5% of ~ 310.04MiB at  374.36KiB/s ETA 11:59 (frag 56/454)";
        let progress = parse_progress(line).unwrap();
        assert!((progress.percent - 12.5).abs() < f32::EPSILON);
        assert!(progress.status.contains("310.04MiB"));
        assert!(progress.status.contains("ETA 11:59"));
    }

    #[test]
    fn test_parse_finished_line() {
        let progress = parse_progress("[download] 100% of   10.00MiB in 00:00:03 at 3.10MiB/s").unwrap();
        assert_eq!(progress.percent, 100.0);
    }

    #[test]
    fn test_parse_merge_and_noise() {
        let merge = parse_progress("[Merger] Merging formats into \"video_x.mp4\"").unwrap();
        assert_eq!(merge.percent, 99.0);
        assert!(parse_progress("[youtube] abc: Downloading webpage").is_none());
    }

    #[tokio::test]
    async fn test_missing_binary_is_tool_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let backend = YtDlpBackend::with_command(YtDlpCommand {
            program: "/definitely/not/here/yt-dlp".to_string(),
            leading_args: Vec::new(),
        });
        let err = backend
            .download("https://example.com/v", &options(dir.path()))
            .await
            .unwrap_err();
        assert!(matches!(err, DownloadError::ToolNotFound(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failing_tool_is_execution_error() {
        let dir = tempfile::tempdir().unwrap();
        // `false` ignores its arguments and exits 1
        let backend = YtDlpBackend::with_command(YtDlpCommand {
            program: "false".to_string(),
            leading_args: Vec::new(),
        });
        let err = backend
            .download("https://example.com/v", &options(dir.path()))
            .await
            .unwrap_err();
        assert!(matches!(err, DownloadError::ExecutionError(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_timeout_kills_process() {
        let dir = tempfile::tempdir().unwrap();
        // `sh -c 'sleep 5' <yt-dlp args...>`: extra args become $0, $1, ...
        let backend = YtDlpBackend::with_command(YtDlpCommand {
            program: "sh".to_string(),
            leading_args: vec!["-c".to_string(), "sleep 5".to_string()],
        });
        let mut opts = options(dir.path());
        opts.timeout_secs = Some(1);
        let err = backend.download("https://example.com/v", &opts).await.unwrap_err();
        assert!(matches!(err, DownloadError::Timeout(1)));
    }
}
