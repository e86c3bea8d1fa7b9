// Locating yt-dlp and reporting its version

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::io::AsyncReadExt;
use tokio::process::Command as TokioCommand;
use tokio::time::timeout;

use crate::config::DownloadConfig;
use crate::models::ToolInfo;

const COMMON_PATHS: [&str; 3] = [
    "/opt/homebrew/bin/yt-dlp", // Homebrew on Apple Silicon
    "/usr/local/bin/yt-dlp",    // Homebrew on Intel Mac, pip --user installs
    "/usr/bin/yt-dlp",          // System packages
];

/// How to invoke yt-dlp: a program plus the arguments that always precede ours
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YtDlpCommand {
    pub program: String,
    pub leading_args: Vec<String>,
}

impl YtDlpCommand {
    /// Resolution order: python module override, configured path, common
    /// install locations, `PATH`, bare name
    pub fn resolve(config: &DownloadConfig) -> Self {
        if let Some(python) = &config.python {
            return Self {
                program: python.clone(),
                leading_args: vec!["-m".to_string(), "yt_dlp".to_string()],
            };
        }

        let program = config
            .ytdlp_path
            .clone()
            .or_else(find_ytdlp)
            .map(|path| path.to_string_lossy().to_string())
            .unwrap_or_else(|| "yt-dlp".to_string());

        Self {
            program,
            leading_args: Vec::new(),
        }
    }

    pub fn tokio_command(&self) -> TokioCommand {
        let mut command = TokioCommand::new(&self.program);
        command.args(&self.leading_args);
        command
    }
}

/// Find yt-dlp executable in common paths, then on `PATH`
pub fn find_ytdlp() -> Option<PathBuf> {
    for path in COMMON_PATHS {
        if Path::new(path).exists() {
            return Some(PathBuf::from(path));
        }
    }
    ytdlp_on_path(std::env::var_os("PATH"))
}

/// First executable `yt-dlp` in `paths`; plain files without the exec bit are skipped
fn ytdlp_on_path(paths: Option<OsString>) -> Option<PathBuf> {
    let cwd = std::env::current_dir().ok()?;
    which::which_in("yt-dlp", paths, cwd).ok()
}

/// Run a command to completion with a timeout, capturing stdout
pub async fn run_output_with_timeout(
    mut command: TokioCommand,
    timeout_secs: u64,
) -> Result<std::process::Output, String> {
    let mut child = command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| format!("Failed to start: {}", e))?;

    let mut stdout_pipe = child
        .stdout
        .take()
        .ok_or_else(|| "Failed to capture stdout".to_string())?;
    let mut stderr_pipe = child
        .stderr
        .take()
        .ok_or_else(|| "Failed to capture stderr".to_string())?;

    let collect = async move {
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        let (out_res, err_res) = tokio::join!(
            stdout_pipe.read_to_end(&mut stdout),
            stderr_pipe.read_to_end(&mut stderr)
        );
        out_res.map_err(|e| format!("Failed to read stdout: {}", e))?;
        err_res.map_err(|e| format!("Failed to read stderr: {}", e))?;
        let status = child
            .wait()
            .await
            .map_err(|e| format!("Failed to wait: {}", e))?;
        Ok::<_, String>(std::process::Output {
            status,
            stdout,
            stderr,
        })
    };

    timeout(Duration::from_secs(timeout_secs), collect)
        .await
        .map_err(|_| format!("Timed out after {}s", timeout_secs))?
}

/// Probe `yt-dlp --version`
pub async fn ytdlp_info(config: &DownloadConfig) -> ToolInfo {
    let command = YtDlpCommand::resolve(config);
    let mut probe = command.tokio_command();
    probe.arg("--version");

    let version = match run_output_with_timeout(probe, 10).await {
        Ok(output) if output.status.success() => {
            let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
            (!text.is_empty()).then_some(text)
        }
        Ok(output) => {
            tracing::warn!(
                program = %command.program,
                stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                "yt-dlp --version failed"
            );
            None
        }
        Err(e) => {
            tracing::warn!(program = %command.program, error = %e, "yt-dlp not runnable");
            None
        }
    };

    ToolInfo {
        name: "yt-dlp".to_string(),
        is_available: version.is_some(),
        version,
        path: Some(command.program),
    }
}
