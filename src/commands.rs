use std::path::{Path, PathBuf};

use serde::Serialize;
use tauri::{AppHandle, Emitter, State};
use vidgrab_core::{ClientError, DownloadOutcome, HealthStatus, Quality};

use crate::state::AppState;

const MISSING_INPUT: &str = "Please enter a URL and select a resolution!";

/// Payload of the `download-status` event
#[derive(Debug, Clone, Serialize)]
pub struct DownloadStatus {
    pub state: &'static str,
    pub message: String,
}

fn emit_status(app_handle: &AppHandle, state: &'static str, message: String) {
    let _ = app_handle.emit("download-status", DownloadStatus { state, message });
}

/// Trimmed URL and resolution, or the prompt shown when either is missing.
/// The label's "None" placeholder counts as no resolution.
fn validate_request(url: &str, resolution: Option<&str>) -> Result<(String, String), &'static str> {
    let url = url.trim();
    let resolution = resolution
        .map(str::trim)
        .filter(|r| !r.is_empty() && *r != "None");

    match resolution {
        Some(resolution) if !url.is_empty() => Ok((url.to_string(), resolution.to_string())),
        _ => Err(MISSING_INPUT),
    }
}

/// `dir/file_name` when `file_name` is a bare name (no separators, no `..`)
fn download_path(dir: &Path, file_name: &str) -> Option<PathBuf> {
    let name = Path::new(file_name);
    (name.file_name() == Some(name.as_os_str())).then(|| dir.join(name))
}

/// Labels for the resolution menu
#[tauri::command]
pub fn list_resolutions() -> Vec<&'static str> {
    Quality::MENU.iter().map(|q| q.label()).collect()
}

#[tauri::command]
pub async fn download_video(
    url: String,
    resolution: Option<String>,
    state: State<'_, AppState>,
    app_handle: AppHandle,
) -> Result<DownloadOutcome, String> {
    let (url, resolution) = match validate_request(&url, resolution.as_deref()) {
        Ok(input) => input,
        Err(prompt) => {
            tracing::warn!("Download requested without URL or resolution");
            return Err(prompt.to_string());
        }
    };

    tracing::info!("Downloading {} in {}...", url, resolution);
    emit_status(
        &app_handle,
        "started",
        format!("Downloading {} in {}...", url, resolution),
    );

    match state.client.request_download(&url, &resolution).await {
        Ok(outcome) => {
            tracing::info!(file = %outcome.file_name, bytes = outcome.bytes, "Download successful!");
            emit_status(&app_handle, "finished", outcome.file_name.clone());
            Ok(outcome)
        }
        Err(e) => {
            tracing::error!(error = %e, "Error downloading video.");
            let message = match e {
                ClientError::Status { body, .. } if !body.is_empty() => body,
                other => format!("Error downloading video: {}", other),
            };
            emit_status(&app_handle, "failed", message.clone());
            Err(message)
        }
    }
}

#[tauri::command]
pub async fn backend_status(state: State<'_, AppState>) -> Result<HealthStatus, String> {
    state.client.health().await.map_err(|e| e.to_string())
}

/// Open the file manager at a finished download
#[tauri::command]
pub fn reveal_download(file_name: String, state: State<'_, AppState>) -> Result<(), String> {
    let path = download_path(&state.output_dir, &file_name)
        .ok_or_else(|| format!("Invalid file name: {}", file_name))?;
    if !path.exists() {
        return Err(format!("File not found: {}", path.display()));
    }
    tauri_plugin_opener::reveal_item_in_dir(&path).map_err(|e| e.to_string())
}
