mod commands;
mod state;

use tauri::Manager;
use vidgrab_core::AppConfig;

use commands::{backend_status, download_video, list_resolutions, reveal_download};
use state::AppState;

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    vidgrab_core::logging::init_tracing();

    let config = AppConfig::load().unwrap_or_else(|e| {
        tracing::error!(error = %e, "Failed to load config, using defaults");
        AppConfig::default()
    });

    let state = AppState::start(config).expect("failed to start download backend");

    tauri::Builder::default()
        .plugin(tauri_plugin_opener::init())
        .manage(state)
        .invoke_handler(tauri::generate_handler![
            list_resolutions,
            download_video,
            backend_status,
            reveal_download,
        ])
        .build(tauri::generate_context!())
        .expect("error while building tauri application")
        .run(|app_handle, event| {
            if let tauri::RunEvent::Exit = event {
                app_handle.state::<AppState>().stop_server();
            }
        });
}
