// App state shared by Tauri commands

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::Context;
use vidgrab_core::{
    spawn_background, AppConfig, Downloader, LoopbackClient, ServerError, ServerHandle,
};

pub struct AppState {
    pub client: LoopbackClient,
    pub output_dir: PathBuf,
    // Held so the server thread lives as long as the app
    server: Mutex<Option<ServerHandle>>,
}

impl AppState {
    /// Start the loopback server on its background thread and build the
    /// client the commands use to reach it
    pub fn start(config: AppConfig) -> anyhow::Result<Self> {
        let output_dir = config.download.output_dir.clone();
        let downloader = Downloader::with_ytdlp(config.download).into_shared();

        let handle = match spawn_background(config.server.addr(), downloader.clone()) {
            Ok(handle) => handle,
            // Another instance (or anything else) holds the port: any free loopback port works
            Err(ServerError::Bind { addr, source }) => {
                tracing::warn!(%addr, error = %source, "Port busy, falling back to an ephemeral port");
                spawn_background(SocketAddr::new(config.server.host, 0), downloader)
                    .context("starting loopback server")?
            }
            Err(e) => return Err(e).context("starting loopback server"),
        };

        let client = LoopbackClient::new(handle.base_url()).context("building loopback client")?;
        tracing::info!(base_url = client.base_url(), output_dir = %output_dir.display(), "Backend ready");

        Ok(Self {
            client,
            output_dir,
            server: Mutex::new(Some(handle)),
        })
    }

    /// Stop the server thread; called when the app exits
    pub fn stop_server(&self) {
        let handle = match self.server.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(handle) = handle {
            handle.shutdown();
        }
    }
}
