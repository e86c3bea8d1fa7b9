//! Loopback HTTP server.
//!
//! One download endpoint plus a health probe. The desktop app runs it on a
//! background thread and talks to it with [`crate::client::LoopbackClient`].

use std::net::SocketAddr;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use axum::{
    body::Body,
    extract::{rejection::FormRejection, Form, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use tokio::sync::{oneshot, Notify};
use tokio_util::io::ReaderStream;
use tower_http::trace::TraceLayer;

use crate::errors::ServerError;
use crate::models::HealthStatus;
use crate::orchestrator::Downloader;
use crate::quality::Quality;
use crate::storage;
use crate::tools;

pub const INVALID_REQUEST: &str = "Invalid Request";
pub const DOWNLOAD_FAILED: &str = "Error: Video could not be downloaded.";

/// How long shutdown waits for in-flight requests before dropping them
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(3);

#[derive(Clone)]
pub struct ServerState {
    pub downloader: Arc<Downloader>,
}

/// Form body of `POST /video`
#[derive(Debug, Deserialize)]
pub struct VideoForm {
    pub video_url: Option<String>,
    pub quality: Option<String>,
}

pub fn router(downloader: Arc<Downloader>) -> Router {
    Router::new()
        .route("/video", post(video_downloader))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(ServerState { downloader })
}

async fn video_downloader(
    State(state): State<ServerState>,
    form: Result<Form<VideoForm>, FormRejection>,
) -> Response {
    let form = match form {
        Ok(Form(form)) => form,
        Err(rejection) => {
            tracing::warn!(error = %rejection, "Rejected download request body");
            return (StatusCode::BAD_REQUEST, INVALID_REQUEST).into_response();
        }
    };

    let video_url = match form.video_url.as_deref().map(str::trim) {
        Some(url) if !url.is_empty() => url.to_string(),
        _ => return (StatusCode::BAD_REQUEST, INVALID_REQUEST).into_response(),
    };
    let quality = Quality::parse(form.quality.as_deref().unwrap_or("best"));

    let path = match state.downloader.download_video(&video_url, quality).await {
        Ok(path) => path,
        Err(e) => {
            tracing::error!(url = %video_url, quality = %quality, error = %e, "Download Error");
            return (StatusCode::INTERNAL_SERVER_ERROR, DOWNLOAD_FAILED).into_response();
        }
    };

    match file_attachment(&path).await {
        Ok(response) => response,
        Err(e) => {
            tracing::error!(path = %path.display(), error = %e, "Failed to open downloaded file");
            (StatusCode::INTERNAL_SERVER_ERROR, DOWNLOAD_FAILED).into_response()
        }
    }
}

/// Stream `path` back as an attachment
async fn file_attachment(path: &std::path::Path) -> std::io::Result<Response> {
    let file = tokio::fs::File::open(path).await?;
    let length = file.metadata().await?.len();
    let name = storage::attachment_name(path);
    let mime = mime_guess::from_path(path).first_or_octet_stream();

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, mime.as_ref())
        .header(header::CONTENT_LENGTH, length)
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", name),
        )
        .body(Body::from_stream(ReaderStream::new(file)))
        .map_err(std::io::Error::other)?;
    Ok(response)
}

async fn health(State(state): State<ServerState>) -> impl IntoResponse {
    let ytdlp = tools::ytdlp_info(state.downloader.config()).await;
    Json(HealthStatus {
        status: "ok".to_string(),
        ytdlp,
    })
}

/// Serve on an already-bound listener until `shutdown` resolves
pub async fn serve<F>(
    listener: tokio::net::TcpListener,
    downloader: Arc<Downloader>,
    shutdown: F,
) -> Result<(), ServerError>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr()?;
    tracing::info!(%addr, "Loopback server listening");
    axum::serve(listener, router(downloader))
        .with_graceful_shutdown(shutdown)
        .await?;
    tracing::info!(%addr, "Loopback server stopped");
    Ok(())
}

/// Server running on its own OS thread with its own runtime
pub struct ServerHandle {
    addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl ServerHandle {
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Stop accepting and join the thread. In-flight requests get
    /// [`SHUTDOWN_GRACE`] to finish; after that they are dropped, which kills
    /// any running yt-dlp child.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                tracing::error!("Loopback server thread panicked");
            }
        }
    }
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Bind `addr` now (so bind errors surface to the caller) and serve from a
/// background thread. Port 0 picks a free port; see [`ServerHandle::addr`].
pub fn spawn_background(
    addr: SocketAddr,
    downloader: Arc<Downloader>,
) -> Result<ServerHandle, ServerError> {
    let std_listener = std::net::TcpListener::bind(addr).map_err(|source| ServerError::Bind {
        addr: addr.to_string(),
        source,
    })?;
    std_listener.set_nonblocking(true)?;
    let bound = std_listener.local_addr()?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .thread_name("loopback-worker")
        .enable_all()
        .build()?;

    let (tx, rx) = oneshot::channel::<()>();
    let thread = std::thread::Builder::new()
        .name("loopback-server".to_string())
        .spawn(move || {
            runtime.block_on(async move {
                let listener = match tokio::net::TcpListener::from_std(std_listener) {
                    Ok(listener) => listener,
                    Err(e) => {
                        tracing::error!(error = %e, "Failed to register listener");
                        return;
                    }
                };
                let stopping = Arc::new(Notify::new());
                let signal = stopping.clone();
                let shutdown = async move {
                    let _ = rx.await;
                    signal.notify_one();
                };
                let deadline = async {
                    stopping.notified().await;
                    tokio::time::sleep(SHUTDOWN_GRACE).await;
                };

                tokio::select! {
                    result = serve(listener, downloader, shutdown) => {
                        if let Err(e) = result {
                            tracing::error!(error = %e, "Loopback server failed");
                        }
                    }
                    _ = deadline => {
                        tracing::warn!(
                            grace_secs = SHUTDOWN_GRACE.as_secs(),
                            "Requests still in flight at shutdown, dropping them"
                        );
                    }
                }
            });
            // Cancels leftover connection tasks along with their downloads
            runtime.shutdown_timeout(Duration::from_secs(1));
        })?;

    Ok(ServerHandle {
        addr: bound,
        shutdown: Some(tx),
        thread: Some(thread),
    })
}
