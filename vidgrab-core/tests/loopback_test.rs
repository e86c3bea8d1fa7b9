//! Real socket round trips: background server thread + loopback client.

mod helpers;

use std::net::{Ipv4Addr, SocketAddr};
use std::sync::atomic::Ordering;
use std::time::{Duration, Instant};

use helpers::{broken_downloader, fake_downloader, large_downloader, slow_downloader, FAKE_VIDEO};
use vidgrab_core::server::{DOWNLOAD_FAILED, SHUTDOWN_GRACE};
use vidgrab_core::{spawn_background, ClientError, LoopbackClient};

fn any_port() -> SocketAddr {
    SocketAddr::from((Ipv4Addr::LOCALHOST, 0))
}

#[tokio::test]
async fn test_client_downloads_through_background_server() {
    let root = tempfile::tempdir().unwrap();
    let (downloader, calls) = fake_downloader(root.path());
    let handle = spawn_background(any_port(), downloader).unwrap();
    assert_ne!(handle.addr().port(), 0);

    let client = LoopbackClient::new(handle.base_url()).unwrap();
    let outcome = client
        .request_download("https://example.com/watch?v=7", "1080p")
        .await
        .unwrap();

    assert!(outcome.file_name.starts_with("video_"));
    assert_eq!(outcome.bytes, FAKE_VIDEO.len() as u64);
    assert!(root.path().join("Downloads").join(&outcome.file_name).exists());
    assert_eq!(calls.lock().unwrap().len(), 1);

    handle.shutdown();
}

#[tokio::test]
async fn test_client_counts_large_attachment() {
    let root = tempfile::tempdir().unwrap();
    let size = 8 * 1024 * 1024 + 17;
    let handle = spawn_background(any_port(), large_downloader(root.path(), size)).unwrap();
    let client = LoopbackClient::new(handle.base_url()).unwrap();

    let outcome = client
        .request_download("https://example.com/watch?v=big", "4K")
        .await
        .unwrap();

    assert_eq!(outcome.bytes, size as u64);
    let stored = root.path().join("Downloads").join(&outcome.file_name);
    assert_eq!(std::fs::metadata(stored).unwrap().len(), size as u64);

    handle.shutdown();
}

#[tokio::test]
async fn test_shutdown_does_not_wait_for_long_download() {
    let root = tempfile::tempdir().unwrap();
    let (downloader, dropped) = slow_downloader(root.path(), Duration::from_secs(30));
    let handle = spawn_background(any_port(), downloader).unwrap();
    let client = LoopbackClient::new(handle.base_url()).unwrap();

    let request = tokio::spawn(async move {
        client
            .request_download("https://example.com/watch?v=long", "720p")
            .await
    });
    tokio::time::sleep(Duration::from_millis(500)).await;

    let started = Instant::now();
    tokio::task::spawn_blocking(move || handle.shutdown())
        .await
        .unwrap();
    let elapsed = started.elapsed();

    assert!(
        elapsed < SHUTDOWN_GRACE + Duration::from_secs(3),
        "shutdown took {elapsed:?}"
    );
    assert!(dropped.load(Ordering::SeqCst), "download was not cancelled");
    assert!(request.await.unwrap().is_err());
}

#[tokio::test]
async fn test_client_surfaces_server_error() {
    let root = tempfile::tempdir().unwrap();
    let handle = spawn_background(any_port(), broken_downloader(root.path())).unwrap();
    let client = LoopbackClient::new(handle.base_url()).unwrap();

    let err = client
        .request_download("https://example.com/gone", "720p")
        .await
        .unwrap_err();

    match err {
        ClientError::Status { status, body } => {
            assert_eq!(status, 500);
            assert_eq!(body, DOWNLOAD_FAILED);
        }
        other => panic!("unexpected error: {other}"),
    }

    handle.shutdown();
}

#[tokio::test]
async fn test_client_health() {
    let root = tempfile::tempdir().unwrap();
    let (downloader, _) = fake_downloader(root.path());
    let handle = spawn_background(any_port(), downloader).unwrap();
    let client = LoopbackClient::new(handle.base_url()).unwrap();

    let health = client.health().await.unwrap();
    assert_eq!(health.status, "ok");
    assert!(!health.ytdlp.is_available);

    handle.shutdown();
}

#[test]
fn test_port_in_use_is_bind_error() {
    let root = tempfile::tempdir().unwrap();
    let taken = std::net::TcpListener::bind(any_port()).unwrap();
    let addr = taken.local_addr().unwrap();

    let result = spawn_background(addr, broken_downloader(root.path()));
    assert!(matches!(result, Err(vidgrab_core::ServerError::Bind { .. })));
}

#[tokio::test]
async fn test_connection_refused_after_shutdown() {
    let root = tempfile::tempdir().unwrap();
    let (downloader, _) = fake_downloader(root.path());
    let handle = spawn_background(any_port(), downloader).unwrap();
    let base_url = handle.base_url();
    handle.shutdown();

    let client = LoopbackClient::new(base_url).unwrap();
    let err = client.health().await.unwrap_err();
    assert!(matches!(err, ClientError::Http(_)));
}
