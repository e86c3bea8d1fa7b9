// Loopback client - what the desktop UI uses to reach the local server

use std::time::Duration;

use reqwest::header::CONTENT_DISPOSITION;

use crate::errors::ClientError;
use crate::models::{DownloadOutcome, HealthStatus};

#[derive(Debug, Clone)]
pub struct LoopbackClient {
    base_url: String,
    http: reqwest::Client,
}

impl LoopbackClient {
    /// `base_url` like `http://127.0.0.1:10000`. Downloads can take minutes,
    /// so only connecting is time-limited.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .no_proxy()
            .build()?;
        let base_url: String = base_url.into();
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// POST the form to `/video`. The server already stored the file in the
    /// downloads folder, so the attachment body is drained, not saved again.
    pub async fn request_download(
        &self,
        video_url: &str,
        quality: &str,
    ) -> Result<DownloadOutcome, ClientError> {
        let mut response = self
            .http
            .post(format!("{}/video", self.base_url))
            .form(&[("video_url", video_url), ("quality", quality)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let file_name = response
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|value| value.to_str().ok())
            .and_then(parse_attachment_name)
            .unwrap_or_else(|| "video.mp4".to_string());
        // Videos can be gigabytes; count chunks instead of buffering them
        let mut bytes = 0u64;
        while let Some(chunk) = response.chunk().await? {
            bytes += chunk.len() as u64;
        }

        Ok(DownloadOutcome { file_name, bytes })
    }

    pub async fn health(&self) -> Result<HealthStatus, ClientError> {
        let response = self
            .http
            .get(format!("{}/health", self.base_url))
            .timeout(Duration::from_secs(15))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }
        Ok(response.json().await?)
    }
}

/// `attachment; filename="video_x.mp4"` -> `video_x.mp4`
pub fn parse_attachment_name(header: &str) -> Option<String> {
    header.split(';').map(str::trim).find_map(|part| {
        part.strip_prefix("filename=")
            .map(|name| name.trim_matches('"').to_string())
            .filter(|name| !name.is_empty())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_attachment_name() {
        assert_eq!(
            parse_attachment_name("attachment; filename=\"video_abc.mp4\""),
            Some("video_abc.mp4".to_string())
        );
        assert_eq!(
            parse_attachment_name("attachment;filename=clip.webm"),
            Some("clip.webm".to_string())
        );
        assert_eq!(parse_attachment_name("inline"), None);
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let client = LoopbackClient::new("http://127.0.0.1:10000/").unwrap();
        assert_eq!(client.base_url(), "http://127.0.0.1:10000");
    }
}
