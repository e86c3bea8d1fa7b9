// Failure diagnostics - names the likely cause of a failed yt-dlp run
//
// Only used for log context; the HTTP caller always gets the same generic
// failure message.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    /// HTTP 403 Forbidden from the media host
    Http403Forbidden,

    /// 429 or explicit throttling
    RateLimited,

    GeoBlocked,

    /// Needs a logged-in, age-verified account
    AgeRestricted,

    PrivateVideo,

    /// Deleted, removed or never existed
    VideoUnavailable,

    DrmProtected,

    /// No yt-dlp extractor matches the URL
    UnsupportedUrl,

    NetworkTimeout,

    /// Merging needs ffmpeg and it is not installed
    FfmpegMissing,

    Unknown,
}

impl FailureReason {
    /// Check if this is a permanent failure (retrying cannot help)
    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            Self::VideoUnavailable | Self::DrmProtected | Self::UnsupportedUrl
        )
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Http403Forbidden => "Access denied (HTTP 403)",
            Self::RateLimited => "Rate limited by the media host",
            Self::GeoBlocked => "Geographic restriction",
            Self::AgeRestricted => "Age-restricted content",
            Self::PrivateVideo => "Private video",
            Self::VideoUnavailable => "Video unavailable",
            Self::DrmProtected => "DRM-protected content",
            Self::UnsupportedUrl => "Unsupported URL",
            Self::NetworkTimeout => "Network timeout",
            Self::FfmpegMissing => "ffmpeg not installed",
            Self::Unknown => "Unknown failure",
        }
    }
}

/// Diagnose yt-dlp stderr; `None` when the text carries no recognisable error
pub fn diagnose_error(error: &str) -> Option<FailureReason> {
    let lower = error.to_lowercase();

    // Order matters: specific causes before the generic 403
    if lower.contains("drm") || lower.contains("widevine") {
        return Some(FailureReason::DrmProtected);
    }
    if lower.contains("unsupported url") || lower.contains("is not a valid url") {
        return Some(FailureReason::UnsupportedUrl);
    }
    if lower.contains("ffmpeg is not installed") || lower.contains("ffmpeg not found") {
        return Some(FailureReason::FfmpegMissing);
    }
    if lower.contains("confirm your age") || lower.contains("age-restricted") {
        return Some(FailureReason::AgeRestricted);
    }
    if lower.contains("private video") {
        return Some(FailureReason::PrivateVideo);
    }
    if lower.contains("not available in your country") || lower.contains("geo restrict") {
        return Some(FailureReason::GeoBlocked);
    }
    if lower.contains("video unavailable") || lower.contains("has been removed") {
        return Some(FailureReason::VideoUnavailable);
    }
    if lower.contains("429") || lower.contains("too many requests") {
        return Some(FailureReason::RateLimited);
    }
    if lower.contains("403") || lower.contains("forbidden") {
        return Some(FailureReason::Http403Forbidden);
    }
    if lower.contains("timed out") || lower.contains("timeout") {
        return Some(FailureReason::NetworkTimeout);
    }
    if lower.contains("error") {
        return Some(FailureReason::Unknown);
    }

    None
}
