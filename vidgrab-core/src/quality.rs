// Quality - maps the resolution picked in the UI to a yt-dlp format selector
//
// The UI offers 360p/480p/720p/1080p/4K; the HTTP endpoint also accepts the
// bare numbers ("720") and "best". Anything unrecognised downloads the best
// available streams.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Quality {
    P360,
    P480,
    P720,
    P1080,
    P2160,
    Best,
}

impl Quality {
    /// Resolutions shown in the "Select Resolution" menu, in display order
    pub const MENU: [Quality; 5] = [
        Quality::P360,
        Quality::P480,
        Quality::P720,
        Quality::P1080,
        Quality::P2160,
    ];

    /// Lenient parse used for both menu labels and raw form values.
    /// Returns `None` only for values nobody could mean as a resolution.
    pub fn try_parse(raw: &str) -> Option<Self> {
        let value = raw.trim().to_ascii_lowercase();
        let value = value.strip_suffix('p').unwrap_or(&value);

        match value {
            "" | "best" => Some(Self::Best),
            "360" => Some(Self::P360),
            "480" => Some(Self::P480),
            "720" => Some(Self::P720),
            "1080" => Some(Self::P1080),
            "2160" | "4k" => Some(Self::P2160),
            _ => None,
        }
    }

    /// Like `try_parse` but falls back to `Best`
    pub fn parse(raw: &str) -> Self {
        Self::try_parse(raw).unwrap_or_else(|| {
            tracing::warn!(quality = raw, "Unknown quality, falling back to best");
            Self::Best
        })
    }

    /// Maximum video height, `None` for best
    pub fn max_height(&self) -> Option<u32> {
        match self {
            Self::P360 => Some(360),
            Self::P480 => Some(480),
            Self::P720 => Some(720),
            Self::P1080 => Some(1080),
            Self::P2160 => Some(2160),
            Self::Best => None,
        }
    }

    /// yt-dlp `-f` expression: best video under the height cap merged with
    /// the best audio, or the best single file when merging is impossible
    pub fn format_selector(&self) -> String {
        match self.max_height() {
            Some(height) => format!("bestvideo[height<={}]+bestaudio/best", height),
            None => "bestvideo+bestaudio/best".to_string(),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::P360 => "360p",
            Self::P480 => "480p",
            Self::P720 => "720p",
            Self::P1080 => "1080p",
            Self::P2160 => "4K",
            Self::Best => "best",
        }
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self::Best
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
