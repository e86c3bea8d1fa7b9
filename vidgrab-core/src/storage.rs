// Output location helpers

use std::path::{Path, PathBuf};

use uuid::Uuid;

/// Create the downloads directory (and parents) if missing
pub fn ensure_dir(dir: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(dir)
}

/// `video_<uuid hex>.<ext>` inside `dir`; never collides with an earlier download
pub fn unique_video_path(dir: &Path, ext: &str) -> PathBuf {
    dir.join(format!("video_{}.{}", Uuid::new_v4().simple(), ext))
}

/// File name component for the `Content-Disposition` header
pub fn attachment_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| "video.mp4".to_string())
}
