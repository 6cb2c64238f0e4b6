use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tracing::info;

use crate::error::PageError;
use crate::qr::decode_png_data_url;

/// A throwaway save link: suggested filename plus the image data URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadLink {
    pub filename: String,
    pub href: String,
}

/// Where an activated download link ends up.
pub trait DownloadSink: Send + Sync {
    fn save(&self, link: &DownloadLink) -> Result<PathBuf, PageError>;
}

/// Writes the decoded PNG into a directory, creating it if needed.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl DownloadSink for DirectorySink {
    fn save(&self, link: &DownloadLink) -> Result<PathBuf, PageError> {
        let bytes = decode_png_data_url(&link.href).map_err(PageError::Save)?;
        fs::create_dir_all(&self.dir)
            .map_err(|e| PageError::Save(format!("{} ({})", e, self.dir.display())))?;

        // Only the final path component of the suggested name is honoured.
        let name = Path::new(&link.filename)
            .file_name()
            .ok_or_else(|| PageError::Save(format!("invalid filename: {}", link.filename)))?;
        let path = self.dir.join(name);
        fs::write(&path, bytes)
            .map_err(|e| PageError::Save(format!("{} ({})", e, path.display())))?;
        info!("Saved {} to {}", link.filename, path.display());
        Ok(path)
    }
}

/// Keeps every activated link in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    saved: Mutex<Vec<DownloadLink>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn saved(&self) -> Vec<DownloadLink> {
        self.saved
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl DownloadSink for MemorySink {
    fn save(&self, link: &DownloadLink) -> Result<PathBuf, PageError> {
        self.saved
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(link.clone());
        Ok(PathBuf::from(&link.filename))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::qr::png_data_url;

    fn sample_png_url() -> String {
        let img = image::RgbaImage::from_pixel(4, 4, image::Rgba([0, 0, 0, 255]));
        png_data_url(&img).unwrap()
    }

    #[test]
    fn directory_sink_writes_png() {
        let dir = std::env::temp_dir().join(format!("qrpage-sink-{}", std::process::id()));
        let sink = DirectorySink::new(&dir);
        let link = DownloadLink {
            filename: "qrcode.png".to_string(),
            href: sample_png_url(),
        };
        let path = sink.save(&link).unwrap();
        assert_eq!(path, dir.join("qrcode.png"));
        let bytes = fs::read(&path).unwrap();
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn directory_sink_rejects_non_png_href() {
        let sink = DirectorySink::new(std::env::temp_dir());
        let link = DownloadLink {
            filename: "qrcode.png".to_string(),
            href: "https://example.com/qr.png".to_string(),
        };
        assert!(matches!(sink.save(&link), Err(PageError::Save(_))));
    }

    #[test]
    fn memory_sink_records_links() {
        let sink = MemorySink::new();
        let link = DownloadLink {
            filename: "qrcode.png".to_string(),
            href: sample_png_url(),
        };
        sink.save(&link).unwrap();
        assert_eq!(sink.saved(), vec![link]);
    }
}
