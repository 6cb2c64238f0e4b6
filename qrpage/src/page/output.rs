use std::path::PathBuf;
use tracing::{info, warn};

use super::Page;
use crate::download::DownloadLink;
use crate::error::PageError;
use crate::models::{RenderedQr, StatusKind};

const GENERATED_MESSAGE: &str =
    "QR code generated successfully! Right-click to save or use the download button.";
const DOWNLOADED_MESSAGE: &str = "QR code downloaded successfully!";

impl Page {
    /// Shows a freshly rendered image and makes it the download candidate.
    pub(super) fn present(&self, rendered: RenderedQr) {
        let RenderedQr { bitmap, data_url } = rendered;
        self.ctx.view().output.show(bitmap);
        self.ctx.cache.store(data_url);
        self.ctx.view().download_visible = true;
        info!("QR code generated");
        self.show_status(StatusKind::Success, GENERATED_MESSAGE);
    }

    /// Saves the last successfully generated image through the download sink.
    pub fn download(&self) -> Result<PathBuf, PageError> {
        let Some(href) = self.ctx.cache.latest() else {
            warn!("download requested before any successful generation");
            return Err(self.fail(PageError::NothingToDownload));
        };

        let link = DownloadLink {
            filename: self.ctx.config.download_filename.clone(),
            href,
        };
        let saved = self.ctx.sink.save(&link);
        drop(link);

        match saved {
            Ok(path) => {
                info!("QR code downloaded to {}", path.display());
                self.show_status(StatusKind::Success, DOWNLOADED_MESSAGE);
                Ok(path)
            }
            Err(e) => {
                warn!("download failed: {}", e);
                Err(self.fail(e))
            }
        }
    }
}
