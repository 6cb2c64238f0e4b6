use std::sync::{PoisonError, RwLock};

/// Single-slot store of the most recent successful image data URL.
///
/// Written by the output handler, read by the download action. Failed
/// generations never touch it, so after a failure it still holds the last
/// good image.
#[derive(Debug, Default)]
pub struct ImageCache {
    latest: RwLock<Option<String>>,
}

impl ImageCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store(&self, data_url: String) {
        let mut latest = self.latest.write().unwrap_or_else(PoisonError::into_inner);
        *latest = Some(data_url);
    }

    pub fn latest(&self) -> Option<String> {
        self.latest
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
