//! Headless model of the QR page.
//!
//! `Page` is the session controller: it owns the form, the visible UI state,
//! the last-image cache and the debounce handle, and turns user events into
//! generation and download actions.

mod generate;
mod output;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::sleep;
use tracing::debug;

use crate::cache::ImageCache;
use crate::config::PageConfig;
use crate::debounce::Debouncer;
use crate::download::DownloadSink;
use crate::models::{FormState, PageView, StatusKind};
use crate::qr::QrEncoder;

pub(crate) struct PageContext {
    config: PageConfig,
    view: Mutex<PageView>,
    cache: ImageCache,
    encoder: Arc<dyn QrEncoder>,
    sink: Arc<dyn DownloadSink>,
    debouncer: Mutex<Debouncer>,
    /// Generations started but not yet applied to the page.
    in_flight: AtomicUsize,
}

impl PageContext {
    fn view(&self) -> MutexGuard<'_, PageView> {
        self.view.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A key press in the text field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPress {
    pub key: String,
    pub shift: bool,
}

impl KeyPress {
    pub fn new(key: impl Into<String>, shift: bool) -> Self {
        Self {
            key: key.into(),
            shift,
        }
    }
}

#[derive(Clone)]
pub struct Page {
    ctx: Arc<PageContext>,
}

impl Page {
    pub fn new(
        config: PageConfig,
        encoder: Arc<dyn QrEncoder>,
        sink: Arc<dyn DownloadSink>,
    ) -> Self {
        let form = FormState {
            text: String::new(),
            size: config.default_size.to_string(),
            color: config.default_color.clone(),
        };
        let debouncer = Debouncer::new(config.debounce);
        Self {
            ctx: Arc::new(PageContext {
                config,
                view: Mutex::new(PageView::new(form)),
                cache: ImageCache::new(),
                encoder,
                sink,
                debouncer: Mutex::new(debouncer),
                in_flight: AtomicUsize::new(0),
            }),
        }
    }

    pub fn view(&self) -> PageView {
        self.ctx.view().clone()
    }

    /// Data URL of the last successful generation, if any.
    pub fn cached_image(&self) -> Option<String> {
        self.ctx.cache.latest()
    }

    pub fn set_size(&self, size: u32) {
        self.set_size_str(&size.to_string());
    }

    /// Raw selector value; parsed when a generation starts.
    pub fn set_size_str(&self, size: &str) {
        self.ctx.view().form.size = size.to_string();
    }

    pub fn set_color(&self, color: &str) {
        self.ctx.view().form.color = color.to_string();
    }

    /// Text field changed. Restarts the quiet-period timer; when it elapses the
    /// page generates if the field is non-empty at that moment.
    pub fn on_text_input(&self, value: &str) {
        self.ctx.view().form.text = value.to_string();

        let page = self.clone();
        let mut debouncer = self
            .ctx
            .debouncer
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        debouncer.schedule(async move {
            let text = page.ctx.view().form.text.clone();
            if text.trim().is_empty() {
                debug!("debounce elapsed with empty input, skipping");
                return;
            }
            debug!("debounce elapsed, generating");
            let _ = page.generate();
        });
    }

    /// Returns `true` when the key was consumed (Enter without shift).
    pub fn on_key_press(&self, key: &KeyPress) -> bool {
        if key.key == "Enter" && !key.shift {
            let _ = self.generate();
            return true;
        }
        false
    }

    pub fn on_generate_click(&self) {
        let _ = self.generate();
    }

    pub fn on_download_click(&self) {
        let _ = self.download();
    }

    pub fn has_pending_input(&self) -> bool {
        self.ctx
            .debouncer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_pending()
    }

    pub fn in_flight(&self) -> usize {
        self.ctx.in_flight.load(Ordering::SeqCst)
    }

    /// Waits until no debounced input is pending and every started
    /// generation has landed on the page.
    pub async fn settle(&self) {
        while self.has_pending_input() || self.in_flight() > 0 {
            sleep(Duration::from_millis(20)).await;
        }
    }

    /// Shows a status message. Success messages clear themselves after the
    /// configured delay unless something else was shown in the meantime.
    fn show_status(&self, kind: StatusKind, text: impl Into<String>) {
        let epoch = self.ctx.view().status.set(kind, text);
        if kind != StatusKind::Success {
            return;
        }

        let ctx = Arc::clone(&self.ctx);
        let delay = self.ctx.config.status_clear;
        tokio::spawn(async move {
            sleep(delay).await;
            if ctx.view().status.clear_if_current(epoch) {
                debug!("success status cleared");
            }
        });
    }
}


#[cfg(test)]
mod tests {
    use super::testing::FakeEncoder;
    use super::*;
    use crate::download::MemorySink;

    fn page_with(encoder: Arc<FakeEncoder>) -> Page {
        Page::new(
            PageConfig::default(),
            encoder,
            Arc::new(MemorySink::new()),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn rapid_keystrokes_trigger_one_generation_with_latest_value() {
        let encoder = Arc::new(FakeEncoder::default());
        let page = page_with(encoder.clone());

        page.on_text_input("h");
        sleep(Duration::from_millis(200)).await;
        page.on_text_input("ht");
        sleep(Duration::from_millis(200)).await;
        page.on_text_input("https://example.com");

        sleep(Duration::from_millis(999)).await;
        assert_eq!(encoder.calls(), 0);
        assert!(page.has_pending_input());

        sleep(Duration::from_millis(5)).await;
        assert_eq!(encoder.calls(), 1);
        assert_eq!(encoder.texts(), vec!["https://example.com".to_string()]);
        assert!(page.view().output.has_content);
    }

    #[tokio::test(start_paused = true)]
    async fn settle_waits_for_debounced_input() {
        let encoder = Arc::new(FakeEncoder::default());
        let page = page_with(encoder.clone());

        page.on_text_input("hello");
        assert!(page.has_pending_input());
        page.settle().await;

        assert_eq!(encoder.calls(), 1);
        assert!(page.view().output.has_content);
        assert!(page.cached_image().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn settle_waits_for_every_overlapping_generation() {
        let encoder = Arc::new(FakeEncoder::with_delays(vec![
            Duration::from_millis(100),
            Duration::from_millis(900),
        ]));
        let page = page_with(encoder.clone());
        page.ctx.view().form.text = "first".to_string();
        page.on_generate_click();
        page.ctx.view().form.text = "second".to_string();
        page.on_generate_click();
        assert_eq!(page.in_flight(), 2);

        sleep(Duration::from_millis(200)).await;
        // The first completion already restored the button.
        assert!(!page.view().button.is_busy());
        assert_eq!(page.in_flight(), 1);

        page.settle().await;
        assert_eq!(page.in_flight(), 0);
        assert_eq!(encoder.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn debounce_skips_when_field_emptied() {
        let encoder = Arc::new(FakeEncoder::default());
        let page = page_with(encoder.clone());

        page.on_text_input("abc");
        sleep(Duration::from_millis(100)).await;
        page.on_text_input("   ");
        sleep(Duration::from_millis(1500)).await;

        assert_eq!(encoder.calls(), 0);
        assert!(page.view().status.message().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn enter_generates_and_shift_enter_does_not() {
        let encoder = Arc::new(FakeEncoder::default());
        let page = page_with(encoder.clone());
        page.set_color("#000000");
        page.ctx.view().form.text = "hello".to_string();

        assert!(!page.on_key_press(&KeyPress::new("Enter", true)));
        assert!(!page.on_key_press(&KeyPress::new("a", false)));
        sleep(Duration::from_millis(1)).await;
        assert_eq!(encoder.calls(), 0);

        assert!(page.on_key_press(&KeyPress::new("Enter", false)));
        sleep(Duration::from_millis(1)).await;
        assert_eq!(encoder.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn success_status_clears_but_newer_error_survives() {
        let page = page_with(Arc::new(FakeEncoder::default()));

        page.show_status(StatusKind::Success, "ok");
        sleep(Duration::from_millis(1000)).await;
        page.show_status(StatusKind::Error, "bad");
        sleep(Duration::from_millis(5000)).await;

        let view = page.view();
        let status = view.status.message().unwrap();
        assert_eq!(status.kind, StatusKind::Error);
        assert_eq!(status.text, "bad");
    }
}
