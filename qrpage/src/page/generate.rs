use std::sync::atomic::Ordering;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use super::Page;
use crate::error::PageError;
use crate::models::{ButtonState, GenerationRequest, RenderedQr, StatusKind};

impl Page {
    /// Starts one generation cycle.
    ///
    /// Validation happens synchronously: an empty (after trimming) text field
    /// returns `PageError::Validation` and no encode is attempted. Otherwise
    /// the button goes busy before the encode task is spawned, and the
    /// returned handle resolves once the outcome has been applied to the page.
    ///
    /// Overlapping cycles are not coordinated; whichever completes last owns
    /// the displayed image and the cache.
    pub fn generate(&self) -> Result<JoinHandle<()>, PageError> {
        let form = {
            let mut view = self.ctx.view();
            view.status.clear();
            view.output.clear();
            view.download_visible = false;
            view.form.clone()
        };

        let text = form.text.trim();
        if text.is_empty() {
            warn!("generation rejected: empty input");
            return Err(self.fail(PageError::Validation));
        }

        self.ctx.view().button = ButtonState::busy();

        let request =
            GenerationRequest::from_form(text, &form.size, &form.color, self.ctx.config.margin);

        info!(
            "generating QR code: {} chars, {}px, {}",
            request.text.chars().count(),
            request.size,
            request.dark
        );

        self.ctx.in_flight.fetch_add(1, Ordering::SeqCst);
        let encoder = Arc::clone(&self.ctx.encoder);
        let job = tokio::spawn(async move { encoder.encode(&request).await });

        let page = self.clone();
        Ok(tokio::spawn(async move {
            let outcome = match job.await {
                Ok(Ok(rendered)) => Ok(rendered),
                Ok(Err(e)) => Err(PageError::Encoding(e)),
                Err(e) => Err(PageError::Unexpected(join_error_reason(e))),
            };
            page.complete(outcome);
            page.ctx.in_flight.fetch_sub(1, Ordering::SeqCst);
        }))
    }

    /// Encode callback: always restores the button, then reports or presents.
    fn complete(&self, outcome: Result<RenderedQr, PageError>) {
        self.ctx.view().button = ButtonState::idle();
        match outcome {
            Ok(rendered) => self.present(rendered),
            Err(e) => {
                warn!("generation failed: {}", e);
                self.fail(e);
            }
        }
    }

    /// Surfaces an error status and hands the error back.
    pub(super) fn fail(&self, err: PageError) -> PageError {
        self.show_status(StatusKind::Error, err.to_string());
        err
    }
}

fn join_error_reason(e: tokio::task::JoinError) -> String {
    if !e.is_panic() {
        return e.to_string();
    }
    let payload = e.into_panic();
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "encoder panicked".to_string()
    }
}
