//! Headless QR code page: form input, debounced generation, a status line
//! and a download action over the last successful image.

pub mod cache;
pub mod config;
pub mod debounce;
pub mod download;
pub mod error;
pub mod models;
pub mod page;
pub mod qr;
pub mod status;

pub use config::PageConfig;
pub use error::{EncodeError, PageError};
pub use page::{KeyPress, Page};
pub use qr::{QrCodeEncoder, QrEncoder};
