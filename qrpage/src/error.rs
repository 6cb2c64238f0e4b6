use thiserror::Error;

/// Failure reported by a `QrEncoder`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    /// Rendering options the encoder cannot use, such as a malformed color.
    #[error("{0}")]
    Options(String),
    #[error("{0}")]
    Symbol(String),
    #[error("PNG export failed: {0}")]
    Export(String),
}

impl From<qrcode::types::QrError> for EncodeError {
    fn from(e: qrcode::types::QrError) -> Self {
        EncodeError::Symbol(e.to_string())
    }
}

impl From<image::ImageError> for EncodeError {
    fn from(e: image::ImageError) -> Self {
        EncodeError::Export(e.to_string())
    }
}

/// Everything the page can surface to the user as an error status.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PageError {
    #[error("Please enter some text or a URL to generate a QR code.")]
    Validation,
    #[error("Error generating QR code: {0}")]
    Encoding(#[from] EncodeError),
    #[error("Error: {0}")]
    Unexpected(String),
    #[error("No QR code to download. Please generate one first.")]
    NothingToDownload,
    #[error("Error: {0}")]
    Save(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}
