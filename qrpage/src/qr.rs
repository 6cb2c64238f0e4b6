use async_trait::async_trait;
use base64::Engine as _;
use image::{DynamicImage, ImageFormat, RgbaImage};
use qrcode::{Color, QrCode};
use std::io::Cursor;
use tracing::debug;

use crate::error::EncodeError;
use crate::models::{GenerationRequest, HexColor, RenderedQr};

const PNG_DATA_URL_PREFIX: &str = "data:image/png;base64,";
/// Pixels per module when the requested width cannot hold the symbol.
const FALLBACK_SCALE: f64 = 4.0;

/// The encoding collaborator: turns a request into a bitmap plus its PNG data URL.
#[async_trait]
pub trait QrEncoder: Send + Sync {
    async fn encode(&self, request: &GenerationRequest) -> Result<RenderedQr, EncodeError>;
}

/// Default encoder backed by the `qrcode` crate. Rendering runs on the blocking pool.
#[derive(Debug, Default, Clone, Copy)]
pub struct QrCodeEncoder;

#[async_trait]
impl QrEncoder for QrCodeEncoder {
    async fn encode(&self, request: &GenerationRequest) -> Result<RenderedQr, EncodeError> {
        let request = request.clone();
        match tokio::task::spawn_blocking(move || render_request(&request)).await {
            Ok(result) => result,
            Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
            Err(e) => Err(EncodeError::Symbol(format!("render task cancelled: {e}"))),
        }
    }
}

pub fn render_request(request: &GenerationRequest) -> Result<RenderedQr, EncodeError> {
    let dark = request.dark.parse::<HexColor>().map_err(EncodeError::Options)?;
    let light = request.light.parse::<HexColor>().map_err(EncodeError::Options)?;
    let code = QrCode::with_error_correction_level(request.text.as_bytes(), request.ec_level)?;
    let bitmap = render_bitmap(&code, request.size, request.margin, dark, light);
    let data_url = png_data_url(&bitmap)?;
    debug!(
        "QR symbol {}x{} modules, bitmap {}x{}, {} bytes data url",
        code.width(),
        code.width(),
        bitmap.width(),
        bitmap.height(),
        data_url.len()
    );
    Ok(RenderedQr { bitmap, data_url })
}

/// Scales the module matrix onto a square canvas of `size` pixels, with
/// `margin` light modules on each side.
pub fn render_bitmap(
    code: &QrCode,
    size: u32,
    margin: u32,
    dark: HexColor,
    light: HexColor,
) -> RgbaImage {
    let modules = code.width();
    let colors = code.to_colors();
    let total = (modules as u32 + margin * 2) as f64;

    let (scale, symbol_size) = if size as f64 >= total {
        (size as f64 / total, size)
    } else {
        (FALLBACK_SCALE, (total * FALLBACK_SCALE) as u32)
    };
    let scaled_margin = margin as f64 * scale;
    let inner_end = symbol_size as f64 - scaled_margin;

    RgbaImage::from_fn(symbol_size, symbol_size, |x, y| {
        let (fx, fy) = (x as f64, y as f64);
        if fx < scaled_margin || fy < scaled_margin || fx >= inner_end || fy >= inner_end {
            return light.0;
        }
        let col = (((fx - scaled_margin) / scale).floor() as usize).min(modules - 1);
        let row = (((fy - scaled_margin) / scale).floor() as usize).min(modules - 1);
        match colors[row * modules + col] {
            Color::Dark => dark.0,
            Color::Light => light.0,
        }
    })
}

pub fn png_data_url(bitmap: &RgbaImage) -> Result<String, EncodeError> {
    let mut bytes: Vec<u8> = Vec::new();
    DynamicImage::ImageRgba8(bitmap.clone())
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;

    let b64 = base64::engine::general_purpose::STANDARD.encode(bytes);
    Ok(format!("{PNG_DATA_URL_PREFIX}{b64}"))
}

/// Returns the PNG bytes carried by a `data:image/png;base64,` URL.
pub fn decode_png_data_url(data_url: &str) -> Result<Vec<u8>, String> {
    let payload = data_url
        .strip_prefix(PNG_DATA_URL_PREFIX)
        .ok_or_else(|| "not a PNG data URL".to_string())?;
    base64::engine::general_purpose::STANDARD
        .decode(payload)
        .map_err(|e| format!("invalid base64 payload: {e}"))
}
