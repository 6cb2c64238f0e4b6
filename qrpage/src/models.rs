use image::{Rgba, RgbaImage};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::status::StatusLine;

pub const IDLE_BUTTON_LABEL: &str = "Generate QR Code";
pub const BUSY_BUTTON_LABEL: &str = "Generating...";
pub const DEFAULT_MARGIN: u32 = 2;
pub const LIGHT_COLOR: &str = "#FFFFFF";

/// Color as given by the color selector (`#RGB`, `#RGBA`, `#RRGGBB` or `#RRGGBBAA`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HexColor(pub Rgba<u8>);

impl HexColor {
    pub const WHITE: HexColor = HexColor(Rgba([255, 255, 255, 255]));
}

impl FromStr for HexColor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim();
        let hex = raw.strip_prefix('#').unwrap_or(raw);
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(format!("Invalid hex color: {raw}"));
        }

        // Short forms double every digit: "#0f8" -> "#00ff88".
        let expanded: String = match hex.len() {
            3 | 4 => hex.chars().flat_map(|c| [c, c]).collect(),
            6 | 8 => hex.to_string(),
            _ => return Err(format!("Invalid hex color: {raw}")),
        };

        let channel = |i: usize| u8::from_str_radix(&expanded[i..i + 2], 16);
        let parse = || -> Result<Rgba<u8>, std::num::ParseIntError> {
            let a = if expanded.len() == 8 { channel(6)? } else { 255 };
            Ok(Rgba([channel(0)?, channel(2)?, channel(4)?, a]))
        };
        parse()
            .map(HexColor)
            .map_err(|_| format!("Invalid hex color: {raw}"))
    }
}

impl fmt::Display for HexColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [r, g, b, a] = self.0 .0;
        if a == 255 {
            write!(f, "#{r:02X}{g:02X}{b:02X}")
        } else {
            write!(f, "#{r:02X}{g:02X}{b:02X}{a:02X}")
        }
    }
}

/// One generation attempt. Built fresh from the form every time.
///
/// Colors stay as the selector gave them; the encoder validates them and
/// reports a bad value as an encode failure.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub text: String,
    /// Target width and height in pixels. 0 lets the encoder pick its default scale.
    pub size: u32,
    pub dark: String,
    pub light: String,
    pub margin: u32,
    pub ec_level: qrcode::EcLevel,
}

impl GenerationRequest {
    /// Builds a request from raw selector values. `text` must already be trimmed.
    pub fn from_form(text: &str, size: &str, color: &str, margin: u32) -> Self {
        Self {
            text: text.to_string(),
            size: parse_size(size),
            dark: color.trim().to_string(),
            light: LIGHT_COLOR.to_string(),
            margin,
            ec_level: qrcode::EcLevel::M,
        }
    }
}

/// Leading-digit parse of a size selector value ("256", "256px").
/// Anything without leading digits yields 0.
pub fn parse_size(raw: &str) -> u32 {
    let digits: String = raw
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse::<u32>().unwrap_or(0)
}

/// Output of a successful encode.
#[derive(Debug, Clone)]
pub struct RenderedQr {
    pub bitmap: RgbaImage,
    pub data_url: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FormState {
    pub text: String,
    pub size: String,
    pub color: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ButtonState {
    pub label: String,
    pub disabled: bool,
}

impl ButtonState {
    pub fn idle() -> Self {
        Self {
            label: IDLE_BUTTON_LABEL.to_string(),
            disabled: false,
        }
    }

    pub fn busy() -> Self {
        Self {
            label: BUSY_BUTTON_LABEL.to_string(),
            disabled: true,
        }
    }

    pub fn is_busy(&self) -> bool {
        self.disabled
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StatusKind {
    Success,
    Error,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct StatusMessage {
    pub kind: StatusKind,
    pub text: String,
}

/// The image region. `bitmap` is skipped on serialization; only its size is reported.
#[derive(Debug, Clone, Default, Serialize)]
pub struct OutputRegion {
    pub has_content: bool,
    #[serde(skip)]
    pub bitmap: Option<RgbaImage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<(u32, u32)>,
}

impl OutputRegion {
    pub fn clear(&mut self) {
        self.has_content = false;
        self.bitmap = None;
        self.dimensions = None;
    }

    pub fn show(&mut self, bitmap: RgbaImage) {
        self.dimensions = Some(bitmap.dimensions());
        self.bitmap = Some(bitmap);
        self.has_content = true;
    }
}

/// Everything visible on the page.
#[derive(Debug, Clone, Serialize)]
pub struct PageView {
    pub form: FormState,
    pub button: ButtonState,
    pub status: StatusLine,
    pub output: OutputRegion,
    pub download_visible: bool,
}

impl PageView {
    pub fn new(form: FormState) -> Self {
        Self {
            form,
            button: ButtonState::idle(),
            status: StatusLine::default(),
            output: OutputRegion::default(),
            download_visible: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_long_and_short_hex() {
        assert_eq!(
            "#000000".parse::<HexColor>().unwrap(),
            HexColor(Rgba([0, 0, 0, 255]))
        );
        assert_eq!(
            "#0f8".parse::<HexColor>().unwrap(),
            HexColor(Rgba([0x00, 0xff, 0x88, 255]))
        );
        assert_eq!(
            "#11223380".parse::<HexColor>().unwrap(),
            HexColor(Rgba([0x11, 0x22, 0x33, 0x80]))
        );
        assert_eq!("#ffffff".parse::<HexColor>().unwrap().to_string(), "#FFFFFF");
    }

    #[test]
    fn rejects_bad_hex() {
        assert!("#12345".parse::<HexColor>().is_err());
        assert!("#gg0000".parse::<HexColor>().is_err());
        assert!("".parse::<HexColor>().is_err());
    }

    #[test]
    fn size_uses_leading_digits() {
        assert_eq!(parse_size("256"), 256);
        assert_eq!(parse_size(" 512px"), 512);
        assert_eq!(parse_size("abc"), 0);
        assert_eq!(parse_size("0"), 0);
    }

    #[test]
    fn request_uses_fixed_light_color_and_level() {
        let req = GenerationRequest::from_form("hi", "128", " #ff0000 ", 2);
        assert_eq!(req.light, "#FFFFFF");
        assert_eq!(req.dark, "#ff0000");
        assert_eq!(req.ec_level, qrcode::EcLevel::M);
        assert_eq!(req.size, 128);
        assert_eq!(req.margin, 2);
    }
}
