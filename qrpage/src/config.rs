use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;
use crate::models::{parse_size, HexColor, DEFAULT_MARGIN};

pub const DEFAULT_DEBOUNCE_MS: u64 = 1000;
pub const DEFAULT_STATUS_CLEAR_MS: u64 = 3000;
pub const DEFAULT_SIZE: u32 = 256;
pub const DEFAULT_COLOR: &str = "#000000";
pub const DOWNLOAD_FILENAME: &str = "qrcode.png";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageConfig {
    /// Quiet period before a text change triggers generation.
    pub debounce: Duration,
    /// How long a success status stays visible.
    pub status_clear: Duration,
    /// Light modules around the symbol.
    pub margin: u32,
    pub default_size: u32,
    pub default_color: String,
    pub download_filename: String,
    pub download_dir: PathBuf,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(DEFAULT_DEBOUNCE_MS),
            status_clear: Duration::from_millis(DEFAULT_STATUS_CLEAR_MS),
            margin: DEFAULT_MARGIN,
            default_size: DEFAULT_SIZE,
            default_color: DEFAULT_COLOR.to_string(),
            download_filename: DOWNLOAD_FILENAME.to_string(),
            download_dir: PathBuf::from("."),
        }
    }
}

/// Values given on the command line; they win over everything else.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub download_dir: Option<String>,
    pub size: Option<String>,
    pub color: Option<String>,
}

/// `KEY=value` pairs from a dotenv-style file. A missing file yields an
/// empty map; comments, malformed lines and empty values are skipped.
pub fn read_env_file(path: &Path) -> HashMap<String, String> {
    std::fs::read_to_string(path)
        .map(|content| content.lines().filter_map(parse_env_line).collect())
        .unwrap_or_default()
}

fn parse_env_line(line: &str) -> Option<(String, String)> {
    let line = line.trim();
    if line.starts_with('#') {
        return None;
    }
    let line = line.strip_prefix("export ").unwrap_or(line);
    let (key, value) = line.split_once('=')?;
    let key = key.trim();
    let value = value.trim();
    let value = value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .or_else(|| value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
        .unwrap_or(value);
    (!key.is_empty() && !value.is_empty()).then(|| (key.to_string(), value.to_string()))
}

impl PageConfig {
    /// Resolution order: overrides > `QRPAGE_*` environment > `<dir>/.env` > defaults.
    pub fn load(dir: &Path, overrides: ConfigOverrides) -> Result<Self, ConfigError> {
        let file = read_env_file(&dir.join(".env"));
        Self::resolve(overrides, |key| {
            std::env::var(key)
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .or_else(|| file.get(key).cloned())
        })
    }

    fn resolve(
        overrides: ConfigOverrides,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut cfg = PageConfig::default();

        if let Some(v) = lookup("QRPAGE_DEBOUNCE_MS") {
            cfg.debounce = Duration::from_millis(parse_millis("QRPAGE_DEBOUNCE_MS", &v)?);
        }
        if let Some(v) = lookup("QRPAGE_STATUS_CLEAR_MS") {
            cfg.status_clear = Duration::from_millis(parse_millis("QRPAGE_STATUS_CLEAR_MS", &v)?);
        }
        if let Some(v) = overrides.size.or_else(|| lookup("QRPAGE_SIZE")) {
            let size = parse_size(&v);
            if size == 0 {
                return Err(ConfigError::InvalidValue {
                    key: "QRPAGE_SIZE",
                    value: v,
                });
            }
            cfg.default_size = size;
        }
        if let Some(v) = overrides.color.or_else(|| lookup("QRPAGE_COLOR")) {
            v.parse::<HexColor>()
                .map_err(|_| ConfigError::InvalidValue {
                    key: "QRPAGE_COLOR",
                    value: v.clone(),
                })?;
            cfg.default_color = v;
        }
        if let Some(v) = overrides
            .download_dir
            .or_else(|| lookup("QRPAGE_DOWNLOAD_DIR"))
        {
            cfg.download_dir = PathBuf::from(v);
        }

        Ok(cfg)
    }
}

fn parse_millis(key: &'static str, value: &str) -> Result<u64, ConfigError> {
    value
        .trim()
        .parse::<u64>()
        .map_err(|_| ConfigError::InvalidValue {
            key,
            value: value.to_string(),
        })
}
