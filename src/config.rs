//! Configuration management for the ID scan server

use std::env;
use std::fmt;
use std::path::PathBuf;

use crate::extraction::OpenAiConfig;
use crate::ocr::{OcrFallbackConfig, DEFAULT_LANGUAGES};
use crate::pdf::PageRasterizer;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {value:?}")]
    Invalid { var: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub store: StoreConfig,
    pub ocr: OcrFallbackConfig,
    pub openai: OpenAiSettings,
    pub upload: UploadConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub path: PathBuf,
}

#[derive(Clone)]
pub struct OpenAiSettings {
    /// Server-side fallback when an upload carries no key
    pub api_key: Option<String>,
    pub client: OpenAiConfig,
}

impl fmt::Debug for OpenAiSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiSettings")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("client", &self.client)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct UploadConfig {
    pub max_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
            },
            store: StoreConfig {
                path: PathBuf::from("./data/documentos.json"),
            },
            ocr: OcrFallbackConfig::default(),
            openai: OpenAiSettings {
                api_key: None,
                client: OpenAiConfig::default(),
            },
            upload: UploadConfig {
                max_bytes: 20 * 1024 * 1024,
            },
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Config::default();

        Ok(Config {
            server: ServerConfig {
                host: env::var("SERVER_HOST").unwrap_or(defaults.server.host),
                port: parse_var("SERVER_PORT", defaults.server.port)?,
            },
            store: StoreConfig {
                path: env::var("DOCUMENT_STORE_PATH")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.store.path),
            },
            ocr: OcrFallbackConfig {
                tesseract_path: env::var("TESSERACT_PATH")
                    .unwrap_or(defaults.ocr.tesseract_path),
                languages: env::var("OCR_LANGUAGES")
                    .unwrap_or_else(|_| DEFAULT_LANGUAGES.to_string()),
                dpi: parse_var("OCR_DPI", PageRasterizer::OCR_DPI)?,
            },
            openai: OpenAiSettings {
                api_key: env::var("OPENAI_API_KEY")
                    .ok()
                    .filter(|key| !key.trim().is_empty()),
                client: OpenAiConfig {
                    base_url: env::var("OPENAI_BASE_URL")
                        .unwrap_or(defaults.openai.client.base_url),
                    text_model: env::var("OPENAI_TEXT_MODEL")
                        .unwrap_or(defaults.openai.client.text_model),
                    vision_model: env::var("OPENAI_VISION_MODEL")
                        .unwrap_or(defaults.openai.client.vision_model),
                    timeout_secs: parse_var(
                        "OPENAI_TIMEOUT_SECS",
                        defaults.openai.client.timeout_secs,
                    )?,
                },
            },
            upload: UploadConfig {
                max_bytes: parse_var("MAX_UPLOAD_BYTES", defaults.upload.max_bytes)?,
            },
        })
    }
}

fn parse_var<T: std::str::FromStr>(var: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(var) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { var, value }),
        Err(_) => Ok(default),
    }
}
