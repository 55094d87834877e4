use anyhow::{Context, Result};
use serde::Deserialize;

use crate::capture::CaptureMode;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub service: ServiceConfig,
    pub backend: BackendConfig,
    pub detection: DetectionConfig,
    pub capture: CaptureMode,
    pub overlay: OverlayConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: "pathos".to_string(),
            http: HttpConfig::default(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 7861,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub url: String,
    pub health_timeout_ms: u64,
    pub request_timeout_ms: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:7860".to_string(),
            health_timeout_ms: 5_000,
            request_timeout_ms: 15_000,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Minimum time between two capture starts
    pub min_interval_ms: u64,
    /// Scheduler wake-up period
    pub tick_interval_ms: u64,
    pub max_attempts: u32,
    pub retry_base_delay_ms: u64,
    /// Faces below this top score (0–100) are not drawn
    pub min_confidence: f32,
    /// Use a registered local classifier when the backend is down
    pub local_fallback: bool,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            min_interval_ms: 3_000,
            tick_interval_ms: 50,
            max_attempts: 3,
            retry_base_delay_ms: 1_000,
            min_confidence: 0.0,
            local_fallback: false,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    pub viewport_width: u32,
    pub viewport_height: u32,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            viewport_width: 1280,
            viewport_height: 720,
        }
    }
}

impl Config {
    /// Load `path` (any format the config crate knows, optional) overlaid with
    /// `PATHOS__SECTION__KEY` environment variables
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix("PATHOS").separator("__"))
            .build()
            .with_context(|| format!("Failed to read config from {}", path))?;

        settings
            .try_deserialize()
            .context("Invalid configuration")
    }
}
