use std::time::Duration;

use crate::query::Preset;

pub const DEFAULT_API_URL: &str = "https://seo-engine.onrender.com";

#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: String,
    pub page_size: u32,
    pub request_timeout_secs: u64,
    /// Ingestion window applied until the user picks another preset.
    pub default_preset: Preset,
    /// Fallback GA4 property for `fetch-ga4` when none is passed explicitly.
    pub ga4_property_id: Option<String>,
    pub export_dir: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            page_size: 50,
            request_timeout_secs: 30,
            default_preset: Preset::Last30Days,
            ga4_property_id: None,
            export_dir: ".".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let api_url = std::env::var("SEO_ENGINE_API_URL")
            .unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        url::Url::parse(&api_url).map_err(|e| format!("invalid SEO_ENGINE_API_URL: {e}"))?;

        let page_size: u32 = std::env::var("SEO_ENGINE_PAGE_SIZE")
            .unwrap_or_else(|_| "50".to_string())
            .parse()
            .map_err(|e| format!("invalid page size: {e}"))?;
        if page_size == 0 {
            return Err("SEO_ENGINE_PAGE_SIZE must be at least 1".to_string());
        }

        let default_preset = match std::env::var("SEO_ENGINE_DEFAULT_DAYS") {
            Ok(raw) => {
                let days: u32 = raw
                    .parse()
                    .map_err(|e| format!("invalid SEO_ENGINE_DEFAULT_DAYS: {e}"))?;
                Preset::from_days(days).ok_or_else(|| {
                    format!("SEO_ENGINE_DEFAULT_DAYS must be one of 7, 30, 90, 180 (got {days})")
                })?
            }
            Err(_) => Preset::Last30Days,
        };

        Ok(Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            page_size,
            request_timeout_secs: std::env::var("SEO_ENGINE_TIMEOUT_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .unwrap_or(30),
            default_preset,
            ga4_property_id: std::env::var("SEO_ENGINE_GA4_PROPERTY_ID")
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty()),
            export_dir: std::env::var("SEO_ENGINE_EXPORT_DIR").unwrap_or_else(|_| ".".to_string()),
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
