use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://localhost:5000/api";

/// Client settings, read from `RESUME_DASH_*` environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Base URL of the job/resume REST service.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Optimization requests can take minutes while the backend talks to the model.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Where exported PDFs are saved. Falls back to the user's Downloads folder.
    #[serde(default)]
    pub download_dir: Option<PathBuf>,
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_request_timeout_secs() -> u64 {
    300
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            request_timeout_secs: default_request_timeout_secs(),
            download_dir: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        let config: Config = envy::prefixed("RESUME_DASH_")
            .from_env()
            .context("Invalid RESUME_DASH_* configuration")?;
        Ok(config.normalized())
    }

    pub fn with_api_url(mut self, api_url: Option<String>) -> Self {
        if let Some(url) = api_url {
            self.api_url = url;
        }
        self.normalized()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Directory exports are written to, if one can be found.
    pub fn resolve_download_dir(&self) -> Option<PathBuf> {
        self.download_dir.clone().or_else(|| {
            directories::UserDirs::new()
                .and_then(|dirs| dirs.download_dir().map(|p| p.to_path_buf()))
        })
    }

    fn normalized(mut self) -> Self {
        let trimmed = self.api_url.trim().trim_end_matches('/');
        self.api_url = if trimmed.is_empty() {
            default_api_url()
        } else {
            trimmed.to_string()
        };
        self
    }
}
