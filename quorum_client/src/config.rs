use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::error::{ClientError, Result};
use crate::utils::APP_NAME;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the full node, e.g. `http://127.0.0.1:8002`.
    pub api_base: String,

    /// JWT sent as a bearer token on every request.
    #[serde(default)]
    pub jwt_token: Option<String>,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    #[serde(default)]
    pub images: ImageLimits,
}

impl ClientConfig {
    pub fn new(api_base: impl Into<String>) -> Result<Self> {
        Ok(Self {
            api_base: sanitize_base_url(api_base.into())?,
            jwt_token: None,
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
            images: ImageLimits::default(),
        })
    }

    /// Targets a node listening on localhost.
    pub fn from_port(port: u16) -> Result<Self> {
        Self::new(format!("http://127.0.0.1:{port}"))
    }

    pub fn with_jwt_token(mut self, token: impl Into<String>) -> Self {
        self.jwt_token = Some(token.into());
        self
    }

    pub fn with_images(mut self, images: ImageLimits) -> Self {
        self.images = images;
        self
    }

    pub fn from_env() -> Result<Self> {
        let api_base = env::var("QUORUM_API_BASE")
            .ok()
            .filter(|raw| !raw.trim().is_empty());
        let mut config = match api_base {
            Some(base) => Self::new(base)?,
            None => {
                let port = env::var("QUORUM_PORT")
                    .ok()
                    .and_then(|raw| raw.parse::<u16>().ok())
                    .ok_or_else(|| ClientError::invalid("api_base is required"))?;
                Self::from_port(port)?
            }
        };
        config.jwt_token = env::var("QUORUM_JWT_TOKEN")
            .ok()
            .filter(|raw| !raw.trim().is_empty());
        if let Some(secs) = env::var("QUORUM_TIMEOUT_SECS")
            .ok()
            .and_then(|raw| raw.parse().ok())
        {
            config.timeout_secs = secs;
        }
        config.images = ImageLimits::from_env();
        Ok(config)
    }

    /// Reads a TOML file; only `api_base` is mandatory.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let failed = |message: String| ClientError::Config {
            path: path.display().to_string(),
            message,
        };
        let raw = fs::read_to_string(path).map_err(|err| failed(err.to_string()))?;
        let mut config: Self = toml::from_str(&raw).map_err(|err| failed(err.to_string()))?;
        config.api_base = sanitize_base_url(config.api_base)?;
        Ok(config)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Size limits applied when packing images into a single content item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageLimits {
    /// Budget shared by all images of one item, in kilobytes.
    #[serde(default = "default_max_total_kb")]
    pub max_total_kb: usize,
    #[serde(default = "default_max_count")]
    pub max_count: usize,
}

impl Default for ImageLimits {
    fn default() -> Self {
        Self {
            max_total_kb: default_max_total_kb(),
            max_count: default_max_count(),
        }
    }
}

impl ImageLimits {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let read = |key: &str| env::var(key).ok().and_then(|raw| raw.parse::<usize>().ok());
        Self {
            max_total_kb: read("QUORUM_IMAGE_MAX_KB").unwrap_or(defaults.max_total_kb),
            max_count: read("QUORUM_IMAGE_MAX_NUM")
                .filter(|count| *count > 0)
                .unwrap_or(defaults.max_count),
        }
    }

    /// Budget for each of `count` images, split evenly over at most
    /// `max_count` of them.
    pub fn per_image_kb(&self, count: usize) -> usize {
        self.max_total_kb / count.min(self.max_count).max(1)
    }
}

fn default_timeout_secs() -> u64 {
    15
}

fn default_user_agent() -> String {
    APP_NAME.to_string()
}

fn default_max_total_kb() -> usize {
    200
}

fn default_max_count() -> usize {
    4
}

fn sanitize_base_url(base: String) -> Result<String> {
    let mut base = base.trim().to_string();
    if base.is_empty() {
        return Err(ClientError::invalid("api_base is required"));
    }
    if !base.starts_with("http://") && !base.starts_with("https://") {
        base = format!("http://{base}");
    }
    while base.ends_with('/') {
        base.pop();
    }
    Url::parse(&base)
        .map_err(|err| ClientError::invalid(format!("invalid api_base `{base}`: {err}")))?;
    Ok(base)
}
