use anyhow::{Context, Result};
use std::env;
use std::time::Duration;

pub const DEFAULT_ENDPOINT: &str = "https://ark.cn-beijing.volces.com/api/v3/chat/completions";
pub const DEFAULT_MODEL: &str = "doubao-seed-1-6-flash-250715";
const DEFAULT_TIMEOUT_SECS: u64 = 60;
const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_STATIC_DIR: &str = "static";

#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: String,
    pub endpoint: String,
    pub model: String,
    pub request_timeout: Duration,
    pub max_upload_bytes: usize,
    pub bind_addr: String,
    pub static_dir: String,
}

impl Config {
    /// Reads the process environment (after `.env` has been loaded).
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup("ARK_API_KEY")
            .filter(|key| !key.trim().is_empty())
            .context("ARK_API_KEY must be set (environment or .env file)")?;

        let request_timeout = match lookup("ARK_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(
                raw.trim()
                    .parse()
                    .with_context(|| format!("ARK_TIMEOUT_SECS is not a number: {}", raw))?,
            ),
            None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        let max_upload_bytes = match lookup("MAX_UPLOAD_BYTES") {
            Some(raw) => raw
                .trim()
                .parse()
                .with_context(|| format!("MAX_UPLOAD_BYTES is not a number: {}", raw))?,
            None => DEFAULT_MAX_UPLOAD_BYTES,
        };

        Ok(Self {
            api_key,
            endpoint: lookup("ARK_ENDPOINT").unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
            model: lookup("ARK_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            request_timeout,
            max_upload_bytes,
            bind_addr: lookup("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            static_dir: lookup("STATIC_DIR").unwrap_or_else(|| DEFAULT_STATIC_DIR.to_string()),
        })
    }

    #[cfg(test)]
    pub fn for_endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            api_key: "test-key".to_string(),
            endpoint: endpoint.into(),
            model: "test-model".to_string(),
            request_timeout: Duration::from_secs(5),
            max_upload_bytes: 1024,
            bind_addr: "127.0.0.1:0".to_string(),
            static_dir: DEFAULT_STATIC_DIR.to_string(),
        }
    }
}
