use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://localhost:8000";
/// Environment variable overriding the backend base URL.
pub const API_URL_ENV: &str = "STUDYMIND_API_URL";

#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub base_url: String,
    pub connect_timeout: Duration,
    /// Uploads of large documents can take minutes.
    pub request_timeout: Duration,
    pub poll_interval: Duration,
    /// Upload progress is reported once per chunk of this size.
    pub upload_chunk_size: usize,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(10 * 60),
            poll_interval: Duration::from_millis(2000),
            upload_chunk_size: 64 * 1024,
        }
    }
}

impl ClientSettings {
    /// Defaults with the base URL taken from `STUDYMIND_API_URL` when set.
    pub fn from_env() -> Self {
        let base_url = std::env::var(API_URL_ENV)
            .ok()
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        Self {
            base_url,
            ..Self::default()
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}
