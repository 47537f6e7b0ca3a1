use std::time::Duration;

use thiserror::Error;
use url::Url;

pub const DEFAULT_CONTENT_TYPES: &[&str] = &["text/html", "text/plain"];
pub const DEFAULT_EXCLUDED_EXTENSIONS: &[&str] = &[
    ".png", ".json", ".jpg", ".jpeg", ".js", ".css", ".zip", ".mp3", ".mp4", ".ogg", ".avi",
    ".wav", ".webm", ".gif", ".ico",
];
pub const DEFAULT_ACCEPTED_STATUS_CODES: &[u16] = &[200, 201, 202, 203, 304];
pub const DEFAULT_CONCURRENCY: usize = 25;
pub const DEFAULT_DRAIN_INTERVAL: Duration = Duration::from_millis(500);
pub const DEFAULT_CLOSE_POLL_INTERVAL: Duration = Duration::from_millis(250);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("url value is required")]
    MissingUrl,
    #[error("url must start with http:// or https://: {0}")]
    UnsupportedScheme(String),
    #[error("invalid url {url}: {message}")]
    InvalidUrl { url: String, message: String },
}

/// Settings for one crawl session. The base URL is validated on construction;
/// everything else can be adjusted freely before the session starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlConfig {
    base_url: String,
    pub allowed_content_types: Vec<String>,
    pub excluded_extensions: Vec<String>,
    pub accepted_status_codes: Vec<u16>,
    pub concurrency: usize,
    pub drain_interval: Duration,
    pub close_poll_interval: Duration,
}

impl CrawlConfig {
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        let mut url = parse_http_url(base_url)?;
        url.set_fragment(None);
        Ok(Self {
            base_url: url.into(),
            allowed_content_types: DEFAULT_CONTENT_TYPES.iter().map(|s| s.to_string()).collect(),
            excluded_extensions: DEFAULT_EXCLUDED_EXTENSIONS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            accepted_status_codes: DEFAULT_ACCEPTED_STATUS_CODES.to_vec(),
            concurrency: DEFAULT_CONCURRENCY,
            drain_interval: DEFAULT_DRAIN_INTERVAL,
            close_poll_interval: DEFAULT_CLOSE_POLL_INTERVAL,
        })
    }

    /// Canonical base URL; every admitted URL has it as a prefix.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Match pattern covering everything beneath the base URL, e.g. `https://x.test/*`.
    pub fn request_pattern(&self) -> String {
        format!("{}/*", self.base_url).replace("//*", "/*")
    }

    /// Concurrency cap as enforced by the orchestrator (never below one).
    pub fn effective_concurrency(&self) -> usize {
        self.concurrency.max(1)
    }

    /// Compares the media type of a `Content-Type` header value, ignoring parameters.
    pub fn is_content_type_allowed(&self, content_type: &str) -> bool {
        let media_type = content_type
            .split(';')
            .next()
            .unwrap_or(content_type)
            .trim();
        self.allowed_content_types
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(media_type))
    }

    pub fn is_status_accepted(&self, status: u16) -> bool {
        self.accepted_status_codes.contains(&status)
    }
}

/// Derives a crawl base from the URL of an arbitrary page of the site.
///
/// The last path segment is dropped when it is empty, looks like a file
/// (`.` after its first character) or the URL carries a query or fragment.
/// The result has no trailing slash.
pub fn derive_base_url(page_url: &str) -> Result<String, ConfigError> {
    let mut url = parse_http_url(page_url)?;
    let last = url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .unwrap_or("")
        .to_string();
    let drop_last = last.is_empty()
        || last.find('.').is_some_and(|idx| idx > 0)
        || url.query().is_some()
        || url.fragment().is_some();

    url.set_query(None);
    url.set_fragment(None);
    if drop_last {
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop();
        }
    }
    Ok(url.as_str().trim_end_matches('/').to_string())
}

fn parse_http_url(raw: &str) -> Result<Url, ConfigError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::MissingUrl);
    }
    let lower = trimmed.to_ascii_lowercase();
    if !lower.starts_with("http://") && !lower.starts_with("https://") {
        return Err(ConfigError::UnsupportedScheme(trimmed.to_string()));
    }
    Url::parse(trimmed).map_err(|err| ConfigError::InvalidUrl {
        url: trimmed.to_string(),
        message: err.to_string(),
    })
}
