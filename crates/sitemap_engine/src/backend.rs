use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use crawl_logging::{crawl_debug, crawl_trace};
use futures_util::StreamExt;
use reqwest::header::{CONTENT_TYPE, LOCATION};
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::{decode_body, AgentReport, BackendError, HeaderOutcome, PageAgent, PageId, DEFAULT_MAX_LINKS};

#[derive(Debug, Clone)]
pub struct BackendSettings {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub max_bytes: u64,
    pub user_agent: String,
    pub max_links: usize,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            max_bytes: 5 * 1024 * 1024,
            user_agent: concat!("sitemap-gen/", env!("CARGO_PKG_VERSION")).to_string(),
            max_links: DEFAULT_MAX_LINKS,
        }
    }
}

/// The surface pages are loaded in.
///
/// `open_page`, `close_page` and `query_open_count` are issued in command
/// order and must not wait on the network; the other calls may.
#[async_trait::async_trait]
pub trait RenderBackend: Send + Sync {
    async fn open_context(&self) -> Result<(), BackendError>;

    async fn open_page(&self, page: PageId, url: &str) -> Result<(), BackendError>;

    async fn observe_headers(&self, page: PageId) -> Result<HeaderOutcome, BackendError>;

    async fn inject_agent(&self, page: PageId) -> Result<AgentReport, BackendError>;

    /// Closing an unknown or already closed page succeeds.
    async fn close_page(&self, page: PageId) -> Result<(), BackendError>;

    async fn query_open_count(&self) -> usize;

    async fn close_context(&self) -> Result<(), BackendError>;
}

struct PageSlot {
    url: Url,
    token: CancellationToken,
    response: Option<reqwest::Response>,
}

/// Plain HTTP backend. Redirects are not followed so they surface as
/// [`HeaderOutcome::Redirect`].
pub struct HttpBackend {
    client: reqwest::Client,
    agent: PageAgent,
    max_bytes: u64,
    context_open: AtomicBool,
    pages: Mutex<HashMap<PageId, PageSlot>>,
}

impl HttpBackend {
    pub fn new(settings: BackendSettings) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .user_agent(settings.user_agent.as_str())
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|err| BackendError::Unavailable(err.to_string()))?;

        Ok(Self {
            client,
            agent: PageAgent::with_max_links(settings.max_links),
            max_bytes: settings.max_bytes,
            context_open: AtomicBool::new(false),
            pages: Mutex::new(HashMap::new()),
        })
    }

    fn pages(&self) -> MutexGuard<'_, HashMap<PageId, PageSlot>> {
        self.pages.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn ensure_context(&self) -> Result<(), BackendError> {
        if self.context_open.load(Ordering::Acquire) {
            Ok(())
        } else {
            Err(BackendError::ContextClosed)
        }
    }

    fn slot_handle(&self, page: PageId) -> Result<(Url, CancellationToken), BackendError> {
        self.ensure_context()?;
        let pages = self.pages();
        let slot = pages.get(&page).ok_or(BackendError::PageClosed(page))?;
        Ok((slot.url.clone(), slot.token.clone()))
    }

    async fn read_body(
        &self,
        response: reqwest::Response,
        token: &CancellationToken,
        page: PageId,
    ) -> Result<Vec<u8>, BackendError> {
        if let Some(content_len) = response.content_length() {
            if content_len > self.max_bytes {
                return Err(BackendError::TooLarge {
                    max_bytes: self.max_bytes,
                    actual: Some(content_len),
                });
            }
        }

        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();
        loop {
            let chunk = tokio::select! {
                _ = token.cancelled() => return Err(BackendError::PageClosed(page)),
                chunk = stream.next() => chunk,
            };
            let Some(chunk) = chunk else {
                break;
            };
            let chunk = chunk.map_err(map_reqwest_error)?;
            let next_len = bytes.len() as u64 + chunk.len() as u64;
            if next_len > self.max_bytes {
                return Err(BackendError::TooLarge {
                    max_bytes: self.max_bytes,
                    actual: Some(next_len),
                });
            }
            bytes.extend_from_slice(&chunk);
        }
        Ok(bytes)
    }
}

#[async_trait::async_trait]
impl RenderBackend for HttpBackend {
    async fn open_context(&self) -> Result<(), BackendError> {
        self.context_open.store(true, Ordering::Release);
        Ok(())
    }

    async fn open_page(&self, page: PageId, url: &str) -> Result<(), BackendError> {
        self.ensure_context()?;
        let parsed = Url::parse(url).map_err(|err| BackendError::InvalidUrl {
            url: url.to_string(),
            message: err.to_string(),
        })?;

        let mut pages = self.pages();
        if pages.contains_key(&page) {
            return Err(BackendError::DuplicatePage(page));
        }
        pages.insert(
            page,
            PageSlot {
                url: parsed,
                token: CancellationToken::new(),
                response: None,
            },
        );
        Ok(())
    }

    async fn observe_headers(&self, page: PageId) -> Result<HeaderOutcome, BackendError> {
        let (url, token) = self.slot_handle(page)?;

        let request = self.client.get(url.clone()).send();
        let response = tokio::select! {
            _ = token.cancelled() => return Err(BackendError::PageClosed(page)),
            result = request => result.map_err(map_reqwest_error)?,
        };

        let status = response.status();
        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty());
        if status.is_redirection() {
            if let Some(location) = location {
                let target = url
                    .join(location)
                    .map(String::from)
                    .unwrap_or_else(|_| location.to_string());
                crawl_debug!("Page {} redirected {} -> {}", page, url, target);
                return Ok(HeaderOutcome::Redirect { target });
            }
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_string());

        let mut pages = self.pages();
        let slot = pages.get_mut(&page).ok_or(BackendError::PageClosed(page))?;
        slot.response = Some(response);
        Ok(HeaderOutcome::Response {
            status: status.as_u16(),
            content_type,
        })
    }

    async fn inject_agent(&self, page: PageId) -> Result<AgentReport, BackendError> {
        self.ensure_context()?;
        let (url, token, response) = {
            let mut pages = self.pages();
            let slot = pages.get_mut(&page).ok_or(BackendError::PageClosed(page))?;
            let response = slot.response.take().ok_or(BackendError::NotLoaded(page))?;
            (slot.url.clone(), slot.token.clone(), response)
        };

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_string());
        let bytes = self.read_body(response, &token, page).await?;
        let decoded = decode_body(&bytes, content_type.as_deref());
        crawl_trace!(
            "Page {} body {} bytes ({})",
            page,
            bytes.len(),
            decoded.encoding_label
        );

        Ok(self.agent.scan(&decoded.text, &url))
    }

    async fn close_page(&self, page: PageId) -> Result<(), BackendError> {
        if let Some(slot) = self.pages().remove(&page) {
            slot.token.cancel();
        }
        Ok(())
    }

    async fn query_open_count(&self) -> usize {
        self.pages().len()
    }

    async fn close_context(&self) -> Result<(), BackendError> {
        self.context_open.store(false, Ordering::Release);
        for (_, slot) in self.pages().drain() {
            slot.token.cancel();
        }
        Ok(())
    }
}

fn map_reqwest_error(err: reqwest::Error) -> BackendError {
    if err.is_timeout() {
        return BackendError::Timeout;
    }
    BackendError::Network(err.to_string())
}
