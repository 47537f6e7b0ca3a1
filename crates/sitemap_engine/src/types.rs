use thiserror::Error;

pub type PageId = u64;

/// What the backend saw when the response headers for a page arrived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderOutcome {
    Response {
        status: u16,
        content_type: Option<String>,
    },
    /// 3xx with a `Location` header, resolved against the page URL.
    Redirect { target: String },
}

/// Result of running the page agent over a loaded document.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AgentReport {
    pub origin: String,
    pub exclude_self: Option<String>,
    pub links: Vec<String>,
}

impl AgentReport {
    /// Messages in delivery order: the self-exclusion first, then the links.
    pub fn into_messages(self, page: PageId) -> Vec<AgentMessage> {
        let mut messages = Vec::with_capacity(2);
        if let Some(url) = self.exclude_self {
            messages.push(AgentMessage::ExcludeSelf { page, url });
        }
        messages.push(AgentMessage::DiscoveredLinks {
            page,
            origin: self.origin,
            urls: self.links,
        });
        messages
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentMessage {
    ExcludeSelf {
        page: PageId,
        url: String,
    },
    DiscoveredLinks {
        page: PageId,
        origin: String,
        urls: Vec<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    ContextOpened,
    ContextFailed { reason: String },
    OpenFailed { page: PageId, reason: String },
    Headers {
        page: PageId,
        status: u16,
        content_type: Option<String>,
    },
    Redirected { page: PageId, target: String },
    PageError { page: PageId, reason: String },
    InjectFailed { page: PageId, reason: String },
    Agent(AgentMessage),
    PageClosed { page: PageId },
    OpenPages { count: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    #[error("rendering context is not open")]
    ContextClosed,
    #[error("rendering surface unavailable: {0}")]
    Unavailable(String),
    #[error("page {0} is already open")]
    DuplicatePage(PageId),
    #[error("page {0} was closed")]
    PageClosed(PageId),
    #[error("page {0} has no loaded response")]
    NotLoaded(PageId),
    #[error("invalid url {url}: {message}")]
    InvalidUrl { url: String, message: String },
    #[error("timeout")]
    Timeout,
    #[error("response too large (max {max_bytes}, actual {actual:?})")]
    TooLarge { max_bytes: u64, actual: Option<u64> },
    #[error("network error: {0}")]
    Network(String),
}

impl BackendError {
    /// Failures of the rendering surface itself rather than of one page.
    pub fn is_surface_failure(&self) -> bool {
        matches!(
            self,
            BackendError::ContextClosed | BackendError::Unavailable(_) | BackendError::DuplicatePage(_)
        )
    }

    /// The page went away under the request; nothing needs reporting.
    pub fn is_page_gone(&self) -> bool {
        matches!(self, BackendError::PageClosed(_))
    }
}
