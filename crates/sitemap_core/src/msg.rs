use crate::{CrawlConfig, PageId};

/// Inbound signals, one variant per caller request or backend event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// Begin a session. Ignored unless the state is idle.
    Start(CrawlConfig),
    /// Periodic timer: drains the frontier while running, polls for closed
    /// pages while draining.
    Tick,
    /// Caller asked to stop early.
    Terminate,
    /// Caller asked for a status snapshot.
    Status,
    /// Drop a URL from the sitemap (robots `noindex`).
    Exclude { url: String },
    /// Links the page agent found on `origin`, possibly relative.
    LinksDiscovered {
        page: PageId,
        origin: String,
        urls: Vec<String>,
    },
    ContextOpened,
    ContextFailed { reason: String },
    /// The backend could not open a dispatched page.
    OpenFailed { page: PageId, reason: String },
    HeadersReceived {
        page: PageId,
        status: u16,
        content_type: Option<String>,
    },
    Redirected { page: PageId, target: String },
    /// The rendering surface reported an error for an in-flight page.
    PageError { page: PageId, reason: String },
    InjectFailed { page: PageId, reason: String },
    PageClosed { page: PageId },
    /// Answer to [`crate::Effect::QueryOpenCount`].
    OpenPages { count: usize },
}
