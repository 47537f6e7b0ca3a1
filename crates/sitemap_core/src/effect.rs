use std::time::Duration;

use crate::{CrawlStatus, PageId};

/// Work for the caller to carry out, in the order emitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    OpenContext,
    OpenPage { page: PageId, url: String },
    InjectAgent { page: PageId },
    /// Close or cancel a page. Closing an already closed page is harmless.
    ClosePage { page: PageId },
    QueryOpenCount,
    CloseContext,
    /// Replace the periodic timer.
    Schedule(Timer),
    /// Fire the session's completion callback. Emitted exactly once.
    NotifyComplete(CrawlStatus),
    ExportSitemap { document: String },
    ReportStatus(CrawlStatus),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timer {
    Drain(Duration),
    ClosePoll(Duration),
    Stopped,
}

impl Timer {
    pub fn interval(self) -> Option<Duration> {
        match self {
            Timer::Drain(interval) | Timer::ClosePoll(interval) => Some(interval),
            Timer::Stopped => None,
        }
    }
}
