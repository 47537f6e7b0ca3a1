use std::collections::BTreeMap;

use url::Url;

use crate::{CrawlConfig, Frontier, Ledger};

pub type PageId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Running,
    Draining,
    Complete,
}

/// Point-in-time counters for a session.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CrawlStatus {
    pub url: String,
    pub state: SessionState,
    /// URLs pending in the frontier.
    pub queue: usize,
    /// URLs dispatched or otherwise terminally handled.
    pub completed: usize,
    pub success: usize,
    pub error: usize,
}

/// Orchestrator state. Holds at most one session; idle until started.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CrawlState {
    pub(crate) session: Option<Session>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Session {
    pub(crate) config: CrawlConfig,
    pub(crate) base: Url,
    pub(crate) phase: SessionState,
    pub(crate) frontier: Frontier,
    pub(crate) ledger: Ledger,
    pub(crate) open_pages: BTreeMap<PageId, OpenPage>,
    pub(crate) next_page_id: PageId,
    pub(crate) context_ready: bool,
    pub(crate) dispatched_any: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct OpenPage {
    pub(crate) url: String,
    pub(crate) headers_seen: bool,
}

impl CrawlState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn session_state(&self) -> SessionState {
        self.session
            .as_ref()
            .map_or(SessionState::Idle, |session| session.phase)
    }

    pub fn is_complete(&self) -> bool {
        self.session_state() == SessionState::Complete
    }

    /// Safe to call in any state; an idle orchestrator reports zeros.
    pub fn status(&self) -> CrawlStatus {
        match &self.session {
            Some(session) => session.status(),
            None => CrawlStatus::default(),
        }
    }

    /// URLs pending dispatch, in dispatch order.
    pub fn pending_urls(&self) -> Vec<String> {
        self.session
            .as_ref()
            .map(|session| session.frontier.iter().map(str::to_string).collect())
            .unwrap_or_default()
    }

    /// Success URLs in lexicographic order.
    pub fn success_urls(&self) -> Vec<String> {
        self.session
            .as_ref()
            .map(|session| session.ledger.success().map(str::to_string).collect())
            .unwrap_or_default()
    }

    /// Error URLs in lexicographic order.
    pub fn error_urls(&self) -> Vec<String> {
        self.session
            .as_ref()
            .map(|session| session.ledger.errors().map(str::to_string).collect())
            .unwrap_or_default()
    }

    /// Pages dispatched and not yet confirmed closed.
    pub fn open_page_count(&self) -> usize {
        self.session
            .as_ref()
            .map_or(0, |session| session.open_pages.len())
    }
}

impl Session {
    pub(crate) fn new(config: CrawlConfig, base: Url) -> Self {
        Self {
            config,
            base,
            phase: SessionState::Running,
            frontier: Frontier::new(),
            ledger: Ledger::new(),
            open_pages: BTreeMap::new(),
            next_page_id: 1,
            context_ready: false,
            dispatched_any: false,
        }
    }

    pub(crate) fn status(&self) -> CrawlStatus {
        CrawlStatus {
            url: self.config.base_url().to_string(),
            state: self.phase,
            queue: self.frontier.len(),
            completed: self.ledger.handled_count(),
            success: self.ledger.success_count(),
            error: self.ledger.error_count(),
        }
    }

    /// True once nothing is pending, nothing is in flight and at least one
    /// page was dispatched.
    pub(crate) fn crawl_exhausted(&self) -> bool {
        self.dispatched_any && self.open_pages.is_empty() && self.frontier.is_empty()
    }

    pub(crate) fn allocate_page_id(&mut self) -> PageId {
        let id = self.next_page_id;
        self.next_page_id += 1;
        id
    }
}
