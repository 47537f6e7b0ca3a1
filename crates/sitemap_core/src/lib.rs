//! Sitemap core: pure crawl orchestrator state machine, URL admission rules
//! and sitemap serialization.
mod config;
mod effect;
pub mod filter;
mod frontier;
mod msg;
mod sitemap;
mod state;
mod update;

pub use config::{
    derive_base_url, ConfigError, CrawlConfig, DEFAULT_ACCEPTED_STATUS_CODES,
    DEFAULT_CLOSE_POLL_INTERVAL, DEFAULT_CONCURRENCY, DEFAULT_CONTENT_TYPES,
    DEFAULT_DRAIN_INTERVAL, DEFAULT_EXCLUDED_EXTENSIONS,
};
pub use effect::{Effect, Timer};
pub use filter::{admit, canonicalize, Admission, Canonical, Rejection};
pub use frontier::{Frontier, Ledger};
pub use msg::Msg;
pub use sitemap::{serialize_sitemap, SITEMAP_NAMESPACE};
pub use state::{CrawlState, CrawlStatus, PageId, SessionState};
pub use update::update;
