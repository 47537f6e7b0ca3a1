//! Sitemap generator application layer: CLI, configuration and the session driver.
pub mod cli;
pub mod config;
mod effects;
mod error;
mod report;
mod session;

pub use config::{build_options, load_file_config, FileConfig};
pub use error::SessionError;
pub use report::CrawlReport;
pub use session::{
    run_session, run_session_with_backend, SessionOptions, SessionOutcome, DEFAULT_STATUS_INTERVAL,
};
