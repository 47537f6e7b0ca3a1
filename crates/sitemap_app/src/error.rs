use std::path::PathBuf;

use sitemap_core::ConfigError;
use sitemap_engine::{BackendError, ExportError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("failed to read config file {path}: {message}")]
    ConfigFile { path: PathBuf, message: String },
    #[error("backend unavailable: {0}")]
    Backend(#[from] BackendError),
    #[error("export failed: {0}")]
    Export(#[from] ExportError),
    #[error("failed to serialize crawl report: {0}")]
    Report(#[from] serde_json::Error),
    #[error("engine stopped before the session completed")]
    EngineStopped,
}
