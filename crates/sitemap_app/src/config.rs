//! Settings file loading and merging with command-line flags.
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crawl_logging::crawl_info;
use ron::extensions::Extensions;
use serde::{Deserialize, Serialize};
use sitemap_core::{derive_base_url, ConfigError, CrawlConfig};
use sitemap_engine::BackendSettings;

use crate::cli::Cli;
use crate::{SessionError, SessionOptions, DEFAULT_STATUS_INTERVAL};

/// Optional settings file. Every field is optional; absent fields keep defaults.
///
/// ```ron
/// (
///     url: "https://example.com/docs",
///     concurrency: 10,
///     excluded_extensions: [".png", ".pdf"],
/// )
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub url: Option<String>,
    pub from_page: Option<bool>,
    pub concurrency: Option<usize>,
    pub allowed_content_types: Option<Vec<String>>,
    pub excluded_extensions: Option<Vec<String>>,
    pub accepted_status_codes: Option<Vec<u16>>,
    pub drain_interval_ms: Option<u64>,
    pub close_poll_interval_ms: Option<u64>,
    pub output_dir: Option<PathBuf>,
    pub status_interval_secs: Option<u64>,
    pub max_duration_secs: Option<u64>,
    pub report: Option<bool>,
    pub user_agent: Option<String>,
    pub connect_timeout_secs: Option<u64>,
    pub request_timeout_secs: Option<u64>,
    pub max_body_bytes: Option<u64>,
    pub max_links: Option<usize>,
}

pub fn load_file_config(path: &Path) -> Result<FileConfig, SessionError> {
    let content = fs::read_to_string(path).map_err(|err| SessionError::ConfigFile {
        path: path.to_path_buf(),
        message: err.to_string(),
    })?;
    let config = ron::Options::default()
        .with_default_extension(Extensions::IMPLICIT_SOME)
        .from_str(&content)
        .map_err(|err| SessionError::ConfigFile {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
    crawl_info!("Loaded settings from {:?}", path);
    Ok(config)
}

/// Merges defaults, the settings file and command-line flags, in that order.
pub fn build_options(cli: &Cli, file: FileConfig) -> Result<SessionOptions, SessionError> {
    let raw_url = cli
        .url
        .clone()
        .or(file.url)
        .ok_or(ConfigError::MissingUrl)?;
    let from_page = cli.from_page || file.from_page.unwrap_or(false);
    let base_url = if from_page {
        derive_base_url(&raw_url)?
    } else {
        raw_url
    };

    let mut crawl = CrawlConfig::new(&base_url)?;
    if let Some(types) = file.allowed_content_types {
        crawl.allowed_content_types = types;
    }
    if let Some(extensions) = file.excluded_extensions {
        crawl.excluded_extensions = extensions;
    }
    if let Some(codes) = file.accepted_status_codes {
        crawl.accepted_status_codes = codes;
    }
    if let Some(concurrency) = cli.concurrency.or(file.concurrency) {
        crawl.concurrency = concurrency;
    }
    if let Some(ms) = file.drain_interval_ms {
        crawl.drain_interval = Duration::from_millis(ms.max(1));
    }
    if let Some(ms) = file.close_poll_interval_ms {
        crawl.close_poll_interval = Duration::from_millis(ms.max(1));
    }

    let mut backend = BackendSettings::default();
    if let Some(agent) = cli.user_agent.clone().or(file.user_agent) {
        backend.user_agent = agent;
    }
    if let Some(secs) = file.connect_timeout_secs {
        backend.connect_timeout = Duration::from_secs(secs);
    }
    if let Some(secs) = cli.request_timeout.or(file.request_timeout_secs) {
        backend.request_timeout = Duration::from_secs(secs);
    }
    if let Some(bytes) = file.max_body_bytes {
        backend.max_bytes = bytes;
    }
    if let Some(links) = file.max_links {
        backend.max_links = links;
    }

    Ok(SessionOptions {
        crawl,
        backend,
        output_dir: cli
            .output_dir
            .clone()
            .or(file.output_dir)
            .unwrap_or_else(|| PathBuf::from(".")),
        status_interval: cli
            .status_interval
            .or(file.status_interval_secs)
            .map(|secs| Duration::from_secs(secs.max(1)))
            .unwrap_or(DEFAULT_STATUS_INTERVAL),
        max_duration: cli
            .max_duration
            .or(file.max_duration_secs)
            .map(Duration::from_secs),
        write_report: cli.report || file.report.unwrap_or(false),
    })
}
