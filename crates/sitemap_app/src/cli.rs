//! Command-line flags for `sitemap-gen`.
use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use crawl_logging::LogDestination;
use log::LevelFilter;

pub const DEFAULT_LOG_FILE: &str = "./sitemap.log";

#[derive(Parser, Debug, Clone, Default)]
#[command(
    name = "sitemap-gen",
    version,
    about = "Crawl a website breadth-first and write a sitemap.xml of its pages"
)]
pub struct Cli {
    /// Base URL to crawl. Only URLs starting with it are followed.
    pub url: Option<String>,

    /// Treat URL as an arbitrary page and crawl from its directory.
    #[arg(long)]
    pub from_page: bool,

    /// RON file with crawl settings; flags given here take precedence.
    #[arg(long, short, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Maximum number of pages open at once.
    #[arg(long, short = 'j')]
    pub concurrency: Option<usize>,

    /// Directory the sitemap (and report) are written to.
    #[arg(long, short, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Seconds between status lines.
    #[arg(long, value_name = "SECS")]
    pub status_interval: Option<u64>,

    /// Stop the crawl after this many seconds and export what was found.
    #[arg(long, value_name = "SECS")]
    pub max_duration: Option<u64>,

    /// Also write a JSON report with the success and error URLs.
    #[arg(long)]
    pub report: bool,

    #[arg(long)]
    pub user_agent: Option<String>,

    /// Per-request timeout in seconds.
    #[arg(long, value_name = "SECS")]
    pub request_timeout: Option<u64>,

    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,

    #[arg(long, value_enum, default_value_t = LogTarget::Terminal)]
    pub log_to: LogTarget,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::Off,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogTarget {
    #[default]
    Terminal,
    /// `./sitemap.log` in the working directory.
    File,
    Both,
}

impl From<LogTarget> for LogDestination {
    fn from(target: LogTarget) -> Self {
        match target {
            LogTarget::Terminal => LogDestination::Terminal,
            LogTarget::File => LogDestination::File,
            LogTarget::Both => LogDestination::Both,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_flags() {
        let cli = Cli::try_parse_from([
            "sitemap-gen",
            "https://x.test/docs",
            "-j",
            "4",
            "--max-duration",
            "60",
            "--report",
            "--log-level",
            "debug",
            "--log-to",
            "both",
        ])
        .unwrap();

        assert_eq!(cli.url.as_deref(), Some("https://x.test/docs"));
        assert_eq!(cli.concurrency, Some(4));
        assert_eq!(cli.max_duration, Some(60));
        assert!(cli.report);
        assert!(!cli.from_page);
        assert_eq!(cli.log_level, LogLevel::Debug);
        assert_eq!(cli.log_to, LogTarget::Both);
    }

    #[test]
    fn defaults_log_to_terminal_at_info() {
        let cli = Cli::try_parse_from(["sitemap-gen"]).unwrap();
        assert_eq!(cli.url, None);
        assert_eq!(LevelFilter::from(cli.log_level), LevelFilter::Info);
        assert_eq!(cli.log_to, LogTarget::Terminal);
    }
}
