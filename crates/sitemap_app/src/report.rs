use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sitemap_core::CrawlStatus;

/// Final summary of a crawl, written as JSON next to the sitemap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlReport {
    pub url: String,
    pub completed_at: String,
    pub queue: usize,
    pub completed: usize,
    pub success_count: usize,
    pub error_count: usize,
    pub sitemap: Option<String>,
    pub success: Vec<String>,
    pub errors: Vec<String>,
}

impl CrawlReport {
    pub fn new(
        status: &CrawlStatus,
        completed_at: DateTime<Utc>,
        sitemap: Option<String>,
        mut success: Vec<String>,
        mut errors: Vec<String>,
    ) -> Self {
        success.sort();
        errors.sort();
        Self {
            url: status.url.clone(),
            completed_at: completed_at.to_rfc3339(),
            queue: status.queue,
            completed: status.completed,
            success_count: status.success,
            error_count: status.error,
            sitemap,
            success,
            errors,
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// `<sitemap name without .xml>_report.json`
pub(crate) fn report_filename(sitemap_filename: &str) -> String {
    let stem = sitemap_filename
        .strip_suffix(".xml")
        .unwrap_or(sitemap_filename);
    format!("{stem}_report.json")
}
