use chrono::{DateTime, Utc};

/// `{base with / : . replaced by _}_sitemap_{YYYY-MM-DD_HHMMSS}.xml`
pub fn sitemap_filename(base_url: &str, completed_at: DateTime<Utc>) -> String {
    let sanitized: String = base_url
        .chars()
        .map(|c| if matches!(c, '/' | ':' | '.') { '_' } else { c })
        .collect();
    format!(
        "{sanitized}_sitemap_{}.xml",
        completed_at.format("%Y-%m-%d_%H%M%S")
    )
}
