use quick_xml::escape::escape;

pub const SITEMAP_NAMESPACE: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

/// Builds a sitemap-protocol `urlset` document, sorted lexicographically.
///
/// Returns `None` when there is nothing to export.
pub fn serialize_sitemap<I, S>(urls: I) -> Option<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut entries: Vec<String> = urls
        .into_iter()
        .map(|url| url.as_ref().to_string())
        .collect();
    if entries.is_empty() {
        return None;
    }
    entries.sort();
    entries.dedup();

    let mut document = String::with_capacity(128 + entries.len() * 64);
    document.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    document.push_str(&format!("<urlset xmlns=\"{SITEMAP_NAMESPACE}\">\n"));
    for url in &entries {
        document.push_str("  <url><loc>");
        document.push_str(&escape(url.as_str()));
        document.push_str("</loc></url>\n");
    }
    document.push_str("</urlset>\n");
    Some(document)
}
