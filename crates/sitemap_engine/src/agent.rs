use std::collections::HashSet;

use scraper::{Html, Selector};
use url::Url;

use crate::AgentReport;

pub const DEFAULT_MAX_LINKS: usize = 5_000;

/// Scans a loaded document for robots directives and outgoing links.
#[derive(Debug, Clone)]
pub struct PageAgent {
    max_links: usize,
}

impl PageAgent {
    pub fn new() -> Self {
        Self::with_max_links(DEFAULT_MAX_LINKS)
    }

    pub fn with_max_links(max_links: usize) -> Self {
        Self { max_links }
    }

    /// `noindex` asks for the page itself to be excluded; `nofollow` suppresses
    /// every link. Links come back resolved, deduplicated and in document order.
    pub fn scan(&self, html: &str, page_url: &Url) -> AgentReport {
        let document = Html::parse_document(html);
        let robots = robots_directives(&document);

        let exclude_self = robots
            .contains("noindex")
            .then(|| page_url.to_string());
        let links = if robots.contains("nofollow") {
            Vec::new()
        } else {
            self.collect_links(&document, page_url)
        };

        AgentReport {
            origin: page_url.to_string(),
            exclude_self,
            links,
        }
    }

    fn collect_links(&self, document: &Html, page_url: &Url) -> Vec<String> {
        let Ok(anchors) = Selector::parse("a[href]") else {
            return Vec::new();
        };
        let mut seen = HashSet::new();
        let mut links = Vec::new();
        for anchor in document.select(&anchors) {
            if links.len() >= self.max_links {
                break;
            }
            let Some(href) = anchor.value().attr("href") else {
                continue;
            };
            let Some(url) = resolve_href(href, page_url) else {
                continue;
            };
            if seen.insert(url.clone()) {
                links.push(url);
            }
        }
        links
    }
}

impl Default for PageAgent {
    fn default() -> Self {
        Self::new()
    }
}

/// Lowercased content of every `<meta name="robots">`, joined.
fn robots_directives(document: &Html) -> String {
    let Ok(metas) = Selector::parse("meta[name][content]") else {
        return String::new();
    };
    document
        .select(&metas)
        .filter(|meta| {
            meta.value()
                .attr("name")
                .is_some_and(|name| name.trim().eq_ignore_ascii_case("robots"))
        })
        .filter_map(|meta| meta.value().attr("content"))
        .map(str::to_ascii_lowercase)
        .collect::<Vec<_>>()
        .join(",")
}

fn resolve_href(href: &str, page_url: &Url) -> Option<String> {
    let trimmed = href.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return None;
    }
    if trimmed
        .get(..11)
        .is_some_and(|scheme| scheme.eq_ignore_ascii_case("javascript:"))
    {
        return None;
    }
    page_url.join(trimmed).ok().map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn page() -> Url {
        Url::parse("https://x.test/docs/index.html").unwrap()
    }

    #[test]
    fn resolves_and_dedups_in_document_order() {
        let html = r##"
            <a href="guide">Guide</a>
            <a href="/about">About</a>
            <a href="https://x.test/docs/guide">Again</a>
            <a href="#top">Top</a>
            <a href="">Empty</a>
            <a href="JavaScript:void(0)">Noop</a>
            <a href="../blog/?p=1#c">Blog</a>
            <a name="anchor">no href</a>
        "##;
        let report = PageAgent::new().scan(html, &page());

        assert_eq!(report.origin, "https://x.test/docs/index.html");
        assert_eq!(report.exclude_self, None);
        assert_eq!(
            report.links,
            vec![
                "https://x.test/docs/guide",
                "https://x.test/about",
                "https://x.test/blog/?p=1#c",
            ]
        );
    }

    #[test]
    fn noindex_excludes_self_but_keeps_links() {
        let html = r#"<html><head><meta name="Robots" content="NOINDEX, follow"></head>
            <body><a href="/next">n</a></body></html>"#;
        let report = PageAgent::new().scan(html, &page());

        assert_eq!(
            report.exclude_self.as_deref(),
            Some("https://x.test/docs/index.html")
        );
        assert_eq!(report.links, vec!["https://x.test/next"]);
    }

    #[test]
    fn nofollow_suppresses_links() {
        let html = r#"<meta name="robots" content="nofollow"><a href="/next">n</a>"#;
        let report = PageAgent::new().scan(html, &page());

        assert_eq!(report.exclude_self, None);
        assert!(report.links.is_empty());
    }

    #[test]
    fn other_meta_names_are_ignored() {
        let html = r#"<meta name="googlebot" content="noindex,nofollow"><a href="/next">n</a>"#;
        let report = PageAgent::new().scan(html, &page());

        assert_eq!(report.exclude_self, None);
        assert_eq!(report.links.len(), 1);
    }

    #[test]
    fn link_count_is_capped() {
        let html: String = (0..10).map(|i| format!("<a href=\"/p{i}\">{i}</a>")).collect();
        let report = PageAgent::with_max_links(3).scan(&html, &page());

        assert_eq!(
            report.links,
            vec!["https://x.test/p0", "https://x.test/p1", "https://x.test/p2"]
        );
    }
}
