//! URL normalization and admission rules for discovered links.
use url::Url;

use crate::{CrawlConfig, Frontier, Ledger};

/// A discovered URL after percent-encoding and fragment handling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Canonical {
    pub url: Url,
    /// Pre-fragment page URL when the fragment is a hash-bang route (`#!`).
    pub hashbang_page: Option<String>,
}

impl Canonical {
    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    /// New in-scope URL; append it to the frontier.
    Enqueue(String),
    /// Hash-bang route whose page already succeeded; record it as success without fetching.
    MirrorSuccess(String),
    /// Hash-bang route whose page already failed; record it as error without fetching.
    MirrorError(String),
    Rejected(Rejection),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    Malformed,
    ExcludedExtension,
    OutOfScope,
    Duplicate,
}

/// Resolves `raw` against `origin`, percent-encodes it and handles the fragment.
///
/// Serialization goes through [`Url`], so an already-encoded URL comes back
/// unchanged. Plain fragments are removed; hash-bang fragments are kept and the
/// pre-fragment page is reported alongside.
pub fn canonicalize(raw: &str, origin: Option<&Url>) -> Option<Canonical> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let mut url = match origin {
        Some(base) => base.join(trimmed).ok()?,
        None => Url::parse(trimmed).ok()?,
    };

    let hashbang = url.fragment().is_some_and(|fragment| fragment.starts_with('!'));
    if hashbang {
        let mut page = url.clone();
        page.set_fragment(None);
        return Some(Canonical {
            url,
            hashbang_page: Some(page.into()),
        });
    }

    url.set_fragment(None);
    Some(Canonical {
        url,
        hashbang_page: None,
    })
}

/// Decides what happens to one discovered URL.
pub fn admit(
    raw: &str,
    origin: Option<&Url>,
    config: &CrawlConfig,
    ledger: &Ledger,
    frontier: &Frontier,
) -> Admission {
    let Some(canonical) = canonicalize(raw, origin) else {
        return Admission::Rejected(Rejection::Malformed);
    };
    let url = canonical.as_str();

    if has_excluded_extension(&canonical, &config.excluded_extensions) {
        return Admission::Rejected(Rejection::ExcludedExtension);
    }

    if let Some(page) = canonical.hashbang_page.as_deref() {
        if !ledger.is_handled(url) && url.starts_with(config.base_url()) {
            if ledger.is_success(page) {
                return Admission::MirrorSuccess(url.to_string());
            }
            if ledger.is_error(page) {
                return Admission::MirrorError(url.to_string());
            }
        }
    }

    if !url.starts_with(config.base_url()) {
        return Admission::Rejected(Rejection::OutOfScope);
    }
    if ledger.is_handled(url) || frontier.contains(url) {
        return Admission::Rejected(Rejection::Duplicate);
    }
    Admission::Enqueue(url.to_string())
}

/// Inspects the last segment of the resource the URL names: the route after
/// the final `/` for a hash-bang URL, the last path segment otherwise. An
/// entry matches when it occurs there past the first character, so `/a.png`
/// and `#!/img/a.png` are excluded while `/.png/page` and a bare `/.png` are not.
fn has_excluded_extension(canonical: &Canonical, excluded: &[String]) -> bool {
    let last = if canonical.hashbang_page.is_some() {
        let route = canonical.url.fragment().unwrap_or("");
        let route = route.split('?').next().unwrap_or(route);
        route.rsplit('/').next().unwrap_or(route)
    } else {
        match canonical
            .url
            .path_segments()
            .and_then(|mut segments| segments.next_back())
        {
            Some(segment) => segment,
            None => return false,
        }
    };
    if last.is_empty() {
        return false;
    }
    excluded
        .iter()
        .filter(|ext| !ext.is_empty())
        .any(|ext| last.find(ext.as_str()).is_some_and(|idx| idx > 0))
}
