use std::collections::{BTreeSet, HashSet, VecDeque};

/// FIFO queue of URLs awaiting dispatch. Insertion order is preserved and a URL
/// can be pending at most once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Frontier {
    queue: VecDeque<String>,
    pending: HashSet<String>,
}

impl Frontier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `url`; returns false if it is already pending.
    pub fn push(&mut self, url: String) -> bool {
        if !self.pending.insert(url.clone()) {
            return false;
        }
        self.queue.push_back(url);
        true
    }

    pub fn pop(&mut self) -> Option<String> {
        let url = self.queue.pop_front()?;
        self.pending.remove(&url);
        Some(url)
    }

    pub fn contains(&self, url: &str) -> bool {
        self.pending.contains(url)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.queue.iter().map(String::as_str)
    }
}

/// Dispositions of every URL the session has touched.
///
/// `handled` holds URLs that were dispatched or otherwise terminally decided;
/// nothing ever leaves it. `success` and `error` are kept disjoint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ledger {
    handled: HashSet<String>,
    success: BTreeSet<String>,
    error: BTreeSet<String>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false if the URL was already handled.
    pub fn mark_handled(&mut self, url: &str) -> bool {
        self.handled.insert(url.to_string())
    }

    pub fn is_handled(&self, url: &str) -> bool {
        self.handled.contains(url)
    }

    /// Records a successful outcome unless the URL already failed.
    pub fn record_success(&mut self, url: &str) -> bool {
        if self.error.contains(url) {
            return false;
        }
        self.success.insert(url.to_string())
    }

    /// Records a failed outcome unless the URL already succeeded.
    pub fn record_error(&mut self, url: &str) -> bool {
        if self.success.contains(url) {
            return false;
        }
        self.error.insert(url.to_string())
    }

    /// Drops `url` from the success set and pins it as handled so it is never
    /// dispatched. Returns true if a success entry was removed.
    pub fn exclude(&mut self, url: &str) -> bool {
        self.handled.insert(url.to_string());
        self.success.remove(url)
    }

    pub fn is_success(&self, url: &str) -> bool {
        self.success.contains(url)
    }

    pub fn is_error(&self, url: &str) -> bool {
        self.error.contains(url)
    }

    pub fn handled_count(&self) -> usize {
        self.handled.len()
    }

    /// Success URLs in lexicographic order.
    pub fn success(&self) -> impl Iterator<Item = &str> {
        self.success.iter().map(String::as_str)
    }

    /// Error URLs in lexicographic order.
    pub fn errors(&self) -> impl Iterator<Item = &str> {
        self.error.iter().map(String::as_str)
    }

    pub fn success_count(&self) -> usize {
        self.success.len()
    }

    pub fn error_count(&self) -> usize {
        self.error.len()
    }
}
