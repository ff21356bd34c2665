//! Session-scoped record of URLs that have already been claimed for scraping.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Set of visited URLs shared by every sub-query of one research session.
///
/// Cloning yields another handle onto the same set, so a parent task can hand
/// its tracker to subtopic tasks and no page is fetched twice. The set only
/// grows.
#[derive(Debug, Clone, Default)]
pub struct VisitedUrls {
    inner: Arc<Mutex<HashSet<String>>>,
}

impl VisitedUrls {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the candidates not seen before and mark them visited.
    ///
    /// The check and the insert happen under one lock, so two concurrent
    /// callers can never both claim the same URL. Duplicates within
    /// `candidates` are returned once, in first-seen order.
    pub fn filter_new<I, S>(&self, candidates: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut visited = self.lock();
        candidates
            .into_iter()
            .map(Into::into)
            .filter(|url| visited.insert(url.clone()))
            .collect()
    }

    /// Whether `url` has already been claimed.
    pub fn contains(&self, url: &str) -> bool {
        self.lock().contains(url)
    }

    /// Number of claimed URLs.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether nothing has been claimed yet.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// A sorted copy of the claimed URLs.
    pub fn snapshot(&self) -> Vec<String> {
        let mut urls: Vec<String> = self.lock().iter().cloned().collect();
        urls.sort();
        urls
    }

    // A poisoned set is still a valid set: inserts are single operations.
    fn lock(&self) -> MutexGuard<'_, HashSet<String>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_batch_is_all_new() {
        let tracker = VisitedUrls::new();
        let new = tracker.filter_new(["https://a.com", "https://b.com"]);
        assert_eq!(new, vec!["https://a.com", "https://b.com"]);
        assert_eq!(tracker.len(), 2);
    }

    #[test]
    fn returns_set_difference_and_grows_to_union() {
        let tracker = VisitedUrls::new();
        tracker.filter_new(["https://a.com", "https://b.com"]);

        let new = tracker.filter_new(["https://b.com", "https://c.com", "https://a.com"]);
        assert_eq!(new, vec!["https://c.com"]);
        assert_eq!(
            tracker.snapshot(),
            vec!["https://a.com", "https://b.com", "https://c.com"]
        );
    }

    #[test]
    fn duplicates_within_batch_returned_once() {
        let tracker = VisitedUrls::new();
        let new = tracker.filter_new(["https://a.com", "https://a.com", "https://b.com"]);
        assert_eq!(new, vec!["https://a.com", "https://b.com"]);
    }

    #[test]
    fn empty_batch_changes_nothing() {
        let tracker = VisitedUrls::new();
        let new = tracker.filter_new(Vec::<String>::new());
        assert!(new.is_empty());
        assert!(tracker.is_empty());
    }

    #[test]
    fn clones_share_state() {
        let parent = VisitedUrls::new();
        let subtopic = parent.clone();
        parent.filter_new(["https://a.com"]);
        assert!(subtopic.contains("https://a.com"));
        assert!(subtopic.filter_new(["https://a.com"]).is_empty());
    }

    #[test]
    fn membership_is_monotonic() {
        let tracker = VisitedUrls::new();
        let mut previous = 0;
        for batch in [vec!["a", "b"], vec!["b"], vec!["c", "a"], vec![]] {
            tracker.filter_new(batch);
            assert!(tracker.len() >= previous);
            previous = tracker.len();
        }
        assert_eq!(previous, 3);
    }

    #[test]
    fn concurrent_claims_are_exclusive() {
        let tracker = VisitedUrls::new();
        let urls: Vec<String> = (0..200).map(|i| format!("https://site{i}.com")).collect();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let tracker = tracker.clone();
                let urls = urls.clone();
                std::thread::spawn(move || tracker.filter_new(urls))
            })
            .collect();

        let mut claimed: Vec<String> = Vec::new();
        for handle in handles {
            claimed.extend(handle.join().expect("thread should not panic"));
        }
        claimed.sort();
        let mut expected = urls;
        expected.sort();
        assert_eq!(claimed, expected, "each URL claimed exactly once");
    }
}
