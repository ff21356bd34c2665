//! Merging search results from several retrievers.
//!
//! Retrievers are consulted in priority order. A [`ResultMerger`] keeps the
//! first occurrence of every page (compared by [`canonical_url`]) and stops
//! accepting results once the per-query limit is reached, so earlier
//! retrievers keep their positions and later ones only fill the gaps.

use std::collections::HashSet;

use url::Url;

use crate::types::SearchResult;

/// Query parameters that never change which page is served.
const TRACKING_PARAMS: &[&str] = &[
    "utm_source",
    "utm_medium",
    "utm_campaign",
    "utm_term",
    "utm_content",
    "fbclid",
    "gclid",
    "mc_cid",
    "mc_eid",
    "ref",
    "ref_src",
];

/// Canonical comparison key for a URL.
///
/// Lowercases scheme and host, drops a leading `www.`, the default port,
/// the fragment, tracking parameters and a trailing path slash, and sorts
/// the remaining query parameters. Unparseable input is returned trimmed.
///
/// # Examples
///
/// ```
/// use scout_search::merge::canonical_url;
///
/// let a = canonical_url("https://WWW.Example.com/docs/?b=2&a=1&utm_source=x#intro");
/// let b = canonical_url("https://example.com/docs?a=1&b=2");
/// assert_eq!(a, b);
/// ```
pub fn canonical_url(raw: &str) -> String {
    let raw = raw.trim();
    let Ok(mut parsed) = Url::parse(raw) else {
        return raw.to_owned();
    };

    parsed.set_fragment(None);

    if let Some(host) = parsed.host_str().map(str::to_owned) {
        if let Some(bare) = host.strip_prefix("www.") {
            let _ = parsed.set_host(Some(bare));
        }
    }

    if matches!(
        (parsed.scheme(), parsed.port()),
        ("http", Some(80)) | ("https", Some(443))
    ) {
        let _ = parsed.set_port(None);
    }

    let mut params: Vec<(String, String)> = parsed
        .query_pairs()
        .filter(|(key, _)| !TRACKING_PARAMS.contains(&key.to_lowercase().as_str()))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    params.sort();
    if params.is_empty() {
        parsed.set_query(None);
    } else {
        parsed.query_pairs_mut().clear().extend_pairs(params);
    }

    let path = parsed.path().to_owned();
    if path.len() > 1 && path.ends_with('/') {
        parsed.set_path(path.trim_end_matches('/'));
    }

    parsed.to_string()
}

/// Accumulates results across retrievers up to a limit.
#[derive(Debug)]
pub struct ResultMerger {
    limit: usize,
    seen: HashSet<String>,
    results: Vec<SearchResult>,
}

impl ResultMerger {
    /// Create a merger that keeps at most `limit` results.
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            seen: HashSet::new(),
            results: Vec::with_capacity(limit),
        }
    }

    /// Append the unseen results from `batch`, in order, until full.
    ///
    /// Returns how many results were accepted. Results with an empty
    /// `href` are ignored.
    pub fn absorb(&mut self, batch: Vec<SearchResult>) -> usize {
        let mut accepted = 0;
        for result in batch {
            if self.is_full() {
                break;
            }
            if result.href.trim().is_empty() {
                continue;
            }
            if self.seen.insert(canonical_url(&result.href)) {
                self.results.push(result);
                accepted += 1;
            }
        }
        accepted
    }

    /// Whether the limit has been reached.
    pub fn is_full(&self) -> bool {
        self.results.len() >= self.limit
    }

    /// Number of results collected so far.
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Whether nothing has been collected.
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// The merged results in acceptance order.
    pub fn into_results(self) -> Vec<SearchResult> {
        self.results
    }
}
