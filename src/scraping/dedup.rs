//! URL deduplication against the record table
//!
//! Two URLs are the same link when their normalized forms (see
//! [`normalize_url`](super::normalize_url)) are equal. With no parameters to
//! strip, comparison is plain string equality and the normalizer is never
//! invoked.

use std::collections::HashSet;

use super::{is_valid_url, normalize_url};

/// Set of already-known links, keyed by normalized form
pub struct UrlDeduplicator {
    /// Normalized forms seen so far
    seen: HashSet<String>,
    /// Query parameters stripped before comparison
    params_to_remove: Vec<String>,
}

impl UrlDeduplicator {
    /// Create an empty deduplicator
    pub fn new(params_to_remove: &[String]) -> Self {
        Self {
            seen: HashSet::new(),
            params_to_remove: params_to_remove.to_vec(),
        }
    }

    /// Create a deduplicator that already knows `existing`
    pub fn with_existing<'a, I>(existing: I, params_to_remove: &[String]) -> Self
    where
        I: IntoIterator<Item = &'a String>,
    {
        let mut dedup = Self::new(params_to_remove);
        for url in existing {
            let key = dedup.key(url);
            dedup.seen.insert(key);
        }
        dedup
    }

    /// Check if a URL is new, remembering it if so
    pub fn is_new_url(&mut self, url: &str) -> bool {
        let key = self.key(url);
        self.seen.insert(key)
    }

    /// Get the number of distinct links known
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    fn key(&self, url: &str) -> String {
        if self.params_to_remove.is_empty() {
            url.to_string()
        } else {
            normalize_url(url, &self.params_to_remove)
        }
    }
}

/// Return the candidates that are not already known, in input order.
///
/// A candidate is dropped when its normalized form matches an existing URL or
/// an earlier candidate of the same batch. Candidates that are not valid web
/// URLs are always kept; filtering them out is the caller's job.
pub fn filter_new(
    candidates: &[String],
    existing: &HashSet<String>,
    params_to_remove: &[String],
) -> Vec<String> {
    if params_to_remove.is_empty() {
        return filter_exact(candidates, existing);
    }

    let mut dedup = UrlDeduplicator::with_existing(existing, params_to_remove);
    candidates
        .iter()
        .filter(|url| !is_valid_url(url) || dedup.is_new_url(url))
        .cloned()
        .collect()
}

/// Plain string-set membership, used when no parameters are configured
fn filter_exact(candidates: &[String], existing: &HashSet<String>) -> Vec<String> {
    let mut accepted: HashSet<&str> = HashSet::new();
    candidates
        .iter()
        .filter(|url| {
            !is_valid_url(url) || (!existing.contains(url.as_str()) && accepted.insert(url.as_str()))
        })
        .cloned()
        .collect()
}
