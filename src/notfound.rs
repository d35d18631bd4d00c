//! Bounded counter of requested paths that did not resolve.

use std::num::NonZeroUsize;
use std::time::{SystemTime, UNIX_EPOCH};

use lru::LruCache;
use parking_lot::Mutex;
use serde::Serialize;

use crate::core::UrlPath;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotFoundEntry {
    pub path: UrlPath,
    pub hits: u64,
    /// Unix seconds.
    pub first_seen: u64,
    pub last_seen: u64,
}

/// 404 counter shared by request handlers.
///
/// Holds at most `capacity` paths; recording a new path when full evicts
/// the least recently seen one.
pub struct NotFoundLog {
    entries: Mutex<LruCache<UrlPath, NotFoundEntry>>,
}

impl NotFoundLog {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub fn record(&self, path: &str) {
        self.record_at(path, unix_now());
    }

    fn record_at(&self, path: &str, now: u64) {
        let path = UrlPath::from_browser(path);
        let mut entries = self.entries.lock();
        if let Some(entry) = entries.get_mut(&path) {
            entry.hits += 1;
            entry.last_seen = now;
            return;
        }
        entries.put(
            path.clone(),
            NotFoundEntry {
                path,
                hits: 1,
                first_seen: now,
                last_seen: now,
            },
        );
    }

    /// The `n` most hit paths, most recent first on ties.
    pub fn top(&self, n: usize) -> Vec<NotFoundEntry> {
        let mut all: Vec<_> = self.entries.lock().iter().map(|(_, e)| e.clone()).collect();
        all.sort_by(|a, b| {
            b.hits
                .cmp(&a.hits)
                .then(b.last_seen.cmp(&a.last_seen))
                .then_with(|| a.path.cmp(&b.path))
        });
        all.truncate(n);
        all
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn log(capacity: usize) -> NotFoundLog {
        NotFoundLog::new(NonZeroUsize::new(capacity).unwrap())
    }

    #[test]
    fn test_counts_normalized_paths() {
        let log = log(10);
        log.record_at("/missing", 100);
        log.record_at("/missing/", 105);
        log.record_at("/missing?x=1", 110);
        log.record_at("/caf%C3%A9", 120);

        assert_eq!(log.len(), 2);
        let top = log.top(10);
        assert_eq!(top[0].path, "/missing");
        assert_eq!(top[0].hits, 3);
        assert_eq!(top[0].first_seen, 100);
        assert_eq!(top[0].last_seen, 110);
        assert_eq!(top[1].path, "/café");
    }

    #[test]
    fn test_capacity_evicts_least_recently_seen() {
        let log = log(2);
        log.record_at("/a", 1);
        log.record_at("/b", 2);
        log.record_at("/a", 3);
        log.record_at("/c", 4);

        assert_eq!(log.len(), 2);
        let paths: Vec<_> = log.top(10).into_iter().map(|e| e.path.to_string()).collect();
        assert_eq!(paths, ["/a", "/c"]);

        for i in 0..50 {
            log.record(&format!("/p{i}"));
            assert!(log.len() <= 2);
        }
    }

    #[test]
    fn test_top_orders_and_truncates() {
        let log = log(10);
        log.record_at("/x", 1);
        log.record_at("/y", 2);
        log.record_at("/y", 3);
        log.record_at("/z", 4);

        let top = log.top(2);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].path, "/y");
        assert_eq!(top[1].path, "/z");
    }

    #[test]
    fn test_clear() {
        let log = log(4);
        log.record("/x");
        assert!(!log.is_empty());
        log.clear();
        assert!(log.is_empty());
    }

    #[test]
    fn test_entry_json() {
        let log = log(4);
        log.record_at("/x", 7);
        let json = serde_json::to_value(&log.top(1)[0]).unwrap();
        assert_eq!(json["path"], "/x");
        assert_eq!(json["firstSeen"], 7);
    }
}
