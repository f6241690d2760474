// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Suppression of repeated deliveries on the stdin ingest path.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use tokio::time::Instant;

/// How long a message id is remembered after its first delivery.
pub const DEDUP_WINDOW: Duration = Duration::from_secs(30);

/// Message ids seen within a sliding window. In memory only.
#[derive(Debug)]
pub struct RecentIds {
    window: Duration,
    seen: HashMap<String, Instant>,
    order: VecDeque<(Instant, String)>,
}

impl RecentIds {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            seen: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    /// Records `id` at `now`. Returns false if it was already seen inside the window.
    pub fn insert(&mut self, id: &str, now: Instant) -> bool {
        self.evict(now);
        if self.seen.contains_key(id) {
            return false;
        }
        self.seen.insert(id.to_string(), now);
        self.order.push_back((now, id.to_string()));
        true
    }

    fn evict(&mut self, now: Instant) {
        while let Some((at, id)) = self.order.pop_front() {
            if now.saturating_duration_since(at) < self.window {
                self.order.push_front((at, id));
                break;
            }
            self.seen.remove(&id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeat_inside_window_is_suppressed() {
        let mut recent = RecentIds::new(DEDUP_WINDOW);
        let t0 = Instant::now();
        assert!(recent.insert("m-1", t0));
        assert!(!recent.insert("m-1", t0 + Duration::from_secs(29)));
        assert!(recent.insert("m-2", t0 + Duration::from_secs(29)));
    }

    #[test]
    fn ids_expire_after_window() {
        let mut recent = RecentIds::new(DEDUP_WINDOW);
        let t0 = Instant::now();
        recent.insert("m-1", t0);
        recent.insert("m-2", t0 + Duration::from_secs(10));

        assert!(recent.insert("m-1", t0 + Duration::from_secs(30)));
        assert!(!recent.insert("m-2", t0 + Duration::from_secs(35)));

        // m-2 expires at 40s; m-1 was re-seen at 30s.
        assert!(recent.insert("m-2", t0 + Duration::from_secs(45)));
        assert!(!recent.insert("m-1", t0 + Duration::from_secs(50)));
        assert_eq!(recent.seen.len(), 2);
    }
}
