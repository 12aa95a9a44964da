//! In-memory rate-limit counters.
//!
//! Backed by `DashMap`, so the check-and-increment for one client address
//! happens under that shard's entry lock and concurrent bursts from the same
//! address cannot undercount.

use crate::domain::ports::CounterStore;
use dashmap::DashMap;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy)]
struct Window {
    count: u32,
    resets_at: Instant,
}

#[derive(Debug, Default)]
pub struct InMemoryCounterStore {
    windows: DashMap<String, Window>,
}

impl InMemoryCounterStore {
    pub fn new() -> Self {
        Self {
            windows: DashMap::new(),
        }
    }
}

impl CounterStore for InMemoryCounterStore {
    fn hit(&self, key: &str, now: Instant, window: Duration) -> (u32, Instant) {
        let mut entry = self.windows.entry(key.to_string()).or_insert(Window {
            count: 0,
            resets_at: now + window,
        });

        if now >= entry.resets_at {
            entry.count = 0;
            entry.resets_at = now + window;
        }
        entry.count = entry.count.saturating_add(1);

        (entry.count, entry.resets_at)
    }

    fn purge_expired(&self, now: Instant) -> usize {
        let before = self.windows.len();
        self.windows.retain(|_, window| window.resets_at > now);
        before.saturating_sub(self.windows.len())
    }

    fn len(&self) -> usize {
        self.windows.len()
    }
}
