//! Host reliability store.
//!
//! In-memory only: penalties reset with the process. Backed by a
//! `DashMap` so reads and writes from concurrent requests never contend on
//! a single global lock.

use dashmap::DashMap;

const STEP: i64 = 50;
const CEILING: i64 = 500;

/// Tracks a per-host penalty that rises on failure and decays on success.
pub struct ReliabilityStore {
    entries: DashMap<String, i64>,
}

impl ReliabilityStore {
    #[must_use]
    pub fn new() -> Self {
        Self { entries: DashMap::new() }
    }

    /// Current penalty for `host`, or 0 if never recorded.
    #[must_use]
    pub fn penalty(&self, host: &str) -> i64 {
        self.entries.get(host).map_or(0, |entry| *entry)
    }

    /// Record a failure: raises the penalty by `STEP`, capped at `CEILING`.
    pub fn on_fail(&self, host: &str) {
        let mut entry = self.entries.entry(host.to_string()).or_insert(0);
        *entry = (*entry + STEP).min(CEILING);
    }

    /// Record a success: lowers the penalty by `STEP`, floored at 0. A host
    /// with no existing entry (never failed) is left untracked rather than
    /// inserted at 0, so a clean host never shows up in `penalties()`.
    pub fn on_ok(&self, host: &str) {
        let decayed_to_zero = match self.entries.get_mut(host) {
            Some(mut entry) => {
                *entry = (*entry - STEP).max(0);
                *entry == 0
            }
            None => return,
        };
        if decayed_to_zero {
            self.entries.remove(host);
        }
    }

    /// Reset a single host's penalty.
    pub fn clear(&self, host: &str) {
        self.entries.remove(host);
    }

    /// Reset every host's penalty.
    pub fn clear_all(&self) {
        self.entries.clear();
    }

    /// Snapshot of every host currently carrying a nonzero penalty, for the
    /// `/reliability/penalties` operator endpoint.
    #[must_use]
    pub fn penalties(&self) -> Vec<(String, i64)> {
        self.entries.iter().filter(|e| *e.value() > 0).map(|e| (e.key().clone(), *e.value())).collect()
    }

    /// Whether any host currently carries a penalty, used to shrink
    /// `cacheMaxAge` on the orchestrator's response.
    #[must_use]
    pub fn has_any_penalty(&self) -> bool {
        self.entries.iter().any(|e| *e.value() > 0)
    }
}

impl Default for ReliabilityStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_host_has_zero_penalty() {
        let store = ReliabilityStore::new();
        assert_eq!(store.penalty("example.com"), 0);
    }

    #[test]
    fn on_fail_raises_penalty_by_step() {
        let store = ReliabilityStore::new();
        store.on_fail("bad.example");
        assert_eq!(store.penalty("bad.example"), 50);
    }

    #[test]
    fn penalty_caps_at_ceiling() {
        let store = ReliabilityStore::new();
        for _ in 0..20 {
            store.on_fail("bad.example");
        }
        assert_eq!(store.penalty("bad.example"), 500);
    }

    #[test]
    fn on_ok_decays_penalty_floored_at_zero() {
        let store = ReliabilityStore::new();
        store.on_fail("flaky.example");
        store.on_fail("flaky.example");
        store.on_ok("flaky.example");
        assert_eq!(store.penalty("flaky.example"), 50);
        store.on_ok("flaky.example");
        store.on_ok("flaky.example");
        assert_eq!(store.penalty("flaky.example"), 0);
    }

    #[test]
    fn clear_resets_single_host() {
        let store = ReliabilityStore::new();
        store.on_fail("a.example");
        store.on_fail("b.example");
        store.clear("a.example");
        assert_eq!(store.penalty("a.example"), 0);
        assert_eq!(store.penalty("b.example"), 50);
    }

    #[test]
    fn on_ok_on_a_never_failed_host_leaves_no_trace() {
        let store = ReliabilityStore::new();
        store.on_ok("clean.example");
        assert_eq!(store.penalty("clean.example"), 0);
        assert!(!store.has_any_penalty());
        assert!(store.penalties().is_empty());
    }

    #[test]
    fn on_ok_decaying_to_zero_removes_the_entry() {
        let store = ReliabilityStore::new();
        store.on_fail("flaky.example");
        store.on_ok("flaky.example");
        assert_eq!(store.penalty("flaky.example"), 0);
        assert!(!store.has_any_penalty());
        assert!(store.penalties().is_empty());
    }

    #[test]
    fn clear_all_resets_every_host() {
        let store = ReliabilityStore::new();
        store.on_fail("a.example");
        store.on_fail("b.example");
        store.clear_all();
        assert!(!store.has_any_penalty());
    }
}
