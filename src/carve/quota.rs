//! Offset-claim set and per-type quota counters (spec.md §4.7 step 5, §5).

use std::collections::HashMap;
use std::collections::HashSet;
use std::sync::Mutex;

/// Guarantees at-most-one extraction attempt per dump offset, shared across
/// the parallel extraction stage.
#[derive(Default)]
pub struct ClaimSet {
    claimed: Mutex<HashSet<u64>>,
}

impl ClaimSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attempts to claim `offset`; returns `true` if this call was the
    /// first to claim it.
    pub fn try_claim(&self, offset: u64) -> bool {
        self.claimed.lock().expect("claim set mutex poisoned").insert(offset)
    }
}

/// Per-signature-id extraction quota counters (spec.md §4.7: default 10000,
/// configurable via [`crate::config::CarveOptions::max_files_per_type`]).
///
/// Guarded by a single mutex rather than a lock-free per-key atomic: quota
/// checks are not the bottleneck (LZX decode and I/O dominate per spec.md
/// §5), so a plain `Mutex<HashMap<_, usize>>` keeps this free of `unsafe`.
pub struct QuotaTracker {
    counters: Mutex<HashMap<String, usize>>,
    max_per_type: usize,
}

impl QuotaTracker {
    pub fn new(max_per_type: usize) -> Self {
        Self {
            counters: Mutex::new(HashMap::new()),
            max_per_type,
        }
    }

    /// Attempts to reserve one slot under `sig_id`'s quota. Returns `true`
    /// if the reservation succeeded (the caller may proceed); on failure the
    /// counter is left unchanged.
    pub fn try_reserve(&self, sig_id: &str) -> bool {
        let mut counters = self.counters.lock().expect("quota mutex poisoned");
        let count = counters.entry(sig_id.to_string()).or_insert(0);
        if *count >= self.max_per_type {
            return false;
        }
        *count += 1;
        true
    }

    /// Releases a previously reserved slot (spec.md §7: `WriteFailure`
    /// decrements the per-type counter so quotas stay accurate).
    pub fn release(&self, sig_id: &str) {
        let mut counters = self.counters.lock().expect("quota mutex poisoned");
        if let Some(count) = counters.get_mut(sig_id) {
            *count = count.saturating_sub(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claim_set_at_most_once() {
        let claims = ClaimSet::new();
        assert!(claims.try_claim(100));
        assert!(!claims.try_claim(100));
        assert!(claims.try_claim(200));
    }

    #[test]
    fn test_quota_reserve_and_release() {
        let tracker = QuotaTracker::new(2);
        assert!(tracker.try_reserve("dds"));
        assert!(tracker.try_reserve("dds"));
        assert!(!tracker.try_reserve("dds"));
        tracker.release("dds");
        assert!(tracker.try_reserve("dds"));
    }

    #[test]
    fn test_quota_independent_per_type() {
        let tracker = QuotaTracker::new(1);
        assert!(tracker.try_reserve("dds"));
        assert!(tracker.try_reserve("png"));
    }
}
