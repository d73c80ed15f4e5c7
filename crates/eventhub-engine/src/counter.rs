use std::sync::atomic::{AtomicU64, Ordering};

use eventhub_types::SequenceNumber;

/// Dispenses strictly increasing [`SequenceNumber`]s (C1).
///
/// Backed by a single `AtomicU64`; `next()` is lock-free and safe to call
/// from any number of concurrent callers. The first call returns `1` -
/// `SequenceNumber::ZERO` is never dispensed, it exists only as the
/// "before any event" sentinel.
#[derive(Debug, Default)]
pub struct AtomicCounter {
    value: AtomicU64,
}

impl AtomicCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the next sequence number, in dispatch order.
    pub fn next(&self) -> SequenceNumber {
        SequenceNumber::new(self.value.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// The most recently dispensed value, or `ZERO` if `next()` has never
    /// been called. Used for diagnostics, never for assigning sequence
    /// numbers.
    pub fn current(&self) -> SequenceNumber {
        SequenceNumber::new(self.value.load(Ordering::SeqCst))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_starts_at_one_and_is_strictly_increasing() {
        let counter = AtomicCounter::new();
        let a = counter.next();
        let b = counter.next();
        let c = counter.next();

        assert_eq!(a, SequenceNumber::new(1));
        assert_eq!(b, SequenceNumber::new(2));
        assert_eq!(c, SequenceNumber::new(3));
        assert!(a < b && b < c);
    }

    #[test]
    fn current_reflects_last_dispensed_value() {
        let counter = AtomicCounter::new();
        assert_eq!(counter.current(), SequenceNumber::ZERO);
        counter.next();
        counter.next();
        assert_eq!(counter.current(), SequenceNumber::new(2));
    }

    #[test]
    fn concurrent_callers_never_observe_a_duplicate() {
        use std::sync::Arc;
        use std::thread;

        let counter = Arc::new(AtomicCounter::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let counter = Arc::clone(&counter);
                thread::spawn(move || (0..100).map(|_| counter.next().get()).collect::<Vec<_>>())
            })
            .collect();

        let mut all: Vec<u64> = handles.into_iter().flat_map(|h| h.join().unwrap()).collect();
        all.sort_unstable();
        let mut deduped = all.clone();
        deduped.dedup();
        assert_eq!(all.len(), deduped.len());
        assert_eq!(all.len(), 800);
    }
}
