use eventhub_types::{EventData, SequenceNumber, SharedStateEntry, SharedStateResult, SharedStateStatus};

/// Per-extension ordered map from version to `{SET, PENDING}` (§3, §4.3).
///
/// Entries are kept sorted by `version` (strictly increasing, enforced by
/// `add_pending`/`set`) so `resolve` can binary-search. Mutation is
/// `&mut self` and is expected to be serialized upstream by the owning
/// extension's single worker (§4.3 "Concurrency"); reads (`resolve`,
/// `latest`) are `&self` and safe to call from any thread once a snapshot
/// of the timeline is visible to the caller.
#[derive(Clone, Debug, Default)]
pub struct SharedStateTimeline {
    entries: Vec<SharedStateEntry>,
}

impl SharedStateTimeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a `PENDING` entry at `version`.
    ///
    /// Precondition: `version` strictly greater than any existing version;
    /// otherwise this is a no-op and a warning is logged (§4.3).
    pub fn add_pending(&mut self, version: SequenceNumber) {
        if !self.accepts(version) {
            tracing::warn!(
                ?version,
                last = ?self.entries.last().map(|e| e.version),
                "addPending: version is not strictly increasing, ignoring"
            );
            return;
        }
        self.entries.push(SharedStateEntry {
            version,
            status: SharedStateStatus::Pending,
        });
    }

    /// Write `SET(data)` at `version`.
    ///
    /// If a `PENDING` entry already exists at `version`, it is replaced.
    /// Otherwise this appends, subject to the same monotonicity rule as
    /// `add_pending`.
    pub fn set(&mut self, version: SequenceNumber, data: EventData) {
        if let Some(entry) = self.entries.last_mut().filter(|e| e.version == version) {
            entry.status = SharedStateStatus::Set(data);
            return;
        }
        if let Some(entry) = self.entries.iter_mut().find(|e| e.version == version) {
            entry.status = SharedStateStatus::Set(data);
            return;
        }
        if !self.accepts(version) {
            tracing::warn!(
                ?version,
                last = ?self.entries.last().map(|e| e.version),
                "set: version is not strictly increasing, ignoring"
            );
            return;
        }
        self.entries.push(SharedStateEntry {
            version,
            status: SharedStateStatus::Set(data),
        });
    }

    /// Replace the `PENDING` entry at `version` with `SET(data)`.
    ///
    /// No-op if no entry exists at `version` (the resolver fired after the
    /// entry was somehow lost, or was never created).
    pub fn update_pending(&mut self, version: SequenceNumber, data: EventData) {
        match self.entries.iter_mut().find(|e| e.version == version) {
            Some(entry) => entry.status = SharedStateStatus::Set(data),
            None => {
                tracing::warn!(?version, "updatePending: no entry at version, ignoring");
            }
        }
    }

    /// Resolve `v` to the entry with the greatest version `<= v`, or `None`
    /// if no such entry exists (§3).
    pub fn resolve(&self, v: SequenceNumber) -> SharedStateResult {
        let idx = self.entries.partition_point(|e| e.version <= v);
        match idx.checked_sub(1).and_then(|i| self.entries.get(i)) {
            Some(entry) => match &entry.status {
                SharedStateStatus::Set(data) => SharedStateResult::Set {
                    version: entry.version,
                    data: data.clone(),
                },
                SharedStateStatus::Pending => SharedStateResult::Pending {
                    version: entry.version,
                    data: None,
                },
            },
            None => SharedStateResult::None,
        }
    }

    /// The newest entry, if any. O(1) accessor used by hub-state
    /// re-publication to tell "timeline is empty" apart from "has history"
    /// without re-deriving it through `resolve`.
    pub fn latest(&self) -> Option<&SharedStateEntry> {
        self.entries.last()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn accepts(&self, version: SequenceNumber) -> bool {
        self.entries.last().is_none_or(|e| version > e.version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Map};

    fn data(k: &str, v: &str) -> EventData {
        let mut m = Map::new();
        m.insert(k.to_string(), json!(v));
        m
    }

    #[test]
    fn resolve_returns_none_for_empty_timeline() {
        let timeline = SharedStateTimeline::new();
        assert_eq!(timeline.resolve(SequenceNumber::new(5)), SharedStateResult::None);
    }

    #[test_log::test]
    fn resolve_returns_greatest_version_leq_v() {
        let mut timeline = SharedStateTimeline::new();
        timeline.set(SequenceNumber::new(2), data("k", "a"));
        timeline.set(SequenceNumber::new(5), data("k", "b"));

        assert_eq!(timeline.resolve(SequenceNumber::new(1)), SharedStateResult::None);
        assert_eq!(
            timeline.resolve(SequenceNumber::new(3)),
            SharedStateResult::Set {
                version: SequenceNumber::new(2),
                data: data("k", "a"),
            }
        );
        assert_eq!(
            timeline.resolve(SequenceNumber::new(5)),
            SharedStateResult::Set {
                version: SequenceNumber::new(5),
                data: data("k", "b"),
            }
        );
        assert_eq!(
            timeline.resolve(SequenceNumber::new(100)),
            SharedStateResult::Set {
                version: SequenceNumber::new(5),
                data: data("k", "b"),
            }
        );
    }

    #[test]
    fn add_pending_then_set_replaces_in_place() {
        let mut timeline = SharedStateTimeline::new();
        timeline.add_pending(SequenceNumber::new(3));
        assert_eq!(
            timeline.resolve(SequenceNumber::new(3)),
            SharedStateResult::Pending {
                version: SequenceNumber::new(3),
                data: None
            }
        );

        timeline.update_pending(SequenceNumber::new(3), data("k", "v"));
        assert_eq!(
            timeline.resolve(SequenceNumber::new(3)),
            SharedStateResult::Set {
                version: SequenceNumber::new(3),
                data: data("k", "v"),
            }
        );
    }

    #[test]
    fn non_monotonic_add_pending_is_a_no_op() {
        let mut timeline = SharedStateTimeline::new();
        timeline.set(SequenceNumber::new(5), data("k", "a"));
        timeline.add_pending(SequenceNumber::new(5));
        timeline.add_pending(SequenceNumber::new(3));

        assert_eq!(
            timeline.latest().map(|e| e.version),
            Some(SequenceNumber::new(5))
        );
    }

    #[test]
    fn update_pending_missing_entry_is_a_no_op() {
        let mut timeline = SharedStateTimeline::new();
        timeline.update_pending(SequenceNumber::new(7), data("k", "v"));
        assert!(timeline.is_empty());
    }

    #[test]
    fn timeline_never_shrinks_across_mutations() {
        let mut timeline = SharedStateTimeline::new();
        timeline.add_pending(SequenceNumber::new(1));
        timeline.set(SequenceNumber::new(2), data("k", "a"));
        timeline.add_pending(SequenceNumber::new(3));
        timeline.update_pending(SequenceNumber::new(3), data("k", "b"));

        assert_eq!(timeline.entries.len(), 3);
    }
}
