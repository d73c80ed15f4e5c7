use eventhub_types::{SequenceNumber, SharedStateResult};

/// Applies the causal-visibility barrier rule (§4.5.2) to a raw `resolve()`
/// result.
///
/// An extension that hasn't yet processed the event immediately preceding
/// the reader's reference version `v` cannot be assumed to have published
/// its state for `v`, even if its timeline already shows a `SET` entry at
/// or before `v` - that entry may describe a future the owner hasn't
/// caught up to from the reader's point of view. When `barrier` is `true`
/// and the owner's `last_processed` sequence is behind `v - 1`, a `Set`
/// result is downgraded to `Pending` so the reader doesn't act on data the
/// owner could still retract.
///
/// `barrier == false` (the `createSharedState` default) bypasses this rule
/// entirely and returns `raw` unchanged.
pub fn apply(raw: SharedStateResult, barrier: bool, last_processed: SequenceNumber, v: SequenceNumber) -> SharedStateResult {
    if !barrier {
        return raw;
    }
    if last_processed < v.saturating_pred() {
        raw.downgrade_to_pending()
    } else {
        raw
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Map};

    fn set(version: u64, data: &str) -> SharedStateResult {
        let mut map = Map::new();
        map.insert("k".to_string(), json!(data));
        SharedStateResult::Set {
            version: SequenceNumber::new(version),
            data: map,
        }
    }

    #[test]
    fn barrier_disabled_passes_result_through() {
        let raw = set(5, "v");
        assert_eq!(
            apply(raw.clone(), false, SequenceNumber::new(0), SequenceNumber::new(10)),
            raw
        );
    }

    #[test]
    fn barrier_enabled_downgrades_when_owner_is_behind() {
        let raw = set(5, "v");
        let result = apply(raw, true, SequenceNumber::new(2), SequenceNumber::new(10));
        similar_asserts::assert_eq!(
            result,
            SharedStateResult::Pending {
                version: SequenceNumber::new(5),
                data: Some({
                    let mut m = Map::new();
                    m.insert("k".to_string(), json!("v"));
                    m
                }),
            }
        );
    }

    #[test]
    fn barrier_enabled_passes_through_when_owner_caught_up() {
        let raw = set(5, "v");
        let result = apply(raw.clone(), true, SequenceNumber::new(9), SequenceNumber::new(10));
        assert_eq!(result, raw);
    }

    #[test]
    fn barrier_treats_v_zero_as_no_predecessor() {
        let raw = set(0, "v");
        let result = apply(raw.clone(), true, SequenceNumber::ZERO, SequenceNumber::ZERO);
        assert_eq!(result, raw);
    }
}
