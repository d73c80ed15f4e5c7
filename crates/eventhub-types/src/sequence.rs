use std::fmt;

/// A dispatch-ordered position, assigned exactly once per dispatched event.
///
/// Zero is reserved to mean "before any event" (see [`SequenceNumber::ZERO`]);
/// every dispatched event is stamped with a strictly larger value by the
/// hub's atomic counter. No wraparound handling — 64-bit width.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SequenceNumber(u64);

impl SequenceNumber {
    /// "Before any event". Never assigned to a dispatched event.
    pub const ZERO: Self = Self(0);

    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub const fn get(self) -> u64 {
        self.0
    }

    /// Saturating predecessor, used by the barrier rule to compute `v - 1`.
    pub const fn saturating_pred(self) -> Self {
        Self(self.0.saturating_sub(1))
    }
}

impl fmt::Display for SequenceNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for SequenceNumber {
    fn from(value: u64) -> Self {
        Self(value)
    }
}
