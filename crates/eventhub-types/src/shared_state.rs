use crate::event::EventData;
use crate::sequence::SequenceNumber;

/// The state an extension's timeline can hold at a given version.
///
/// A `Pending` entry may later be replaced by `Set` at the same version;
/// no other mutation of a past entry is permitted (§3).
#[derive(Clone, Debug, PartialEq)]
pub enum SharedStateStatus {
    Set(EventData),
    Pending,
}

impl SharedStateStatus {
    pub fn is_set(&self) -> bool {
        matches!(self, Self::Set(_))
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    pub fn data(&self) -> Option<&EventData> {
        match self {
            Self::Set(data) => Some(data),
            Self::Pending => None,
        }
    }
}

/// One entry in a per-extension shared-state timeline.
#[derive(Clone, Debug, PartialEq)]
pub struct SharedStateEntry {
    pub version: SequenceNumber,
    pub status: SharedStateStatus,
}

/// The outcome of resolving a shared-state timeline at a given version (§3).
///
/// `None` carries no version since no entry qualified; `Set`/`Pending` carry
/// the version of the entry the resolution landed on, distinct from the
/// version the caller asked to resolve.
#[derive(Clone, Debug, PartialEq)]
pub enum SharedStateResult {
    Set { version: SequenceNumber, data: EventData },
    Pending { version: SequenceNumber, data: Option<EventData> },
    None,
}

impl SharedStateResult {
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    pub fn data(&self) -> Option<&EventData> {
        match self {
            Self::Set { data, .. } => Some(data),
            Self::Pending { data, .. } => data.as_ref(),
            Self::None => None,
        }
    }

    /// Downgrade a `Set` result to `Pending`, preserving its data as the
    /// `Pending` carry-over value. Used by the barrier rule (§4.5.2). A
    /// no-op on already-`Pending`/`None` results.
    pub fn downgrade_to_pending(self) -> Self {
        match self {
            Self::Set { version, data } => Self::Pending {
                version,
                data: Some(data),
            },
            other => other,
        }
    }
}
