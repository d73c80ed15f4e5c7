use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::sequence::SequenceNumber;

/// Arbitrary event payload: a string-keyed mapping, same shape an extension
/// reads out of `Event::data` or hands to `create_shared_state`.
pub type EventData = Map<String, Value>;

/// An immutable message dispatched through the hub.
///
/// `sequence` is `None` until [`crate::event::Event`] passes through
/// `dispatch` — the event itself is immutable once dispatched, but a caller
/// builds it (via [`Event::new`]) before the hub has assigned a sequence
/// number, so the field is optional rather than defaulted to a sentinel.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: Uuid,
    pub name: String,
    pub event_type: String,
    pub source: String,
    pub data: EventData,
    pub timestamp: DateTime<Utc>,
    /// The `id` of a previously dispatched trigger event, if this event is a response.
    pub response_id: Option<Uuid>,
    pub sequence: Option<SequenceNumber>,
}

impl Event {
    /// Construct a new, not-yet-dispatched event. `id` and `timestamp` are
    /// stamped here; `sequence` is left unset for `dispatch` to fill in.
    pub fn new(name: impl Into<String>, event_type: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            event_type: event_type.into(),
            source: source.into(),
            data: Map::new(),
            timestamp: Utc::now(),
            response_id: None,
            sequence: None,
        }
    }

    pub fn with_data(mut self, data: EventData) -> Self {
        self.data = data;
        self
    }

    /// Mark this event as a response to `trigger_id`.
    pub fn in_response_to(mut self, trigger_id: Uuid) -> Self {
        self.response_id = Some(trigger_id);
        self
    }

    /// Whether `(type, source)` matches this event under `"*"` wildcards on
    /// either axis. Used by container listener filtering (§4.4).
    pub fn matches(&self, event_type: &str, source: &str) -> bool {
        (event_type == "*" || event_type == self.event_type) && (source == "*" || source == self.source)
    }
}

/// Reserved event type/source pair for hub-originated state-change notifications (§4.5.5).
pub const HUB_STATE_CHANGE_TYPE: &str = "com.adobe.eventType.hub";
pub const HUB_STATE_CHANGE_SOURCE: &str = "com.adobe.eventSource.sharedState";
/// Key carrying the name of the extension whose shared state just changed.
pub const STATE_OWNER_KEY: &str = "stateowner";

/// Builds the hub's state-change notification event (§4.5.5) for `owner`.
pub fn state_change_event(owner: &str) -> Event {
    let mut data = Map::new();
    data.insert(STATE_OWNER_KEY.to_string(), Value::String(owner.to_string()));
    Event::new("State Change", HUB_STATE_CHANGE_TYPE, HUB_STATE_CHANGE_SOURCE).with_data(data)
}
