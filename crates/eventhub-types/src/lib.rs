mod error;
mod event;
mod sequence;
mod shared_state;

pub use error::EventHubError;
pub use event::{
    state_change_event, Event, EventData, HUB_STATE_CHANGE_SOURCE, HUB_STATE_CHANGE_TYPE,
    STATE_OWNER_KEY,
};
pub use sequence::SequenceNumber;
pub use shared_state::{SharedStateEntry, SharedStateResult, SharedStateStatus};
