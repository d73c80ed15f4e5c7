mod api;
mod config;
mod container;
mod extension;
mod hub;
mod preprocessor;
mod response;

pub use api::ExtensionApi;
pub use config::HubConfig;
pub use container::ExtensionContainer;
pub use extension::{Extension, Listener};
pub use hub::EventHub;
pub use preprocessor::Preprocessor;

pub use eventhub_types::{
    state_change_event, Event, EventData, EventHubError, SequenceNumber, SharedStateEntry,
    SharedStateResult, SharedStateStatus, HUB_STATE_CHANGE_SOURCE, HUB_STATE_CHANGE_TYPE,
    STATE_OWNER_KEY,
};
