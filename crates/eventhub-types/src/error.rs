/// The hub's error taxonomy (C7).
///
/// Every variant is surfaced exclusively through the `completion` callback
/// of the operation that caused it; the hub never aborts or propagates
/// these upward (§7).
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum EventHubError {
    #[error("extension name must not be empty")]
    InvalidExtensionName,

    #[error("extension '{type_name}' is already registered")]
    DuplicateExtensionName { type_name: String },

    #[error("extension '{type_name}' is not registered")]
    ExtensionNotRegistered { type_name: String },

    #[error("extension '{type_name}' failed to initialize: {reason}")]
    ExtensionInitializationFailure { type_name: String, reason: String },
}
