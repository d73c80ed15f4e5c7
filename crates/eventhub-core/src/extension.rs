use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use eventhub_types::Event;

use crate::api::ExtensionApi;

/// A listener callback registered against a concrete `(event_type, source)`
/// pair or a `"*"` wildcard on either axis (§4.4). Invoked on the owning
/// extension's dedicated worker, never concurrently with another listener
/// of the same extension.
pub type Listener = Arc<dyn Fn(Event) + Send + Sync>;

/// The capability contract every pluggable component implements (§6).
///
/// `on_registered` is the only required hook: it receives an
/// [`ExtensionApi`] scoped to this extension and is expected to register
/// listeners and publish an initial shared state from it. `on_unregistered`
/// is a cleanup hook; `ready_for_event` lets an extension hold back events
/// it isn't ready to process yet (defaults to always-ready).
#[async_trait]
pub trait Extension: Send + Sync {
    /// Unique registration key, e.g. `"com.adobe.analytics"`.
    fn name(&self) -> &str;

    /// Human-readable name, published in the hub's own shared state.
    fn friendly_name(&self) -> &str {
        self.name()
    }

    fn version(&self) -> &str {
        "0.0.0"
    }

    /// Static capability metadata, published verbatim in the hub's own
    /// shared state alongside this extension's version and friendly name.
    fn metadata(&self) -> Option<&HashMap<String, String>> {
        None
    }

    async fn on_registered(&self, api: ExtensionApi);

    async fn on_unregistered(&self) {}

    /// Whether this extension is ready to receive `event` right now.
    /// Returning `false` pauses this extension's queue on that event until
    /// it is re-ticked (§5.4 cooperative backpressure via C2).
    async fn ready_for_event(&self, _event: &Event) -> bool {
        true
    }
}
