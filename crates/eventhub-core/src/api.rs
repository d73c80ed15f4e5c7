use std::sync::Arc;
use std::time::Duration;

use eventhub_types::{Event, EventData, EventHubError, SequenceNumber, SharedStateResult};
use uuid::Uuid;

use crate::container::ExtensionContainer;
use crate::extension::Listener;
use crate::hub::HubInner;

/// The handle an [`crate::extension::Extension`] receives in
/// `on_registered`, scoped to that extension's own name and container.
///
/// Every method here is the extension-facing half of the corresponding
/// [`crate::hub::EventHub`] operation; shared-state writes always target the
/// extension that owns this handle, so they take no extension-name
/// parameter the way the hub's own equivalents do.
#[derive(Clone)]
pub struct ExtensionApi {
    hub: Arc<HubInner>,
    container: Arc<ExtensionContainer>,
}

impl ExtensionApi {
    pub(crate) fn new(hub: Arc<HubInner>, container: Arc<ExtensionContainer>) -> Self {
        Self { hub, container }
    }

    pub fn extension_name(&self) -> &str {
        self.container.name()
    }

    pub fn register_listener(&self, event_type: impl Into<String>, source: impl Into<String>, listener: Listener) {
        self.container.register_listener(event_type, source, listener);
    }

    pub async fn dispatch(&self, event: Event) -> SequenceNumber {
        self.hub.dispatch(event).await
    }

    pub fn register_response_listener(&self, trigger_id: Uuid, timeout: Duration, callback: impl Fn(Option<Event>) + Send + Sync + 'static) {
        self.hub.response_registry.register(trigger_id, timeout, callback);
    }

    pub async fn create_shared_state(&self, version: SequenceNumber, data: EventData) -> Result<(), EventHubError> {
        self.hub.set_shared_state(self.extension_name(), version, data).await
    }

    pub async fn create_pending_shared_state(&self, version: SequenceNumber) -> Result<(), EventHubError> {
        self.hub.add_pending_shared_state(self.extension_name(), version).await
    }

    pub async fn update_pending_shared_state(&self, version: SequenceNumber, data: EventData) -> Result<(), EventHubError> {
        self.hub
            .update_pending_shared_state(self.extension_name(), version, data)
            .await
    }

    pub async fn get_own_shared_state(&self, version: SequenceNumber) -> SharedStateResult {
        self.container.timeline().await.resolve(version)
    }

    pub async fn get_shared_state(
        &self,
        extension_name: &str,
        version: SequenceNumber,
        barrier: bool,
    ) -> Result<SharedStateResult, EventHubError> {
        self.hub.get_shared_state(extension_name, version, barrier).await
    }
}
