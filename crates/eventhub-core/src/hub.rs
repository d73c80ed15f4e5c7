use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use eventhub_engine::{AtomicCounter, OperationOrderer};
use eventhub_state::{apply_barrier, build_hub_state, ExtensionInfo, SharedStateTimeline};
use eventhub_types::{state_change_event, Event, EventData, EventHubError, SequenceNumber, SharedStateResult};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::api::ExtensionApi;
use crate::config::HubConfig;
use crate::container::ExtensionContainer;
use crate::extension::Extension;
use crate::response::ResponseRegistry;
use crate::preprocessor::PreprocessorChain;

const HUB_EXTENSION_NAME: &str = "com.adobe.module.eventhub";

/// Shared state behind every clone of an [`EventHub`] handle.
///
/// Holds the control-lane primitives (C5): the global sequence counter, the
/// extension registry, the hub's own pseudo-extension timeline, the
/// response-listener correlation table, the preprocessor chain, and the
/// global event lane itself - an [`OperationOrderer`] driven by its own
/// spawned task, exactly like a per-extension container's. Nothing here is
/// reached directly from outside the crate - callers go through
/// [`EventHub`] or [`ExtensionApi`].
pub(crate) struct HubInner {
    config: HubConfig,
    counter: AtomicCounter,
    pub(crate) registered: DashMap<String, Arc<ExtensionContainer>>,
    hub_timeline: Mutex<SharedStateTimeline>,
    pub(crate) response_registry: Arc<ResponseRegistry>,
    preprocessors: PreprocessorChain,
    event_sequences: DashMap<Uuid, SequenceNumber>,
    global_orderer: OperationOrderer<Event>,
    started: AtomicBool,
}

impl HubInner {
    fn container_for(&self, extension_name: &str) -> Result<Arc<ExtensionContainer>, EventHubError> {
        self.registered
            .get(extension_name)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| EventHubError::ExtensionNotRegistered {
                type_name: extension_name.to_string(),
            })
    }

    /// Stamps a sequence number and hands `event` to the global orderer.
    /// Returns as soon as the event is queued there - it does not wait for
    /// preprocessing, response correlation or any extension to finish
    /// processing it (§5.5). The sequence number is known up front because
    /// it comes from the hub's own counter, not from the orderer.
    pub(crate) async fn dispatch(&self, mut event: Event) -> SequenceNumber {
        let sequence = self.counter.next();
        event.sequence = Some(sequence);
        self.event_sequences.insert(event.id, sequence);
        self.global_orderer.add(event).await;
        sequence
    }

    /// The global orderer's handler body: preprocessing, response
    /// correlation, and fan-out to every registered extension's own queue.
    /// Runs one event at a time on the orderer's driver task, so two
    /// concurrent `dispatch()` callers still fan out to containers in the
    /// same order their sequence numbers were assigned in.
    async fn process_dispatched(&self, event: Event) {
        let event = self.preprocessors.apply(event).await;

        if self.response_registry.deliver(&event) {
            tracing::debug!(event = %event.id, sequence = ?event.sequence, "delivered as response");
        }

        for entry in self.registered.iter() {
            entry.value().dispatch(event.clone()).await;
        }
    }

    pub(crate) async fn set_shared_state(&self, extension_name: &str, version: SequenceNumber, data: EventData) -> Result<(), EventHubError> {
        let container = self.container_for(extension_name)?;
        container.timeline().await.set(version, data);
        self.dispatch(state_change_event(extension_name)).await;
        self.publish_hub_state().await;
        Ok(())
    }

    pub(crate) async fn add_pending_shared_state(&self, extension_name: &str, version: SequenceNumber) -> Result<(), EventHubError> {
        let container = self.container_for(extension_name)?;
        container.timeline().await.add_pending(version);
        Ok(())
    }

    pub(crate) async fn update_pending_shared_state(
        &self,
        extension_name: &str,
        version: SequenceNumber,
        data: EventData,
    ) -> Result<(), EventHubError> {
        let container = self.container_for(extension_name)?;
        container.timeline().await.update_pending(version, data);
        self.dispatch(state_change_event(extension_name)).await;
        self.publish_hub_state().await;
        Ok(())
    }

    pub(crate) async fn get_shared_state(
        &self,
        extension_name: &str,
        version: SequenceNumber,
        barrier: bool,
    ) -> Result<SharedStateResult, EventHubError> {
        if extension_name == HUB_EXTENSION_NAME {
            return Ok(self.hub_timeline.lock().await.resolve(version));
        }
        let container = self.container_for(extension_name)?;
        let raw = container.timeline().await.resolve(version);
        let last_processed = container.last_processed();
        Ok(apply_barrier(raw, barrier, last_processed, version))
    }

    async fn publish_hub_state(&self) {
        let mut extensions = BTreeMap::new();
        for entry in self.registered.iter() {
            let container = entry.value();
            extensions.insert(
                container.friendly_name().to_string(),
                ExtensionInfo {
                    version: container.version().to_string(),
                    friendly_name: container.friendly_name().to_string(),
                    metadata: container.metadata().cloned(),
                },
            );
        }
        let data = build_hub_state(self.config.get_hub_version(), &extensions);
        let version = self.counter.next();
        self.hub_timeline.lock().await.set(version, data);
    }
}

/// The pub-sub kernel: accepts extension registrations, dispatches events in
/// a globally ordered, non-blocking fashion, and brokers per-extension
/// shared state (C5).
///
/// Cheap to clone - every clone shares the same [`HubInner`] via `Arc`.
#[derive(Clone)]
pub struct EventHub {
    inner: Arc<HubInner>,
}

impl EventHub {
    pub fn new(config: HubConfig) -> Self {
        Self {
            inner: Arc::new(HubInner {
                config,
                counter: AtomicCounter::new(),
                registered: DashMap::new(),
                hub_timeline: Mutex::new(SharedStateTimeline::new()),
                response_registry: ResponseRegistry::new(),
                preprocessors: PreprocessorChain::new(),
                event_sequences: DashMap::new(),
                global_orderer: OperationOrderer::new(),
                started: AtomicBool::new(false),
            }),
        }
    }

    /// Wires up the global event lane's handler, starts its driver task,
    /// and publishes the hub's initial shared state. Safe to call more
    /// than once; only the first call has an effect. `dispatch()` before
    /// `start()` queues events on the global orderer that sit unprocessed
    /// until this runs.
    pub async fn start(&self) {
        if self.inner.started.swap(true, Ordering::SeqCst) {
            return;
        }

        let inner = Arc::clone(&self.inner);
        self.inner
            .global_orderer
            .set_handler(move |event: Event| {
                let inner = Arc::clone(&inner);
                async move {
                    inner.process_dispatched(event).await;
                    true
                }
            })
            .await;
        if self.inner.global_orderer.start().await.is_err() {
            tracing::error!("global orderer handler missing right after it was set");
        }

        self.inner.publish_hub_state().await;
    }

    /// Registers `extension`, spins up its container and worker, and runs
    /// its `on_registered` hook. A panic inside `on_registered` is caught
    /// and reported as [`EventHubError::ExtensionInitializationFailure`];
    /// the extension is rolled back out of the registry in that case.
    pub async fn register_extension(&self, extension: Arc<dyn Extension>) -> Result<(), EventHubError> {
        let name = extension.name().to_string();
        if name.is_empty() {
            return Err(EventHubError::InvalidExtensionName);
        }
        if self.inner.registered.contains_key(&name) {
            return Err(EventHubError::DuplicateExtensionName { type_name: name });
        }

        let container = ExtensionContainer::new(Arc::clone(&extension)).await;
        self.inner.registered.insert(name.clone(), Arc::clone(&container));

        let api = ExtensionApi::new(Arc::clone(&self.inner), Arc::clone(&container));
        let init = tokio::spawn(async move { extension.on_registered(api).await });
        if let Err(join_error) = init.await {
            self.inner.registered.remove(&name);
            return Err(EventHubError::ExtensionInitializationFailure {
                type_name: name,
                reason: if join_error.is_panic() {
                    "on_registered panicked".to_string()
                } else {
                    "on_registered was cancelled".to_string()
                },
            });
        }

        container.start().await.map_err(|_| EventHubError::ExtensionInitializationFailure {
            type_name: name.clone(),
            reason: "orderer handler not set".to_string(),
        })?;

        self.inner.publish_hub_state().await;
        Ok(())
    }

    pub async fn unregister_extension(&self, name: &str) -> Result<(), EventHubError> {
        let (_, container) = self
            .inner
            .registered
            .remove(name)
            .ok_or_else(|| EventHubError::ExtensionNotRegistered {
                type_name: name.to_string(),
            })?;
        container.extension().on_unregistered().await;
        self.inner.publish_hub_state().await;
        Ok(())
    }

    pub async fn dispatch(&self, event: Event) -> SequenceNumber {
        self.inner.dispatch(event).await
    }

    /// Looks up the sequence number a dispatched event was assigned, by
    /// its id. `None` if `event_id` was never dispatched through this hub.
    pub fn sequence_for(&self, event_id: Uuid) -> Option<SequenceNumber> {
        self.inner.event_sequences.get(&event_id).map(|entry| *entry)
    }

    pub fn register_response_listener(&self, trigger_id: Uuid, callback: impl Fn(Option<Event>) + Send + Sync + 'static) {
        let timeout = self.inner.config.get_response_listener_timeout();
        self.inner.response_registry.register(trigger_id, timeout, callback);
    }

    pub fn register_response_listener_with_timeout(
        &self,
        trigger_id: Uuid,
        timeout: Duration,
        callback: impl Fn(Option<Event>) + Send + Sync + 'static,
    ) {
        self.inner.response_registry.register(trigger_id, timeout, callback);
    }

    pub async fn register_preprocessor(&self, preprocessor: impl Fn(Event) -> Event + Send + Sync + 'static) {
        self.inner.preprocessors.register(Arc::new(preprocessor)).await;
    }

    pub async fn create_shared_state(&self, extension_name: &str, version: SequenceNumber, data: EventData) -> Result<(), EventHubError> {
        self.inner.set_shared_state(extension_name, version, data).await
    }

    pub async fn create_pending_shared_state(&self, extension_name: &str, version: SequenceNumber) -> Result<(), EventHubError> {
        self.inner.add_pending_shared_state(extension_name, version).await
    }

    pub async fn update_pending_shared_state(
        &self,
        extension_name: &str,
        version: SequenceNumber,
        data: EventData,
    ) -> Result<(), EventHubError> {
        self.inner.update_pending_shared_state(extension_name, version, data).await
    }

    pub async fn get_shared_state(
        &self,
        extension_name: &str,
        version: SequenceNumber,
        barrier: bool,
    ) -> Result<SharedStateResult, EventHubError> {
        self.inner.get_shared_state(extension_name, version, barrier).await
    }

    pub fn extension_names(&self) -> Vec<String> {
        self.inner.registered.iter().map(|entry| entry.key().clone()).collect()
    }

    /// Runs every registered extension's `on_unregistered` hook and clears
    /// the registry. The hub itself stays usable afterward - a fresh
    /// `register_extension` call works exactly as on a never-started hub.
    pub async fn shutdown(&self) {
        for entry in self.inner.registered.iter() {
            entry.value().extension().on_unregistered().await;
        }
        self.inner.registered.clear();
    }
}

impl Default for EventHub {
    fn default() -> Self {
        Self::new(HubConfig::default())
    }
}
