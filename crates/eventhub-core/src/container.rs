use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use eventhub_engine::OperationOrderer;
use eventhub_state::SharedStateTimeline;
use eventhub_types::{Event, SequenceNumber};
use tokio::sync::Mutex;

use crate::extension::{Extension, Listener};

/// Wraps a registered [`Extension`] with its own dedicated worker, listener
/// table and shared-state timeline (C4).
///
/// Every event this container is fed runs through `extension.ready_for_event`
/// first; a `false` pauses the container's [`OperationOrderer`] exactly as a
/// slow consumer pausing its own queue, and later events simply queue up
/// until the container's orderer is restarted. Listener invocation is
/// panic-isolated: a listener that unwinds is logged and skipped, it never
/// takes down the extension's worker or the hub.
pub struct ExtensionContainer {
    extension: Arc<dyn Extension>,
    listeners: DashMap<(String, String), Vec<Listener>>,
    timeline: Mutex<SharedStateTimeline>,
    orderer: OperationOrderer<Event>,
    last_processed: AtomicU64,
}

impl ExtensionContainer {
    /// `async` because the orderer's handler registration is itself async
    /// (§5.2); awaiting it here means `start()` never races an
    /// as-yet-unset handler the way a fire-and-forget spawn would.
    pub async fn new(extension: Arc<dyn Extension>) -> Arc<Self> {
        let container = Arc::new(Self {
            extension,
            listeners: DashMap::new(),
            timeline: Mutex::new(SharedStateTimeline::new()),
            orderer: OperationOrderer::new(),
            last_processed: AtomicU64::new(0),
        });

        let handler_container = Arc::clone(&container);
        container
            .orderer
            .set_handler(move |event: Event| {
                let container = Arc::clone(&handler_container);
                async move { container.process(event).await }
            })
            .await;

        container
    }

    pub fn name(&self) -> &str {
        self.extension.name()
    }

    pub fn friendly_name(&self) -> &str {
        self.extension.friendly_name()
    }

    pub fn version(&self) -> &str {
        self.extension.version()
    }

    pub fn metadata(&self) -> Option<&HashMap<String, String>> {
        self.extension.metadata()
    }

    pub fn extension(&self) -> &Arc<dyn Extension> {
        &self.extension
    }

    pub fn register_listener(&self, event_type: impl Into<String>, source: impl Into<String>, listener: Listener) {
        self.listeners
            .entry((event_type.into(), source.into()))
            .or_default()
            .push(listener);
    }

    /// Enqueue `event` on this extension's serial worker. Returns
    /// immediately; `event` is handled asynchronously, in the order it was
    /// enqueued relative to every other event this container has seen.
    pub async fn dispatch(&self, event: Event) {
        self.orderer.add(event).await;
    }

    pub async fn start(&self) -> Result<(), eventhub_engine::EngineError> {
        self.orderer.start().await
    }

    pub fn last_processed(&self) -> SequenceNumber {
        SequenceNumber::new(self.last_processed.load(Ordering::SeqCst))
    }

    pub async fn timeline(&self) -> tokio::sync::MutexGuard<'_, SharedStateTimeline> {
        self.timeline.lock().await
    }

    async fn process(&self, event: Event) -> bool {
        if !self.extension.ready_for_event(&event).await {
            tracing::debug!(extension = self.name(), event = %event.id, "extension not ready, pausing");
            return false;
        }

        for entry in self.listeners.iter() {
            let (event_type, source) = entry.key();
            if !event.matches(event_type, source) {
                continue;
            }
            for listener in entry.value() {
                let listener = Arc::clone(listener);
                let event = event.clone();
                let result = catch_unwind(AssertUnwindSafe(|| listener(event)));
                if result.is_err() {
                    tracing::error!(extension = self.name(), "listener panicked, event dropped");
                }
            }
        }

        if let Some(sequence) = event.sequence {
            self.last_processed.fetch_max(sequence.get(), Ordering::SeqCst);
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    struct NoopExtension;

    #[async_trait]
    impl Extension for NoopExtension {
        fn name(&self) -> &str {
            "test.extension"
        }

        async fn on_registered(&self, _api: crate::api::ExtensionApi) {}
    }

    #[test_log::test(tokio::test)]
    async fn matching_listener_is_invoked_and_wildcard_listener_sees_everything() {
        let container = ExtensionContainer::new(Arc::new(NoopExtension)).await;
        container.start().await.unwrap();

        let exact_count = Arc::new(AtomicUsize::new(0));
        let wildcard_count = Arc::new(AtomicUsize::new(0));

        let exact = Arc::clone(&exact_count);
        container.register_listener("com.test.event", "com.test.source", Arc::new(move |_| {
            exact.fetch_add(1, Ordering::SeqCst);
        }));

        let wildcard = Arc::clone(&wildcard_count);
        container.register_listener("*", "*", Arc::new(move |_| {
            wildcard.fetch_add(1, Ordering::SeqCst);
        }));

        let mut event = Event::new("n", "com.test.event", "com.test.source");
        event.sequence = Some(SequenceNumber::new(1));
        container.dispatch(event).await;

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(exact_count.load(Ordering::SeqCst), 1);
        assert_eq!(wildcard_count.load(Ordering::SeqCst), 1);
        assert_eq!(container.last_processed(), SequenceNumber::new(1));
    }

    #[tokio::test]
    async fn panicking_listener_does_not_stop_other_listeners() {
        let container = ExtensionContainer::new(Arc::new(NoopExtension)).await;
        container.start().await.unwrap();

        let survived = Arc::new(AtomicUsize::new(0));
        container.register_listener("com.test.event", "*", Arc::new(|_| panic!("boom")));
        let survived_handler = Arc::clone(&survived);
        container.register_listener(
            "com.test.event",
            "*",
            Arc::new(move |_| {
                survived_handler.fetch_add(1, Ordering::SeqCst);
            }),
        );

        let mut event = Event::new("n", "com.test.event", "com.test.source");
        event.sequence = Some(SequenceNumber::new(1));
        container.dispatch(event).await;

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(survived.load(Ordering::SeqCst), 1);
    }
}
