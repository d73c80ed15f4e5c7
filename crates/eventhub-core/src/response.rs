use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use eventhub_types::Event;
use uuid::Uuid;

type ResponseCallback = Arc<dyn Fn(Option<Event>) + Send + Sync>;

/// Correlates response events back to the listener that requested them
/// (§4.6, S4/S5).
///
/// Registration spawns a timeout task immediately; whichever of "a matching
/// response arrives" or "the timeout elapses" happens first removes the
/// entry and fires the callback exactly once - `DashMap::remove` is the
/// single point of truth for "already delivered", so a response racing its
/// own timeout can never double-invoke the callback.
#[derive(Default)]
pub struct ResponseRegistry {
    pending: DashMap<Uuid, ResponseCallback>,
}

impl ResponseRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn register(
        self: &Arc<Self>,
        trigger_id: Uuid,
        timeout: Duration,
        callback: impl Fn(Option<Event>) + Send + Sync + 'static,
    ) {
        let callback: ResponseCallback = Arc::new(callback);
        self.pending.insert(trigger_id, callback);

        let registry = Arc::clone(self);
        tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            if let Some((_, callback)) = registry.pending.remove(&trigger_id) {
                invoke(&callback, None);
            }
        });
    }

    /// Deliver `event` if it responds to a pending registration. Returns
    /// whether a listener consumed it.
    pub fn deliver(&self, event: &Event) -> bool {
        let Some(trigger_id) = event.response_id else {
            return false;
        };
        match self.pending.remove(&trigger_id) {
            Some((_, callback)) => {
                invoke(&callback, Some(event.clone()));
                true
            }
            None => false,
        }
    }
}

/// Response callbacks run on the correlating task; isolate a panicking
/// callback the same way container listener dispatch does (§7).
fn invoke(callback: &ResponseCallback, event: Option<Event>) {
    let callback = Arc::clone(callback);
    if catch_unwind(AssertUnwindSafe(|| callback(event))).is_err() {
        tracing::error!("response listener callback panicked");
    }
}
