use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use eventhub_types::Event;
use tokio::sync::Mutex;

pub type Preprocessor = Arc<dyn Fn(Event) -> Event + Send + Sync>;

/// The chain of preprocessors every event runs through before it is
/// assigned a sequence number and fanned out to extensions (§5.5, §7).
///
/// Stages run in registration order. A stage is fail-open: if it panics,
/// the event it was given passes to the next stage unmodified rather than
/// aborting dispatch for the whole hub.
#[derive(Default)]
pub struct PreprocessorChain {
    stages: Mutex<Vec<Preprocessor>>,
}

impl PreprocessorChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register(&self, preprocessor: Preprocessor) {
        self.stages.lock().await.push(preprocessor);
    }

    pub async fn apply(&self, event: Event) -> Event {
        let stages = self.stages.lock().await.clone();
        let mut current = event;
        for stage in stages {
            let candidate = current.clone();
            match catch_unwind(AssertUnwindSafe(|| stage(candidate))) {
                Ok(transformed) => current = transformed,
                Err(_) => {
                    tracing::error!("preprocessor panicked, event passed through unmodified");
                }
            }
        }
        current
    }
}
