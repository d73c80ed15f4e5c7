use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio::sync::{Mutex, Notify};

use crate::error::EngineError;

type Handler<T> = Arc<dyn Fn(T) -> Pin<Box<dyn Future<Output = bool> + Send>> + Send + Sync>;

/// The orderer's lifecycle state (C2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// No driver task is parked on work; the queue is empty or not yet started.
    Idle,
    /// A driver task is actively draining the queue.
    Running,
    /// Draining is suspended, either by an explicit `pause()` or because the
    /// handler itself returned `false` for the last item processed.
    Paused,
}

struct OrdererState<T> {
    queue: VecDeque<T>,
    status: Status,
    handler: Option<Handler<T>>,
    driving: bool,
}

/// A serial, pausable work queue for a single extension's event stream (C2).
///
/// Items are processed strictly one at a time, in FIFO order: the driver
/// awaits the handler to completion before dequeuing the next item, so two
/// items for the same `OperationOrderer` are never handled concurrently.
/// The handler's boolean return is cooperative backpressure - returning
/// `false` pauses the orderer exactly as an external `pause()` would,
/// letting an extension halt its own queue (e.g. while a pending
/// shared-state read resolves elsewhere) without a side channel. The item
/// the handler declined is retained at the head of the queue and is the
/// first thing redelivered once the orderer is running again - it is
/// never silently dropped, and no other item overtakes it. Draining
/// resumes only once `start()` is called again.
#[derive(Clone)]
pub struct OperationOrderer<T> {
    inner: Arc<Mutex<OrdererState<T>>>,
    notify: Arc<Notify>,
}

impl<T: Send + Clone + 'static> OperationOrderer<T> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(OrdererState {
                queue: VecDeque::new(),
                status: Status::Idle,
                handler: None,
                driving: false,
            })),
            notify: Arc::new(Notify::new()),
        }
    }

    /// Register the per-item handler. Must be called before `start()`.
    /// Replacing the handler while the orderer is running takes effect on
    /// the next dequeued item.
    pub async fn set_handler<F, Fut>(&self, handler: F)
    where
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = bool> + Send + 'static,
    {
        let mut state = self.inner.lock().await;
        state.handler = Some(Arc::new(move |item| Box::pin(handler(item))));
    }

    /// Enqueue an item. Wakes the driver if it is currently parked waiting
    /// for work.
    pub async fn add(&self, item: T) {
        let mut state = self.inner.lock().await;
        state.queue.push_back(item);
        drop(state);
        self.notify.notify_one();
    }

    /// Move the orderer to `Running`, spawning a driver task if none is
    /// currently alive. Returns [`EngineError::HandlerNotSet`] if no
    /// handler has been registered - fails fast rather than silently
    /// queuing work nothing will ever drain.
    pub async fn start(&self) -> Result<(), EngineError> {
        let mut state = self.inner.lock().await;
        if state.handler.is_none() {
            return Err(EngineError::HandlerNotSet);
        }
        state.status = Status::Running;
        let need_spawn = !state.driving;
        state.driving = true;
        drop(state);

        if need_spawn {
            self.spawn_driver();
        } else {
            self.notify.notify_one();
        }
        Ok(())
    }

    /// Suspend draining. The item currently in flight, if any, still runs
    /// to completion; no further items are dequeued until `start()`.
    pub async fn pause(&self) {
        let mut state = self.inner.lock().await;
        state.status = Status::Paused;
        drop(state);
        self.notify.notify_one();
    }

    /// Wake a driver parked on an empty queue so it re-evaluates status
    /// without changing it - used after mutating state the driver can't
    /// observe on its own (e.g. a handler swap mid-pause).
    pub async fn retick(&self) {
        self.notify.notify_one();
    }

    pub async fn status(&self) -> Status {
        self.inner.lock().await.status
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.queue.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn spawn_driver(&self) {
        let inner = Arc::clone(&self.inner);
        let notify = Arc::clone(&self.notify);
        tokio::spawn(async move {
            loop {
                let next = {
                    let mut state = inner.lock().await;
                    if state.status == Status::Paused {
                        state.driving = false;
                        return;
                    }
                    state.queue.pop_front().map(|item| (item, state.handler.clone()))
                };

                let (item, handler) = match next {
                    Some(pair) => pair,
                    None => {
                        inner.lock().await.status = Status::Idle;
                        notify.notified().await;
                        continue;
                    }
                };

                let Some(handler) = handler else {
                    inner.lock().await.driving = false;
                    return;
                };

                let replay = item.clone();
                let keep_going = handler(item).await;

                let mut state = inner.lock().await;
                if !keep_going {
                    state.queue.push_front(replay);
                    state.status = Status::Paused;
                    state.driving = false;
                    return;
                }
                if state.status == Status::Idle {
                    state.status = Status::Running;
                }
            }
        });
    }
}

impl<T: Send + Clone + 'static> Default for OperationOrderer<T> {
    fn default() -> Self {
        Self::new()
    }
}
