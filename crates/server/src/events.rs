//! In-memory event bus.
//!
//! The world publishes every state change here; the scheduler drains the
//! buffer once per tick and ships it as an `event_batch`. Subscribers are
//! dispatched from a dedicated thread so publishing never blocks on them,
//! and buffering is independent of subscriber latency.

use std::collections::HashMap;
use std::fmt;
use std::sync::{mpsc, Arc, Mutex, PoisonError, RwLock};
use std::thread;

use protocol::{Event, EventBatch, EventType};

/// Preallocated capacity of the per-tick buffer; growth is allowed.
const BUFFER_CAPACITY: usize = 100;

type Handler = Arc<dyn Fn(&Event) + Send + Sync>;
type HandlerMap = HashMap<EventType, Vec<Handler>>;

pub struct EventBus {
    handlers: Arc<RwLock<HandlerMap>>,
    buffer: Mutex<Vec<Event>>,
    dispatch_tx: mpsc::Sender<Event>,
}

impl EventBus {
    pub fn new() -> Self {
        let handlers: Arc<RwLock<HandlerMap>> = Arc::default();
        let (dispatch_tx, dispatch_rx) = mpsc::channel::<Event>();

        // Dispatcher thread; exits when the bus (and with it the sender) is
        // dropped.
        let dispatch_handlers = Arc::clone(&handlers);
        thread::spawn(move || {
            while let Ok(event) = dispatch_rx.recv() {
                let matching: Vec<Handler> = {
                    let map = dispatch_handlers.read().unwrap_or_else(PoisonError::into_inner);
                    map.get(&event.event_type()).cloned().unwrap_or_default()
                };
                for handler in matching {
                    handler(&event);
                }
            }
        });

        Self {
            handlers,
            buffer: Mutex::new(Vec::with_capacity(BUFFER_CAPACITY)),
            dispatch_tx,
        }
    }

    /// Register a handler for one event type. Handlers run off the
    /// publishing thread and may observe events from any tick.
    pub fn subscribe(&self, event_type: EventType, handler: impl Fn(&Event) + Send + Sync + 'static) {
        let mut map = self.handlers.write().unwrap_or_else(PoisonError::into_inner);
        map.entry(event_type).or_default().push(Arc::new(handler));
    }

    /// Publish an event: hand it to the dispatcher (fire-and-forget) and
    /// append it to the per-tick buffer.
    pub fn publish(&self, event: Event) {
        let _ = self.dispatch_tx.send(event.clone());
        let mut buffer = self.buffer.lock().unwrap_or_else(PoisonError::into_inner);
        buffer.push(event);
    }

    /// Take the buffered events, leaving the buffer empty.
    pub fn flush(&self) -> Vec<Event> {
        let mut buffer = self.buffer.lock().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *buffer, Vec::with_capacity(BUFFER_CAPACITY))
    }

    /// Number of events currently buffered.
    pub fn buffered(&self) -> usize {
        self.buffer.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Encode a drained batch as an `event_batch` frame.
    pub fn serialize_batch(events: &[Event]) -> serde_json::Result<String> {
        serde_json::to_string(&EventBatch::new(events))
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus").field("buffered", &self.buffered()).finish()
    }
}
