//! Pub/Sub event bus that decouples controls from the state they act on.
//!
//! Controls never hold references into the element tree. A button's click
//! action emits an event; the orchestrator drains the queue with
//! [`EventBus::poll`] after the traversal finishes, so every structural
//! mutation or seek happens between ticks.
//!
//! Events come back from `poll()` in emission order.

use log::warn;
use std::any::Any;
use std::sync::{Arc, Mutex};

/// Maximum queued events before the oldest half is dropped
const MAX_QUEUE_SIZE: usize = 1000;

/// Marker trait for events. Blanket-implemented for every `Any + Send + Sync`.
pub trait Event: Any + Send + Sync + 'static {
    fn as_any(&self) -> &dyn Any;
    fn type_name(&self) -> &'static str;
}

impl<T: Any + Send + Sync + 'static> Event for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

/// Boxed event as stored in the queue
pub type BoxedEvent = Box<dyn Event>;

#[derive(Default)]
struct Shared {
    queue: Mutex<Vec<BoxedEvent>>,
}

impl Shared {
    fn enqueue(&self, event: BoxedEvent) {
        let mut queue = self.queue.lock().unwrap_or_else(|e| e.into_inner());
        if queue.len() >= MAX_QUEUE_SIZE {
            let evict = queue.len() / 2;
            warn!("Event queue full ({} events), dropping oldest {}", queue.len(), evict);
            queue.drain(0..evict);
        }
        queue.push(event);
    }
}

/// Owner side of the bus: emit and poll.
#[derive(Clone, Default)]
pub struct EventBus {
    shared: Arc<Shared>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit<E: Event>(&self, event: E) {
        self.shared.enqueue(Box::new(event));
    }

    /// Take every event emitted since the last poll, oldest first.
    pub fn poll(&self) -> Vec<BoxedEvent> {
        std::mem::take(&mut *self.shared.queue.lock().unwrap_or_else(|e| e.into_inner()))
    }

    /// Emit-only handle for controls.
    pub fn emitter(&self) -> EventEmitter {
        EventEmitter {
            shared: Arc::clone(&self.shared),
        }
    }
}

/// Cloneable emit-only handle passed to controls during the traversal.
#[derive(Clone)]
pub struct EventEmitter {
    shared: Arc<Shared>,
}

impl std::fmt::Debug for EventEmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventEmitter")
            .field("queue_len", &self.shared.queue.lock().map(|q| q.len()).unwrap_or(0))
            .finish()
    }
}

impl EventEmitter {
    pub fn emit<E: Event>(&self, event: E) {
        self.shared.enqueue(Box::new(event));
    }
}

/// Downcast a polled event to its concrete type.
///
/// Must deref to `dyn Event` first: calling `as_any()` on the `Box` itself
/// would hit the blanket impl for `Box<dyn Event>` and never match.
#[inline]
pub fn downcast_event<E: Event>(event: &BoxedEvent) -> Option<&E> {
    (**event).as_any().downcast_ref::<E>()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug)]
    struct Seek(f64);

    #[derive(Clone, Debug)]
    struct Toggle;

    #[test]
    fn test_emit_queues_for_poll() {
        let bus = EventBus::new();
        let emitter = bus.emitter();
        emitter.emit(Seek(1.5));
        emitter.emit(Toggle);
        bus.emit(Seek(3.0));

        let events = bus.poll();
        assert_eq!(events.len(), 3);
        assert_eq!(downcast_event::<Seek>(&events[0]).map(|s| s.0), Some(1.5));
        assert!(downcast_event::<Toggle>(&events[1]).is_some());
        assert!(downcast_event::<Seek>(&events[1]).is_none());
        assert_eq!(bus.poll().len(), 0);
    }

    #[test]
    fn test_queue_eviction() {
        let bus = EventBus::new();
        for i in 0..(MAX_QUEUE_SIZE + 1) {
            bus.emit(Seek(i as f64));
        }
        let events = bus.poll();
        assert_eq!(events.len(), MAX_QUEUE_SIZE / 2 + 1);
        assert_eq!(
            downcast_event::<Seek>(events.last().unwrap()).map(|s| s.0),
            Some(MAX_QUEUE_SIZE as f64)
        );
    }
}
