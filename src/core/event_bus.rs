//! Pub/Sub event bus connecting the editor to its collaborators.
//!
//! Every publish does two things: subscribers for the event type run
//! synchronously, then the event is queued so the host loop can drain it
//! later with [`EventBus::poll`].
//!
//! The player never holds a reference to the editor. It only owns an
//! [`EditorEventEmitter`] and pushes playback notifications through it.
//!
//! Subscribers of one event type run in subscription order. There is no
//! ordering guarantee between different event types.

use log::warn;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

/// Queue length that triggers eviction of the older half
const MAX_QUEUE_SIZE: usize = 1000;

/// Anything `Send + Sync + 'static` can travel on the bus.
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

type Handler = Arc<dyn Fn(&dyn Any) + Send + Sync>;

/// Boxed event as stored in the queue
pub type BoxedEvent = Box<dyn Event>;

/// State shared by the bus and every emitter cloned from it.
#[derive(Default)]
struct Shared {
    handlers: RwLock<HashMap<TypeId, Vec<Handler>>>,
    pending: Mutex<Vec<BoxedEvent>>,
}

impl Shared {
    fn publish<E: Event>(&self, event: E) {
        {
            let handlers = self.handlers.read().unwrap_or_else(|e| e.into_inner());
            for handler in handlers.get(&TypeId::of::<E>()).into_iter().flatten() {
                handler(&event);
            }
        }

        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        if pending.len() >= MAX_QUEUE_SIZE {
            let dropped = pending.len() / 2;
            warn!(
                "Editor event queue full ({} pending), dropping oldest {} ({})",
                pending.len(),
                dropped,
                std::any::type_name::<E>()
            );
            pending.drain(..dropped);
        }
        pending.push(Box::new(event));
    }

    fn pending_len(&self) -> usize {
        self.pending.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    fn handler_types(&self) -> usize {
        self.handlers.read().unwrap_or_else(|e| e.into_inner()).len()
    }
}

/// Event bus owned by the editor.
#[derive(Clone, Default)]
pub struct EventBus {
    shared: Arc<Shared>,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("handler_types", &self.shared.handler_types())
            .field("queue_len", &self.shared.pending_len())
            .finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `callback` synchronously for every published `E`.
    ///
    /// Callbacks see the event before it is queued. Wrap mutable state in
    /// `Arc<Mutex<_>>`.
    pub fn subscribe<E, F>(&self, callback: F)
    where
        E: Event,
        F: Fn(&E) + Send + Sync + 'static,
    {
        let handler: Handler = Arc::new(move |any: &dyn Any| {
            if let Some(event) = any.downcast_ref::<E>() {
                callback(event);
            }
        });
        self.shared
            .handlers
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .entry(TypeId::of::<E>())
            .or_default()
            .push(handler);
    }

    pub fn emit<E: Event + Clone>(&self, event: E) {
        self.shared.publish(event);
    }

    /// Take everything queued since the last poll.
    pub fn poll(&self) -> Vec<BoxedEvent> {
        std::mem::take(&mut *self.shared.pending.lock().unwrap_or_else(|e| e.into_inner()))
    }

    /// Handle for components that publish but never subscribe.
    pub fn emitter(&self) -> EventEmitter {
        EventEmitter {
            shared: Arc::clone(&self.shared),
        }
    }

    pub fn queue_len(&self) -> usize {
        self.shared.pending_len()
    }
}

/// Publishing half of an [`EventBus`].
#[derive(Clone)]
pub struct EventEmitter {
    shared: Arc<Shared>,
}

impl std::fmt::Debug for EventEmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventEmitter")
            .field("handler_types", &self.shared.handler_types())
            .field("queue_len", &self.shared.pending_len())
            .finish()
    }
}

impl EventEmitter {
    pub fn emit<E: Event + Clone>(&self, event: E) {
        self.shared.publish(event);
    }
}

/// Optional emitter held by the store, the player and the dialog.
///
/// `dummy()` swallows everything, so components work before (or without)
/// a bus being wired in.
#[derive(Clone, Default, Debug)]
pub struct EditorEventEmitter {
    inner: Option<EventEmitter>,
}

impl EditorEventEmitter {
    pub fn dummy() -> Self {
        Self { inner: None }
    }

    pub fn from_emitter(emitter: EventEmitter) -> Self {
        Self {
            inner: Some(emitter),
        }
    }

    pub fn emit<E: Event + Clone>(&self, event: E) {
        if let Some(ref emitter) = self.inner {
            emitter.emit(event);
        }
    }
}

/// Downcast a queued event to its concrete type.
///
/// Must deref to `dyn Event` before `as_any()`: the blanket impl also covers
/// `Box<dyn Event>`, which would otherwise hand back the box's own TypeId.
#[inline]
pub fn downcast_event<E: Event>(event: &BoxedEvent) -> Option<&E> {
    (**event).as_any().downcast_ref::<E>()
}

/// Clone out every event of type `E` from a drained batch, in queue order.
pub fn events_of<E: Event + Clone>(events: &[BoxedEvent]) -> Vec<E> {
    events.iter().filter_map(|e| downcast_event::<E>(e).cloned()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicI32, Ordering};

    #[derive(Clone, Debug)]
    struct Shifted {
        delta: i32,
    }

    #[derive(Clone, Debug)]
    struct Notice(String);

    #[test]
    fn test_subscribe_emit_immediate() {
        let bus = EventBus::new();
        let counter = Arc::new(AtomicI32::new(0));
        let c = Arc::clone(&counter);
        bus.subscribe::<Shifted, _>(move |e| {
            c.fetch_add(e.delta, Ordering::SeqCst);
        });

        bus.emit(Shifted { delta: -1 });
        bus.emitter().emit(Shifted { delta: -1 });
        assert_eq!(counter.load(Ordering::SeqCst), -2);
    }

    #[test]
    fn test_emit_queues_for_poll() {
        let bus = EventBus::new();
        bus.emit(Shifted { delta: 1 });
        bus.emit(Notice("hello".into()));

        let events = bus.poll();
        assert_eq!(events.len(), 2);
        assert!(downcast_event::<Shifted>(&events[0]).is_some());
        let notices = events_of::<Notice>(&events);
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].0, "hello");
        assert_eq!(bus.poll().len(), 0);
    }

    #[test]
    fn test_dummy_emitter_is_silent() {
        let emitter = EditorEventEmitter::dummy();
        emitter.emit(Shifted { delta: 3 });

        let bus = EventBus::new();
        let wired = EditorEventEmitter::from_emitter(bus.emitter());
        wired.emit(Shifted { delta: 3 });
        assert_eq!(bus.queue_len(), 1);
    }

    #[test]
    fn test_full_queue_drops_oldest_half() {
        let bus = EventBus::new();
        for i in 0..MAX_QUEUE_SIZE as i32 {
            bus.emit(Shifted { delta: i });
        }
        bus.emit(Shifted { delta: -1 });

        let shifted = events_of::<Shifted>(&bus.poll());
        assert_eq!(shifted.len(), MAX_QUEUE_SIZE / 2 + 1);
        assert_eq!(shifted[0].delta, (MAX_QUEUE_SIZE / 2) as i32);
        assert_eq!(shifted.last().map(|s| s.delta), Some(-1));
    }
}
