use super::{EventHandler, SlicerEvent};

/// Handle returned by [`EventBus::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// A simple event bus for broadcasting controller events to registered handlers
pub struct EventBus {
    handlers: Vec<(SubscriptionId, Box<dyn EventHandler>)>,
    next_id: u64,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("handlers", &format!("<{} handlers>", self.handlers.len()))
            .finish()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    /// Creates a new event bus
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
            next_id: 1,
        }
    }

    /// Subscribe a handler to receive events
    pub fn subscribe(&mut self, handler: impl EventHandler + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.handlers.push((id, Box::new(handler)));
        id
    }

    /// Returns false if the subscription was already gone
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.handlers.len();
        self.handlers.retain(|(handler_id, _)| *handler_id != id);
        self.handlers.len() != before
    }

    /// Emit an event to all registered handlers, in registration order
    pub fn emit(&mut self, event: SlicerEvent) {
        for (_, handler) in &mut self.handlers {
            handler.handle_event(&event);
        }
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_handlers_run_in_registration_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut bus = EventBus::new();

        let first = Rc::clone(&log);
        bus.subscribe(move |_: &SlicerEvent| first.borrow_mut().push("first"));
        let second = Rc::clone(&log);
        bus.subscribe(move |_: &SlicerEvent| second.borrow_mut().push("second"));

        bus.emit(SlicerEvent::Status("hello".into()));
        assert_eq!(*log.borrow(), vec!["first", "second"]);
    }

    #[test]
    fn test_unsubscribe() {
        let count = Rc::new(RefCell::new(0));
        let mut bus = EventBus::new();
        let counter = Rc::clone(&count);
        let id = bus.subscribe(move |_: &SlicerEvent| *counter.borrow_mut() += 1);

        bus.emit(SlicerEvent::SelectionChanged(None));
        assert!(bus.unsubscribe(id));
        assert!(!bus.unsubscribe(id));
        bus.emit(SlicerEvent::SelectionChanged(None));

        assert_eq!(*count.borrow(), 1);
        assert!(bus.is_empty());
    }
}
