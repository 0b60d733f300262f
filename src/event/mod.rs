mod bus;
mod events;

pub use bus::{EventBus, SubscriptionId};
pub use events::{ExportProgress, SessionInfo, SlicerEvent};

/// Receives controller notifications, synchronously and in registration order.
pub trait EventHandler {
    fn handle_event(&mut self, event: &SlicerEvent);
}

impl<F> EventHandler for F
where
    F: FnMut(&SlicerEvent),
{
    fn handle_event(&mut self, event: &SlicerEvent) {
        self(event)
    }
}
