//! Event receiver trait

use super::events::AppEvent;

/// Receives events from a device
///
/// Returning `true` marks the event as consumed.
pub trait EventReceiver {
    fn on_event(&mut self, event: &AppEvent) -> bool;
}

impl<F> EventReceiver for F
where
    F: FnMut(&AppEvent) -> bool,
{
    fn on_event(&mut self, event: &AppEvent) -> bool {
        self(event)
    }
}
