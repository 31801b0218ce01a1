//! Event channel implementation using crossbeam-channel.

use crossbeam_channel::{unbounded, Receiver, Sender};

use super::Event;

/// Publishes race events.
///
/// Cheap to clone. Sending never fails: if nobody is listening the event
/// is dropped, so reporting stays optional.
#[derive(Clone)]
pub struct EventSender {
    inner: Sender<Event>,
}

impl EventSender {
    pub fn send(&self, event: Event) {
        let _ = self.inner.send(event);
    }
}

/// Subscribes to race events
pub struct EventReceiver {
    inner: Receiver<Event>,
}

impl EventReceiver {
    /// Events in order; ends once every sender is dropped
    pub fn iter(&self) -> impl Iterator<Item = Event> + '_ {
        self.inner.iter()
    }
}

/// Create an unbounded event channel
pub fn event_channel() -> (EventSender, EventReceiver) {
    let (sender, receiver) = unbounded();
    (
        EventSender { inner: sender },
        EventReceiver { inner: receiver },
    )
}

/// A sender nobody listens to
pub fn null_sender() -> EventSender {
    let (sender, _receiver) = event_channel();
    sender
}
