//! Single-consumer queue for results of background work.
//!
//! Work that runs off the session's context (an external database lookup,
//! a host callback on another thread) must not touch wrappers directly. It
//! sends a [`SyncMessage`] through a [`Sender`] handle instead, and the
//! session applies queued messages in order when it drains the queue.
//!
//! The channel is unbounded: producers may run on the session's own thread,
//! where nothing drains the queue until they return.
//!
//! [`Sender`]: std::sync::mpsc::Sender

use std::sync::mpsc;

use pathweave_core::{
    identifier::Id,
    model::{PropertyKey, PropertyValue},
};

/// Messages marshalled back into a session.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncMessage {
    /// Set a property on the diagram side, then push it to the host
    SetProperty {
        element: Id,
        key: PropertyKey,
        value: PropertyValue,
    },
    /// The host edited an element; pull its attributes into the diagram
    HostEdited { element: Id },
}

/// The receiving end, owned by a session.
#[derive(Debug)]
pub struct SyncQueue {
    sender: mpsc::Sender<SyncMessage>,
    receiver: mpsc::Receiver<SyncMessage>,
}

impl Default for SyncQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl SyncQueue {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::channel();
        Self { sender, receiver }
    }

    /// Returns a handle for producers. Handles are `Clone + Send`.
    pub fn sender(&self) -> mpsc::Sender<SyncMessage> {
        self.sender.clone()
    }

    /// Takes every message queued so far, without blocking.
    pub fn drain(&self) -> Vec<SyncMessage> {
        self.receiver.try_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;

    #[test]
    fn test_messages_from_threads_arrive_in_order() {
        let queue = SyncQueue::new();
        let sender = queue.sender();

        thread::spawn(move || {
            for name in ["n1", "n2"] {
                sender
                    .send(SyncMessage::HostEdited {
                        element: Id::new(name),
                    })
                    .unwrap();
            }
        })
        .join()
        .unwrap();

        let messages = queue.drain();
        assert_eq!(
            messages,
            vec![
                SyncMessage::HostEdited { element: Id::new("n1") },
                SyncMessage::HostEdited { element: Id::new("n2") },
            ]
        );
        assert!(queue.drain().is_empty());
    }

    #[test]
    fn test_sending_on_consumer_thread_never_blocks() {
        let queue = SyncQueue::new();
        let sender = queue.sender();

        for _ in 0..1000 {
            sender
                .send(SyncMessage::HostEdited { element: Id::new("n1") })
                .unwrap();
        }

        assert_eq!(queue.drain().len(), 1000);
    }
}
