//! Subscriber list for [`WifiEvent`]s.
//!
//! Listeners are either callbacks or channel senders backing an event
//! stream. Emission snapshots the list and delivers outside the lock, so a
//! listener may subscribe, unsubscribe or call back into the manager.

use futures::channel::mpsc::{self, UnboundedReceiver, UnboundedSender};
use log::debug;
use std::sync::{Arc, Mutex};

use crate::api::models::WifiEvent;
use crate::util::utils::lock;

/// Callback invoked for every emitted event.
pub type Listener = Arc<dyn Fn(&WifiEvent) + Send + Sync + 'static>;

/// Identifies a subscription for later removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

#[derive(Clone)]
enum Sink {
    Callback(Listener),
    Channel(UnboundedSender<WifiEvent>),
}

impl Sink {
    fn deliver(&self, event: &WifiEvent) {
        match self {
            Sink::Callback(listener) => listener(event),
            Sink::Channel(tx) => {
                // A closed receiver is pruned on the next emit.
                let _ = tx.unbounded_send(event.clone());
            }
        }
    }

    fn is_closed(&self) -> bool {
        matches!(self, Sink::Channel(tx) if tx.is_closed())
    }
}

pub(crate) struct EventBus {
    inner: Mutex<Subscribers>,
}

struct Subscribers {
    next_id: u64,
    sinks: Vec<(SubscriptionId, Sink)>,
}

impl EventBus {
    pub(crate) fn new() -> Self {
        Self {
            inner: Mutex::new(Subscribers {
                next_id: 1,
                sinks: Vec::new(),
            }),
        }
    }

    pub(crate) fn subscribe(&self, listener: Listener) -> SubscriptionId {
        self.add(Sink::Callback(listener))
    }

    /// Returns a stream receiving every event emitted from now on.
    pub(crate) fn stream(&self) -> UnboundedReceiver<WifiEvent> {
        let (tx, rx) = mpsc::unbounded();
        self.add(Sink::Channel(tx));
        rx
    }

    pub(crate) fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subs = lock(&self.inner);
        let before = subs.sinks.len();
        subs.sinks.retain(|(sid, _)| *sid != id);
        subs.sinks.len() != before
    }

    pub(crate) fn emit(&self, event: &WifiEvent) {
        let sinks: Vec<Sink> = {
            let mut subs = lock(&self.inner);
            subs.sinks.retain(|(_, sink)| !sink.is_closed());
            subs.sinks.iter().map(|(_, sink)| sink.clone()).collect()
        };

        debug!("Emitting '{}' to {} listener(s)", event.name(), sinks.len());
        for sink in &sinks {
            sink.deliver(event);
        }
    }

    pub(crate) fn listener_count(&self) -> usize {
        lock(&self.inner).sinks.len()
    }

    fn add(&self, sink: Sink) -> SubscriptionId {
        let mut subs = lock(&self.inner);
        let id = SubscriptionId(subs.next_id);
        subs.next_id += 1;
        subs.sinks.push((id, sink));
        id
    }
}
