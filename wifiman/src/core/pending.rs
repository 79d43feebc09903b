//! The single in-flight connect request.
//!
//! Both the timeout timer and the driver completion path try to take the
//! slot; only the one that finds its [`RequestId`] still there resolves the
//! request, so its callback runs at most once.

use std::time::Duration;

use crate::Result;
use crate::api::models::ConnectionInfo;
use crate::notifier::TimerHandle;

/// One-shot completion handler for a connect request.
pub type ConnectCallback = Box<dyn FnOnce(Result<ConnectionInfo>) + Send + 'static>;

/// One-shot completion handler for a disconnect request.
pub type DisconnectCallback = Box<dyn FnOnce(Result<()>) + Send + 'static>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RequestId(u64);

pub(crate) struct PendingConnect {
    pub(crate) id: RequestId,
    pub(crate) timeout: Duration,
    pub(crate) timer: Option<TimerHandle>,
    callback: Option<ConnectCallback>,
}

impl PendingConnect {
    /// Runs the callback, if any, consuming the request.
    pub(crate) fn resolve(self, result: Result<ConnectionInfo>) {
        if let Some(callback) = self.callback {
            callback(result);
        }
    }

    pub(crate) fn into_callback(self) -> Option<ConnectCallback> {
        self.callback
    }
}

#[derive(Default)]
pub(crate) struct PendingSlot {
    next_id: u64,
    current: Option<PendingConnect>,
}

impl PendingSlot {
    /// Starts a new request, returning its id and whatever request it replaced.
    pub(crate) fn begin(
        &mut self,
        timeout: Duration,
        callback: Option<ConnectCallback>,
    ) -> (RequestId, Option<PendingConnect>) {
        self.next_id += 1;
        let id = RequestId(self.next_id);
        let replaced = self.current.replace(PendingConnect {
            id,
            timeout,
            timer: None,
            callback,
        });
        (id, replaced)
    }

    /// Attaches a timer to request `id`. Returns false if that request has
    /// already been resolved, in which case the caller must cancel the timer.
    pub(crate) fn arm(&mut self, id: RequestId, timer: TimerHandle) -> bool {
        match self.current.as_mut() {
            Some(pending) if pending.id == id => {
                pending.timer = Some(timer);
                true
            }
            _ => false,
        }
    }

    /// Puts back a request displaced by `begin`, unless something newer holds the slot.
    pub(crate) fn restore(&mut self, previous: PendingConnect) {
        if self.current.is_none() {
            self.current = Some(previous);
        }
    }

    pub(crate) fn take(&mut self) -> Option<PendingConnect> {
        self.current.take()
    }

    /// Takes the request only if it is still `id`.
    pub(crate) fn take_if(&mut self, id: RequestId) -> Option<PendingConnect> {
        match self.current.as_ref() {
            Some(pending) if pending.id == id => self.current.take(),
            _ => None,
        }
    }

    pub(crate) fn is_pending(&self) -> bool {
        self.current.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::WifiError;
    use std::sync::{Arc, Mutex};

    const TIMEOUT: Duration = Duration::from_secs(20);

    fn capture() -> (ConnectCallback, Arc<Mutex<Vec<Result<ConnectionInfo>>>>) {
        let results = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&results);
        let callback: ConnectCallback = Box::new(move |r| sink.lock().unwrap().push(r));
        (callback, results)
    }

    #[test]
    fn only_matching_id_can_take() {
        let mut slot = PendingSlot::default();
        let (first, _) = slot.begin(TIMEOUT, None);
        let (second, replaced) = slot.begin(TIMEOUT, None);

        assert_eq!(replaced.map(|p| p.id), Some(first));
        assert!(slot.take_if(first).is_none());
        assert!(slot.is_pending());
        assert_eq!(slot.take_if(second).map(|p| p.id), Some(second));
        assert!(!slot.is_pending());
    }

    #[test]
    fn arm_fails_after_resolution() {
        let mut slot = PendingSlot::default();
        let (id, _) = slot.begin(TIMEOUT, None);
        assert!(slot.arm(id, TimerHandle::new(1)));
        assert_eq!(slot.take().and_then(|p| p.timer), Some(TimerHandle::new(1)));
        assert!(!slot.arm(id, TimerHandle::new(2)));
    }

    #[test]
    fn restore_only_fills_an_empty_slot() {
        let mut slot = PendingSlot::default();
        let (first, _) = slot.begin(TIMEOUT, None);
        let (second, replaced) = slot.begin(TIMEOUT, None);
        let replaced = replaced.unwrap();
        assert_eq!(replaced.id, first);

        // Only an empty slot takes the displaced request back.
        assert_eq!(slot.take_if(second).map(|p| p.id), Some(second));
        slot.restore(replaced);
        assert!(slot.take_if(first).is_some());

        let (third, _) = slot.begin(TIMEOUT, None);
        let (_, stale) = slot.begin(TIMEOUT, None);
        assert_eq!(stale.as_ref().map(|p| p.id), Some(third));
        slot.restore(stale.unwrap());
        assert!(slot.take_if(third).is_none());
    }

    #[test]
    fn resolve_runs_callback_once() {
        let mut slot = PendingSlot::default();
        let (callback, results) = capture();
        let (id, _) = slot.begin(TIMEOUT, Some(callback));

        if let Some(pending) = slot.take_if(id) {
            pending.resolve(Err(WifiError::Timeout(TIMEOUT)));
        }
        // The completion path finds nothing left to resolve.
        assert!(slot.take().is_none());

        let results = results.lock().unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0], Err(WifiError::Timeout(TIMEOUT)));
    }
}
