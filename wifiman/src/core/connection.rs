use log::{debug, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use crate::Result;
use crate::api::models::{
    ConnectOptions, ConnectionInfo, ConnectionRequest, DisconnectReason, ManagerConfig,
    WifiError, WifiEvent, WifiState,
};
use crate::core::events::EventBus;
use crate::core::pending::{
    ConnectCallback, DisconnectCallback, PendingConnect, PendingSlot, RequestId,
};
use crate::driver::{CommandStatus, Driver, DriverEvent};
use crate::monitoring::info::current_connection;
use crate::notifier::Notifier;
use crate::util::utils::lock;

/// Mutable state guarded by the core's mutex.
///
/// Never held while a driver command, user callback or listener runs.
#[derive(Default)]
pub(crate) struct RadioState {
    pub(crate) state: WifiState,
    pub(crate) options: Option<ConnectionRequest>,
    pub(crate) pending: PendingSlot,
    pub(crate) disconnect_waiters: Vec<DisconnectCallback>,
    pub(crate) last_connection_info: Option<ConnectionInfo>,
    pub(crate) started: bool,
}

/// Shared state behind every [`ConnectionManager`](crate::ConnectionManager) handle.
pub(crate) struct ConnectionCore {
    pub(crate) driver: Box<dyn Driver>,
    pub(crate) notifier: Box<dyn Notifier>,
    pub(crate) config: ManagerConfig,
    pub(crate) events: EventBus,
    pub(crate) radio: Mutex<RadioState>,
    kept_alive: AtomicBool,
    me: Weak<ConnectionCore>,
}

impl ConnectionCore {
    /// Builds the core and derives the initial state from the hardware.
    pub(crate) fn new(
        driver: Box<dyn Driver>,
        notifier: Box<dyn Notifier>,
        config: ManagerConfig,
    ) -> Arc<Self> {
        let state = hardware_state(driver.as_ref());
        debug!("Initial radio state: {state}");

        Arc::new_cyclic(|me| Self {
            driver,
            notifier,
            config,
            events: EventBus::new(),
            radio: Mutex::new(RadioState {
                state,
                ..RadioState::default()
            }),
            kept_alive: AtomicBool::new(false),
            me: me.clone(),
        })
    }

    pub(crate) fn state(&self) -> WifiState {
        lock(&self.radio).state
    }

    pub(crate) fn set_state(&self, next: WifiState) {
        let mut radio = lock(&self.radio);
        if radio.state != next {
            debug!("Radio state {} -> {}", radio.state, next);
            radio.state = next;
        }
    }

    /// Validates `options` and issues a single connect command.
    ///
    /// The flow:
    /// 1. Validate synchronously; nothing touches the hardware on failure
    /// 2. Take the liveness lease on the first attempt
    /// 3. Open the pending slot and enter `Connecting` before the driver call,
    ///    so a completion racing the call finds its request
    /// 4. Issue the driver command; a busy driver rolls step 3 back and is
    ///    reported on the next tick
    /// 5. Arm the timeout
    pub(crate) fn connect(
        &self,
        options: &ConnectOptions,
        callback: Option<ConnectCallback>,
    ) -> Result<()> {
        let request = options.validate(self.config.default_timeout)?;
        debug!(
            "Connecting to '{}' | security={} timeout={:?}",
            request.ssid, request.security, request.timeout
        );

        if !self.kept_alive.swap(true, Ordering::SeqCst) {
            self.notifier.keep_alive();
        }

        let timeout = request.timeout;
        let (id, previous_state, replaced) = {
            let mut radio = lock(&self.radio);
            radio.options = Some(request.clone());
            let previous_state = radio.state;
            debug!("Radio state {} -> {}", radio.state, WifiState::Connecting);
            radio.state = WifiState::Connecting;
            let (id, replaced) = radio.pending.begin(timeout, callback);
            (id, previous_state, replaced)
        };

        let status = CommandStatus::from(self.driver.connect(
            &request.ssid,
            request.password.as_deref(),
            request.security,
        ));

        if let CommandStatus::Busy(_) = status {
            warn!("Driver rejected connect to '{}': {status}", request.ssid);
            let (rejected, orphaned) = {
                let mut radio = lock(&self.radio);
                match radio.pending.take_if(id) {
                    Some(rejected) => {
                        if radio.state == WifiState::Connecting {
                            radio.state = previous_state;
                        }
                        if let Some(previous) = replaced {
                            radio.pending.restore(previous);
                        }
                        (Some(rejected), None)
                    }
                    // A completion that raced the rejection already resolved the request.
                    None => (None, replaced),
                }
            };
            if let Some(orphaned) = orphaned {
                self.supersede(orphaned);
            }
            if let Some(rejected) = rejected {
                self.fail_later(WifiError::ConnectInProgress, rejected.into_callback());
            }
            return Ok(());
        }

        if let Some(previous) = replaced {
            self.supersede(previous);
        }

        self.arm_timeout(id, timeout);
        Ok(())
    }

    fn supersede(&self, previous: PendingConnect) {
        debug!("Connect request superseded before completion");
        if let Some(timer) = previous.timer {
            self.notifier.cancel(timer);
        }
        previous.resolve(Err(WifiError::Superseded));
    }

    fn arm_timeout(&self, id: RequestId, timeout: Duration) {
        let me = self.me.clone();
        let timer = self.notifier.schedule(
            timeout,
            Box::new(move || {
                if let Some(core) = me.upgrade() {
                    core.expire(id);
                }
            }),
        );

        let armed = lock(&self.radio).pending.arm(id, timer);
        if !armed {
            // Completed (or timed out) before the timer was registered.
            self.notifier.cancel(timer);
        }
    }

    /// Timeout path: resolves the request if the driver has not already.
    fn expire(&self, id: RequestId) {
        let pending = {
            let mut radio = lock(&self.radio);
            let Some(pending) = radio.pending.take_if(id) else {
                debug!("Timer fired for an already resolved request");
                return;
            };
            radio.state = WifiState::Error;
            pending
        };

        warn!("Connection timed out after {:?}", pending.timeout);
        self.events.emit(&WifiEvent::Timeout);
        let timeout = pending.timeout;
        pending.resolve(Err(WifiError::Timeout(timeout)));
    }

    /// Issues a single disconnect command.
    pub(crate) fn disconnect(&self, callback: Option<DisconnectCallback>) {
        let status = CommandStatus::from(self.driver.disconnect());

        if let CommandStatus::Busy(_) = status {
            warn!("Driver rejected disconnect: {status}");
            self.fail_later(WifiError::DisconnectBusy, callback);
            return;
        }

        let mut radio = lock(&self.radio);
        debug!("Radio state {} -> {}", radio.state, WifiState::Disconnecting);
        radio.state = WifiState::Disconnecting;
        if let Some(callback) = callback {
            radio.disconnect_waiters.push(callback);
        }
    }

    /// Reports `err` on the next tick as an `Error` event, then to `callback`.
    fn fail_later<T>(&self, err: WifiError, callback: Option<Box<dyn FnOnce(Result<T>) + Send>>)
    where
        T: 'static,
    {
        let me = self.me.clone();
        self.notifier.defer(Box::new(move || {
            if let Some(core) = me.upgrade() {
                core.events.emit(&WifiEvent::Error(err.clone()));
            }
            if let Some(callback) = callback {
                callback(Err(err));
            }
        }));
    }

    /// Reacts to an asynchronous driver notification.
    pub(crate) fn handle_driver_event(&self, event: DriverEvent) {
        debug!("Driver event: {event:?}");
        match event {
            DriverEvent::ConnectSucceeded { payload } => self.on_connect_succeeded(&payload),
            DriverEvent::ConnectFailed { reason } => self.on_connect_failed(reason),
            DriverEvent::DisconnectCompleted => self.on_disconnect_completed(),
            DriverEvent::Hang => self.on_hang(),
        }
    }

    fn on_connect_succeeded(&self, payload: &str) {
        let parsed = ConnectionInfo::parse(payload);

        let pending = {
            let mut radio = lock(&self.radio);
            match &parsed {
                Ok(info) => {
                    radio.state = WifiState::Connected;
                    radio.last_connection_info = Some(info.clone());
                }
                Err(_) => radio.state = WifiState::Error,
            }
            radio.pending.take()
        };

        if let Some(timer) = pending.as_ref().and_then(|p| p.timer) {
            self.notifier.cancel(timer);
        }
        if pending.is_none() {
            debug!("Connect completion without a pending request");
        }

        match parsed {
            Ok(info) => {
                debug!("Connected to {:?}", info.ssid);
                self.events.emit(&WifiEvent::Connected(info.clone()));
                if let Some(pending) = pending {
                    pending.resolve(Ok(info));
                }
            }
            Err(err) => {
                warn!("Discarding connect completion: {err}");
                self.events.emit(&WifiEvent::Error(err.clone()));
                if let Some(pending) = pending {
                    pending.resolve(Err(err));
                }
            }
        }
    }

    fn on_connect_failed(&self, reason: String) {
        let pending = {
            let mut radio = lock(&self.radio);
            radio.state = WifiState::Error;
            radio.pending.take()
        };

        if let Some(timer) = pending.as_ref().and_then(|p| p.timer) {
            self.notifier.cancel(timer);
        }

        warn!("Connect attempt failed: {reason}");
        self.events.emit(&WifiEvent::Disconnected(DisconnectReason::ConnectFailed(
            reason.clone(),
        )));
        if let Some(pending) = pending {
            pending.resolve(Err(WifiError::ConnectFailed(reason)));
        }
    }

    fn on_disconnect_completed(&self) {
        let waiters = {
            let mut radio = lock(&self.radio);
            debug!("Radio state {} -> {}", radio.state, WifiState::Idle);
            radio.state = WifiState::Idle;
            std::mem::take(&mut radio.disconnect_waiters)
        };

        self.events.emit(&WifiEvent::Disconnected(DisconnectReason::LinkDown));
        for waiter in waiters {
            waiter(Ok(()));
        }
    }

    fn on_hang(&self) {
        warn!("Driver reports the WiFi chip is hanging");
        self.set_state(WifiState::Error);
        self.events.emit(&WifiEvent::Error(WifiError::Hang));
    }

    /// Emits `Connected` if the radio came up already associated. Runs once.
    pub(crate) fn start(&self) {
        {
            let mut radio = lock(&self.radio);
            if radio.started {
                return;
            }
            radio.started = true;
        }

        if !self.driver.is_connected() {
            debug!("Radio not connected at startup");
            return;
        }

        match current_connection(self.driver.as_ref()) {
            Some(info) => {
                debug!("Radio already connected at startup: {:?}", info.ssid);
                {
                    let mut radio = lock(&self.radio);
                    radio.state = WifiState::Connected;
                    radio.last_connection_info = Some(info.clone());
                }
                self.events.emit(&WifiEvent::Connected(info));
            }
            None => warn!("Radio reports a connection but no usable descriptor"),
        }
    }

    /// Drops every request waiting on the driver, resolving each with `err`.
    pub(crate) fn abandon_requests(&self, err: WifiError) {
        let (pending, waiters) = {
            let mut radio = lock(&self.radio);
            (
                radio.pending.take(),
                std::mem::take(&mut radio.disconnect_waiters),
            )
        };

        if let Some(pending) = pending {
            debug!("Abandoning pending connect request");
            if let Some(timer) = pending.timer {
                self.notifier.cancel(timer);
            }
            pending.resolve(Err(err.clone()));
        }
        for waiter in waiters {
            waiter(Err(err.clone()));
        }
    }

    pub(crate) fn last_connection_info(&self) -> Option<ConnectionInfo> {
        lock(&self.radio).last_connection_info.clone()
    }

    pub(crate) fn last_request(&self) -> Option<ConnectionRequest> {
        lock(&self.radio).options.clone()
    }

    pub(crate) fn has_pending_connect(&self) -> bool {
        lock(&self.radio).pending.is_pending()
    }

    pub(crate) fn kept_alive(&self) -> bool {
        self.kept_alive.load(Ordering::SeqCst)
    }
}

/// State implied by the chip's own status flags.
fn hardware_state(driver: &dyn Driver) -> WifiState {
    if !driver.is_enabled() {
        WifiState::Disabled
    } else if driver.is_connected() {
        WifiState::Connected
    } else {
        WifiState::Idle
    }
}
