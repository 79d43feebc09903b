use futures::channel::mpsc::UnboundedReceiver;
use futures::channel::oneshot;
use log::debug;
use std::sync::{Arc, OnceLock};

use crate::Result;
use crate::api::models::{
    ConnectOptions, ConnectionInfo, ConnectionRequest, ManagerConfig, WifiError, WifiEvent,
    WifiState,
};
use crate::core::connection::ConnectionCore;
use crate::core::events::{Listener, SubscriptionId};
use crate::driver::{Driver, DriverEvent};
use crate::notifier::Notifier;

static INSTANCE: OnceLock<ConnectionManager> = OnceLock::new();

/// Process-wide owner of the WiFi radio.
///
/// Mediates every access to the radio driver, turns the driver's completion
/// notifications into a small state machine plus an event stream, and
/// enforces connect timeouts.
///
/// # Creating the Instance
///
/// There is one radio, so there is one manager. [`install`](Self::install)
/// creates it on first use; later calls return the same handle and drop the
/// arguments they were given.
///
/// ```no_run
/// use wifiman::{ConnectOptions, ConnectionManager, Driver, TokioNotifier, WifiEvent};
///
/// # async fn example(driver: impl Driver + 'static) -> wifiman::Result<()> {
/// let wifi = ConnectionManager::install(driver, TokioNotifier::current()?);
/// wifi.start();
///
/// wifi.subscribe(|event: &WifiEvent| println!("wifi: {}", event.name()));
///
/// let info = wifi
///     .connect_async(&ConnectOptions::new("home").with_password("secret123"))
///     .await?;
/// println!("connected to {:?} as {:?}", info.ssid, info.ip);
/// # Ok(())
/// # }
/// ```
///
/// # Delivery
///
/// Only option validation fails synchronously. Busy drivers, timeouts,
/// malformed payloads and hangs are reported through [`WifiEvent`]s and the
/// optional one-shot callback of the request that caused them.
///
/// # Thread Safety
///
/// `ConnectionManager` is `Clone`, `Send` and `Sync`; every clone shares the
/// same radio state. Listeners and callbacks run without internal locks
/// held, so they may call back into the manager.
#[derive(Clone)]
pub struct ConnectionManager {
    core: Arc<ConnectionCore>,
}

impl ConnectionManager {
    /// Installs the process-wide manager, or returns the existing one.
    pub fn install<D, N>(driver: D, notifier: N) -> Self
    where
        D: Driver + 'static,
        N: Notifier + 'static,
    {
        Self::install_with_config(driver, notifier, ManagerConfig::default())
    }

    /// Like [`install`](Self::install), with a custom configuration.
    pub fn install_with_config<D, N>(driver: D, notifier: N, config: ManagerConfig) -> Self
    where
        D: Driver + 'static,
        N: Notifier + 'static,
    {
        if let Some(existing) = INSTANCE.get() {
            debug!("Connection manager already installed");
            return existing.clone();
        }

        INSTANCE
            .get_or_init(|| Self::new(Box::new(driver), Box::new(notifier), config))
            .clone()
    }

    /// Returns the installed manager.
    ///
    /// # Errors
    ///
    /// Returns `NotInstalled` if [`install`](Self::install) has not run yet.
    pub fn global() -> Result<Self> {
        INSTANCE.get().cloned().ok_or(WifiError::NotInstalled)
    }

    pub(crate) fn new(
        driver: Box<dyn Driver>,
        notifier: Box<dyn Notifier>,
        config: ManagerConfig,
    ) -> Self {
        Self {
            core: ConnectionCore::new(driver, notifier, config),
        }
    }

    /// Reconciles with the hardware once the host is up.
    ///
    /// If the radio is already associated (for instance across a restart),
    /// emits `Connected` with the current descriptor. Only the first call
    /// does anything.
    pub fn start(&self) -> &Self {
        self.core.start();
        self
    }

    /// Starts connecting to a network.
    ///
    /// The outcome arrives as a `Connected`, `Disconnected`, `Timeout` or
    /// `Error` event.
    ///
    /// # Errors
    ///
    /// Returns a validation error (`MissingSsid`, `SsidTooLong`,
    /// `InvalidSecurityType`, `MissingPassword`) before touching the
    /// hardware. Nothing else is returned here.
    pub fn connect(&self, options: &ConnectOptions) -> Result<&Self> {
        self.core.connect(options, None)?;
        Ok(self)
    }

    /// Like [`connect`](Self::connect), also invoking `callback` exactly once
    /// with the first outcome: driver success, driver failure, timeout, or a
    /// busy driver.
    pub fn connect_with<F>(&self, options: &ConnectOptions, callback: F) -> Result<&Self>
    where
        F: FnOnce(Result<ConnectionInfo>) + Send + 'static,
    {
        self.core.connect(options, Some(Box::new(callback)))?;
        Ok(self)
    }

    /// Connects and waits for the outcome.
    pub async fn connect_async(&self, options: &ConnectOptions) -> Result<ConnectionInfo> {
        let (tx, rx) = oneshot::channel();
        self.connect_with(options, move |result| {
            let _ = tx.send(result);
        })?;
        rx.await.unwrap_or(Err(WifiError::Canceled))
    }

    /// Drops the current association.
    pub fn disconnect(&self) -> &Self {
        self.core.disconnect(None);
        self
    }

    /// Like [`disconnect`](Self::disconnect), invoking `callback` once on the
    /// next disconnect completion, or with `DisconnectBusy` if the driver
    /// refused.
    pub fn disconnect_with<F>(&self, callback: F) -> &Self
    where
        F: FnOnce(Result<()>) + Send + 'static,
    {
        self.core.disconnect(Some(Box::new(callback)));
        self
    }

    /// Disconnects and waits for the driver to confirm.
    pub async fn disconnect_async(&self) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.disconnect_with(move |result| {
            let _ = tx.send(result);
        });
        rx.await.unwrap_or(Err(WifiError::Canceled))
    }

    /// Power-cycles the radio (disable, then enable).
    ///
    /// A pending connect and any disconnect callbacks still waiting are
    /// resolved with `Reset`, and the state is re-read from the chip. Nothing
    /// confirms the chip came back; poll [`is_enabled`](Self::is_enabled) if
    /// that matters.
    pub fn reset(&self) -> &Self {
        self.core.reset();
        self
    }

    /// Like [`reset`](Self::reset), then invokes `callback`.
    pub fn reset_with<F>(&self, callback: F) -> &Self
    where
        F: FnOnce(),
    {
        self.core.reset();
        callback();
        self
    }

    /// Enables the radio. From `Disabled`, `Idle` or `Error` the state follows
    /// the chip: `Connected` if it reports an association, `Idle` otherwise.
    pub fn enable(&self) -> &Self {
        self.core.enable();
        self
    }

    /// Enables the radio, then invokes `callback` without waiting for the chip.
    pub fn enable_with<F>(&self, callback: F) -> &Self
    where
        F: FnOnce(),
    {
        self.core.enable();
        callback();
        self
    }

    pub fn disable(&self) -> &Self {
        self.core.disable();
        self
    }

    /// Disables the radio, then invokes `callback` without waiting for the chip.
    pub fn disable_with<F>(&self, callback: F) -> &Self
    where
        F: FnOnce(),
    {
        self.core.disable();
        callback();
        self
    }

    /// Returns whether the chip reports an active association.
    pub fn is_connected(&self) -> bool {
        self.core.is_connected()
    }

    /// Returns whether a connect/disconnect cycle is in progress on the chip.
    pub fn is_busy(&self) -> bool {
        self.core.is_busy()
    }

    pub fn is_enabled(&self) -> bool {
        self.core.is_enabled()
    }

    pub fn mac_address(&self) -> String {
        self.core.mac_address()
    }

    /// Returns the chip's current connection descriptor, or `None` when it
    /// reports no active connection.
    pub fn connection(&self) -> Option<ConnectionInfo> {
        self.core.connection()
    }

    /// Returns the descriptor from the last successful connect event.
    pub fn last_connection_info(&self) -> Option<ConnectionInfo> {
        self.core.last_connection_info()
    }

    /// Returns the last submitted connect request that passed validation.
    pub fn last_request(&self) -> Option<ConnectionRequest> {
        self.core.last_request()
    }

    pub fn state(&self) -> WifiState {
        self.core.state()
    }

    /// Returns whether a connect request is awaiting its outcome.
    pub fn has_pending_connect(&self) -> bool {
        self.core.has_pending_connect()
    }

    /// Returns whether the liveness lease has been taken.
    pub fn is_kept_alive(&self) -> bool {
        self.core.kept_alive()
    }

    /// Registers a listener for every future event.
    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&WifiEvent) + Send + Sync + 'static,
    {
        let listener: Listener = Arc::new(listener);
        self.core.events.subscribe(listener)
    }

    /// Removes a listener. Returns false if it was not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.core.events.unsubscribe(id)
    }

    /// Number of live subscriptions, streams included.
    pub fn listener_count(&self) -> usize {
        self.core.events.listener_count()
    }

    /// Returns a stream of every future event.
    ///
    /// Dropping the stream unsubscribes it.
    ///
    /// ```ignore
    /// use futures::StreamExt;
    ///
    /// let mut events = wifi.events();
    /// while let Some(event) = events.next().await {
    ///     println!("{}", event.name());
    /// }
    /// ```
    pub fn events(&self) -> UnboundedReceiver<WifiEvent> {
        self.core.events.stream()
    }

    /// Feeds an asynchronous driver notification into the state machine.
    ///
    /// Call from the host's event loop, never from inside a driver command.
    pub fn handle_driver_event(&self, event: DriverEvent) {
        self.core.handle_driver_event(event);
    }
}
