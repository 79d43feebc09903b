//! Connection lifecycle management for a WiFi radio attached to a host.
//!
//! This crate sits between application code and a radio chip driver:
//!
//! - Validating connect requests before any hardware is touched
//! - Issuing connect/disconnect commands and enforcing connect timeouts
//! - Tracking a small connection state machine
//! - Publishing one event stream for connects, disconnects, timeouts and errors
//!
//! The chip driver and the host event loop are supplied by the caller through
//! the [`Driver`] and [`Notifier`] traits. [`TokioNotifier`] covers tokio hosts.
//!
//! # Example
//!
//! ```no_run
//! use wifiman::{ConnectOptions, ConnectionManager, Driver, TokioNotifier, WifiEvent};
//!
//! # async fn example(driver: impl Driver + 'static) -> wifiman::Result<()> {
//! let wifi = ConnectionManager::install(driver, TokioNotifier::current()?);
//!
//! wifi.subscribe(|event: &WifiEvent| match event {
//!     WifiEvent::Connected(info) => println!("up: {:?}", info.ip),
//!     WifiEvent::Disconnected(reason) => println!("down: {reason}"),
//!     WifiEvent::Timeout => println!("timed out"),
//!     WifiEvent::Error(err) => println!("error: {err}"),
//! });
//!
//! wifi.connect(
//!     &ConnectOptions::new("MyNetwork")
//!         .with_password("password123")
//!         .with_security("wpa2")
//!         .with_timeout(30),
//! )?;
//! # Ok(())
//! # }
//! ```
//!
//! # Error Handling
//!
//! Only option validation fails synchronously with a [`WifiError`]. Every
//! hardware-level failure (busy driver, timeout, malformed payload, chip
//! hang) is delivered asynchronously as a [`WifiEvent::Error`] or through
//! the request's one-shot callback.
//!
//! # Driver Notifications
//!
//! The driver reports completions asynchronously. The host forwards each one
//! to [`ConnectionManager::handle_driver_event`] from its event loop. A
//! completion that arrives first cancels the request's timeout; a completion
//! that arrives after the timeout still updates state and emits events, but
//! does not call the request's callback a second time.
//!
//! # Logging
//!
//! This crate uses the [`log`](https://docs.rs/log) facade for logging. To see
//! log output, add a logging implementation like `env_logger`. For example:
//!
//! ```no_run,ignore
//! env_logger::init();
//! // ...
//! ```

// Internal implementation modules
mod core;
mod monitoring;
mod types;
mod util;

// Public API modules
pub mod api;
pub mod driver;
pub mod notifier;

// Re-exported public API
pub use api::connection_manager::ConnectionManager;
pub use api::models::{
    ConnectOptions, ConnectionInfo, ConnectionRequest, DisconnectReason, ErrorKind,
    ManagerConfig, SecurityType, WifiError, WifiEvent, WifiState,
};
pub use crate::core::events::{Listener, SubscriptionId};
pub use crate::core::pending::{ConnectCallback, DisconnectCallback};
pub use driver::{CommandStatus, Driver, DriverEvent};
pub use notifier::{Notifier, Task, TimerHandle, TokioNotifier};

/// A specialized `Result` type for WiFi operations.
pub type Result<T> = std::result::Result<T, WifiError>;
