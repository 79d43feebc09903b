//! Interface to the radio chip driver.
//!
//! The driver issues raw commands to the chip and reports their completion
//! asynchronously. Completions are fed back to the manager as
//! [`DriverEvent`]s through
//! [`ConnectionManager::handle_driver_event`](crate::ConnectionManager::handle_driver_event).

use std::fmt::{Display, Formatter};

use crate::api::models::SecurityType;
use crate::types::constants::status;

/// Raw operations on the radio chip.
///
/// Every method is a direct hardware call: status reads reflect the chip at
/// call time and are never cached by the manager. Implementations must not
/// report completions synchronously from inside `connect` or `disconnect`;
/// completions travel through the host event loop.
pub trait Driver: Send + Sync {
    /// Starts associating with a network. Returns `0` when the command was
    /// accepted and nonzero when a connect/disconnect cycle is already running.
    fn connect(&self, ssid: &str, password: Option<&str>, security: SecurityType) -> i32;

    /// Drops the current association. Same status convention as `connect`.
    fn disconnect(&self) -> i32;

    fn is_connected(&self) -> bool;

    fn is_busy(&self) -> bool;

    fn is_enabled(&self) -> bool;

    fn mac_address(&self) -> String;

    /// Returns the chip's JSON status payload, if it has one.
    fn current_connection_info(&self) -> Option<String>;

    /// Powers the radio up. Fire-and-forget.
    fn enable(&self);

    /// Powers the radio down. Fire-and-forget.
    fn disable(&self);
}

/// Asynchronous notifications from the driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverEvent {
    /// A connect attempt finished; `payload` is the JSON status descriptor.
    ConnectSucceeded { payload: String },
    /// A connect attempt failed.
    ConnectFailed { reason: String },
    /// The link went down, after a disconnect request or on its own.
    DisconnectCompleted,
    /// The chip stopped responding.
    Hang,
}

/// Outcome of a driver command, decoded from its raw status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandStatus {
    Accepted,
    /// The driver is busy; carries the raw status code.
    Busy(i32),
}

impl From<i32> for CommandStatus {
    fn from(code: i32) -> Self {
        match code {
            status::ACCEPTED => Self::Accepted,
            v => Self::Busy(v),
        }
    }
}

impl Display for CommandStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Accepted => write!(f, "accepted"),
            Self::Busy(v) => write!(f, "busy ({v})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_status_from_code() {
        assert_eq!(CommandStatus::from(0), CommandStatus::Accepted);
        assert_eq!(CommandStatus::from(1), CommandStatus::Busy(1));
        assert_eq!(CommandStatus::from(-1), CommandStatus::Busy(-1));
    }

    #[test]
    fn command_status_display() {
        assert_eq!(format!("{}", CommandStatus::Accepted), "accepted");
        assert_eq!(format!("{}", CommandStatus::Busy(3)), "busy (3)");
    }
}
