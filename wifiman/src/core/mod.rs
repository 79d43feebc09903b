//! Core connection state machine.
//!
//! The public [`ConnectionManager`](crate::ConnectionManager) is a thin
//! handle over [`connection::ConnectionCore`], which owns the driver, the
//! notifier, the event bus and the pending request slot.

pub(crate) mod connection;
pub(crate) mod device;
pub(crate) mod events;
pub(crate) mod pending;
