//! Public API: the connection manager handle and its data types.

pub mod connection_manager;
pub mod models;
