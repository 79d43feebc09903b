//! Queries of the radio's current connection.

pub(crate) mod info;
