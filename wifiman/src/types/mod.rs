//! Type definitions and constants.
//!
//! This module contains the radio driver constants and connection defaults.

pub(crate) mod constants;
