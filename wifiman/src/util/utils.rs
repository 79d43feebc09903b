//! Small helpers shared across the crate.
//!
//! Lenient number parsing for loosely-typed options, poison-tolerant mutex
//! locking, and the `try_log!` macro for best-effort queries.

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Parses the leading decimal digits of `raw` as a positive integer.
///
/// Leading whitespace and a `+` sign are skipped, trailing garbage is ignored
/// (`"15s"` parses as 15). Returns `None` when there are no leading digits,
/// when the value is zero or negative, or on overflow.
pub(crate) fn parse_leading_int(raw: &str) -> Option<u64> {
    let trimmed = raw.trim_start();
    let unsigned = trimmed.strip_prefix('+').unwrap_or(trimmed);
    let digits_end = unsigned
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(unsigned.len());

    unsigned[..digits_end]
        .parse::<u64>()
        .ok()
        .filter(|value| *value > 0)
}

/// Locks a mutex, recovering the guard if a previous holder panicked.
///
/// A panicking user callback must not wedge the radio state for the rest of
/// the process.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Macro to convert Result to Option with error logging.
/// Usage: `try_log!(result, "context message")`
#[macro_export]
macro_rules! try_log {
    ($result:expr, $context:expr) => {
        match $result {
            Ok(value) => value,
            Err(e) => {
                log::warn!("{}: {}", $context, e);
                return None;
            }
        }
    };
}
