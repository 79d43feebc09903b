//! Constants for the radio driver interface.
//!
//! These correspond to the status codes returned by the chip driver and the
//! limits imposed by 802.11 and the radio's own buffers.

/// Driver command status codes.
pub mod status {
    /// The driver accepted the command; anything else means it is busy.
    pub const ACCEPTED: i32 = 0;
}

/// Size limits for connection parameters.
pub mod limits {
    /// Maximum SSID length in bytes (802.11, and the chip's SSID buffer).
    pub const SSID_MAX_LEN: usize = 32;
}

/// Security type names accepted in connect options.
pub mod security_names {
    pub const WPA2: &str = "wpa2";
    pub const WPA: &str = "wpa";
    pub const WEP: &str = "wep";
    pub const UNSECURED: &str = "unsecured";
}

/// Timeout constants for connection attempts.
pub mod timeouts {
    use std::time::Duration;

    /// How long a connect attempt may run before a timeout is reported (20 seconds).
    const CONNECT_TIMEOUT_SECS: u64 = 20;

    /// Returns the default connect timeout duration.
    pub fn connect_timeout() -> Duration {
        Duration::from_secs(CONNECT_TIMEOUT_SECS)
    }
}
