//! Current connection descriptor, read straight from the driver.

use crate::api::models::ConnectionInfo;
use crate::driver::Driver;
use crate::try_log;

/// Returns the chip's current connection descriptor.
///
/// Returns `None` if the driver has no status payload, if the payload cannot
/// be parsed (logged), or if it reports no active connection.
pub(crate) fn current_connection(driver: &dyn Driver) -> Option<ConnectionInfo> {
    let payload = driver.current_connection_info()?;
    let info = try_log!(
        ConnectionInfo::parse(&payload),
        "Failed to parse connection status"
    );
    info.connected.then_some(info)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::SecurityType;

    struct StatusOnly(Option<&'static str>);

    impl Driver for StatusOnly {
        fn connect(&self, _: &str, _: Option<&str>, _: SecurityType) -> i32 {
            0
        }
        fn disconnect(&self) -> i32 {
            0
        }
        fn is_connected(&self) -> bool {
            false
        }
        fn is_busy(&self) -> bool {
            false
        }
        fn is_enabled(&self) -> bool {
            true
        }
        fn mac_address(&self) -> String {
            String::new()
        }
        fn current_connection_info(&self) -> Option<String> {
            self.0.map(str::to_string)
        }
        fn enable(&self) {}
        fn disable(&self) {}
    }

    #[test]
    fn returns_descriptor_when_connected() {
        let driver = StatusOnly(Some(r#"{"connected":1,"ssid":"home","ip":"10.0.0.5"}"#));
        let info = current_connection(&driver).unwrap();
        assert_eq!(info.ssid.as_deref(), Some("home"));
    }

    #[test]
    fn returns_none_when_not_connected() {
        let driver = StatusOnly(Some(r#"{"event":"status","connected":0}"#));
        assert!(current_connection(&driver).is_none());
    }

    #[test]
    fn returns_none_without_or_with_bad_payload() {
        assert!(current_connection(&StatusOnly(None)).is_none());
        assert!(current_connection(&StatusOnly(Some("{garbage"))).is_none());
    }
}
