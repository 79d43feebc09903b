//! Radio power control and status pass-throughs.
//!
//! None of these wait for hardware confirmation: the toggles are
//! fire-and-forget and the queries read the chip directly at call time.

use log::debug;

use crate::api::models::{ConnectionInfo, WifiError, WifiState};
use crate::core::connection::ConnectionCore;
use crate::monitoring::info::current_connection;
use crate::util::utils::lock;

impl ConnectionCore {
    /// Powers the radio up. A request already in flight keeps its state;
    /// otherwise the state follows the chip (connected or idle).
    pub(crate) fn enable(&self) {
        debug!("Enabling radio");
        self.driver.enable();
        let next = self.powered_state();
        let mut radio = lock(&self.radio);
        if !matches!(
            radio.state,
            WifiState::Connecting | WifiState::Disconnecting
        ) && radio.state != next
        {
            debug!("Radio state {} -> {}", radio.state, next);
            radio.state = next;
        }
    }

    pub(crate) fn disable(&self) {
        debug!("Disabling radio");
        self.driver.disable();
        self.set_state(WifiState::Disabled);
    }

    /// Power-cycles the radio. Best effort: nothing confirms the chip came back.
    ///
    /// Requests still waiting on the driver are resolved with `Reset`, and the
    /// state is re-read from the chip.
    pub(crate) fn reset(&self) {
        debug!("Resetting radio");
        self.driver.disable();
        self.driver.enable();
        self.abandon_requests(WifiError::Reset);
        self.set_state(self.powered_state());
    }

    /// State right after a power-up command, which the chip may not report yet.
    fn powered_state(&self) -> WifiState {
        if self.driver.is_connected() {
            WifiState::Connected
        } else {
            WifiState::Idle
        }
    }

    pub(crate) fn is_connected(&self) -> bool {
        self.driver.is_connected()
    }

    pub(crate) fn is_busy(&self) -> bool {
        self.driver.is_busy()
    }

    pub(crate) fn is_enabled(&self) -> bool {
        self.driver.is_enabled()
    }

    pub(crate) fn mac_address(&self) -> String {
        self.driver.mac_address()
    }

    pub(crate) fn connection(&self) -> Option<ConnectionInfo> {
        current_connection(self.driver.as_ref())
    }
}
