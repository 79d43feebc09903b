/// Example driving the connection manager against a simulated radio.
///
/// The simulated chip accepts every command and reports the association a
/// moment later from the host event loop, the way a real driver's interrupt
/// handler would.
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use wifiman::{
    ConnectOptions, ConnectionManager, Driver, DriverEvent, ManagerConfig, SecurityType,
    TokioNotifier, WifiEvent,
};

#[derive(Default)]
struct SimulatedRadio {
    connected: AtomicBool,
}

impl SimulatedRadio {
    fn notify_later(event: DriverEvent) {
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(500)).await;
            if let Ok(wifi) = ConnectionManager::global() {
                wifi.handle_driver_event(event);
            }
        });
    }
}

impl Driver for SimulatedRadio {
    fn connect(&self, ssid: &str, _password: Option<&str>, security: SecurityType) -> i32 {
        println!("  [radio] associating with '{ssid}' ({security})");
        self.connected.store(true, Ordering::SeqCst);
        Self::notify_later(DriverEvent::ConnectSucceeded {
            payload: format!(
                r#"{{"event":"connect","connected":1,"ssid":"{ssid}","ip":"192.168.1.42","gateway":"192.168.1.1","dns":"192.168.1.1","dhcp":"192.168.1.1"}}"#
            ),
        });
        0
    }

    fn disconnect(&self) -> i32 {
        println!("  [radio] dropping association");
        self.connected.store(false, Ordering::SeqCst);
        Self::notify_later(DriverEvent::DisconnectCompleted);
        0
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn is_busy(&self) -> bool {
        false
    }

    fn is_enabled(&self) -> bool {
        true
    }

    fn mac_address(&self) -> String {
        "08:00:28:5a:1f:03".to_string()
    }

    fn current_connection_info(&self) -> Option<String> {
        self.is_connected()
            .then(|| r#"{"event":"status","connected":1,"ssid":"MyNetwork"}"#.to_string())
    }

    fn enable(&self) {}

    fn disable(&self) {}
}

#[tokio::main]
async fn main() -> wifiman::Result<()> {
    // Wait up to 10s for the radio when a request does not say otherwise
    let config = ManagerConfig::new().with_default_timeout(Duration::from_secs(10));

    let wifi = ConnectionManager::install_with_config(
        SimulatedRadio::default(),
        TokioNotifier::current()?,
        config,
    );
    wifi.start();

    wifi.subscribe(|event: &WifiEvent| println!("event: {}", event.name()));

    println!("Radio {} is {}", wifi.mac_address(), wifi.state());

    let info = wifi
        .connect_async(
            &ConnectOptions::new("MyNetwork")
                .with_password(
                    std::env::var("WIFI_PASSWORD").unwrap_or_else(|_| "password".to_string()),
                )
                .with_security("wpa2"),
        )
        .await?;

    println!("Connected to {:?}", info.ssid);
    println!("  IP:      {:?}", info.ip);
    println!("  Gateway: {:?}", info.gateway);
    println!("Current connection: {:?}", wifi.connection().map(|c| c.ssid));

    wifi.disconnect_async().await?;
    println!("Radio is {}", wifi.state());

    Ok(())
}
