use serde::{Deserialize, Deserializer, Serialize};
use std::fmt::{self, Debug, Display, Formatter};
use std::net::Ipv4Addr;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use crate::types::constants::{limits, security_names, timeouts};
use crate::util::utils::parse_leading_int;

/// Lifecycle state of the radio connection.
///
/// The machine never terminates: `Error` is left again by the next
/// `connect`, `reset` or `enable` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum WifiState {
    /// The radio is switched off.
    #[default]
    Disabled,
    /// The radio is on but not associated with any network.
    Idle,
    /// A connect command was accepted and is awaiting completion.
    Connecting,
    /// Associated with an access point.
    Connected,
    /// A disconnect command was accepted and is awaiting completion.
    Disconnecting,
    /// The last attempt failed, timed out, or the chip reported a hang.
    Error,
}

impl Display for WifiState {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disabled => write!(f, "disabled"),
            Self::Idle => write!(f, "idle"),
            Self::Connecting => write!(f, "connecting"),
            Self::Connected => write!(f, "connected"),
            Self::Disconnecting => write!(f, "disconnecting"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Wi-Fi security types supported by the radio.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SecurityType {
    #[default]
    Wpa2,
    Wpa,
    Wep,
    Unsecured,
}

impl SecurityType {
    /// Returns the lowercase name the driver expects.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Wpa2 => security_names::WPA2,
            Self::Wpa => security_names::WPA,
            Self::Wep => security_names::WEP,
            Self::Unsecured => security_names::UNSECURED,
        }
    }

    /// Whether a password must accompany a connect request.
    pub fn requires_password(&self) -> bool {
        !matches!(self, Self::Unsecured)
    }
}

impl Display for SecurityType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SecurityType {
    type Err = WifiError;

    /// Parses a security name, ignoring ASCII case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.to_ascii_lowercase();
        match lowered.as_str() {
            security_names::WPA2 => Ok(Self::Wpa2),
            security_names::WPA => Ok(Self::Wpa),
            security_names::WEP => Ok(Self::Wep),
            security_names::UNSECURED => Ok(Self::Unsecured),
            _ => Err(WifiError::InvalidSecurityType(s.to_string())),
        }
    }
}

/// Options for a connect request, as supplied by application code.
///
/// Fields are loose: `security` is a free-form string and
/// `timeout` accepts numbers or numeric strings when deserialized. Call
/// [`ConnectOptions::validate`] (done by `connect`) to obtain a checked
/// [`ConnectionRequest`].
///
/// # Example
///
/// ```
/// use wifiman::{ConnectOptions, SecurityType};
///
/// let request = ConnectOptions::new("home")
///     .with_password("secret123")
///     .with_security("WPA2")
///     .validate_default()
///     .unwrap();
/// assert_eq!(request.security, SecurityType::Wpa2);
/// assert_eq!(request.timeout.as_secs(), 20);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectOptions {
    #[serde(default)]
    pub ssid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security: Option<String>,
    /// Timeout in whole seconds.
    #[serde(
        default,
        deserialize_with = "lenient_seconds",
        skip_serializing_if = "Option::is_none"
    )]
    pub timeout: Option<u64>,
}

impl ConnectOptions {
    /// Creates options for the given SSID with every other field defaulted.
    pub fn new(ssid: impl Into<String>) -> Self {
        Self {
            ssid: ssid.into(),
            ..Self::default()
        }
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    pub fn with_security(mut self, security: impl Into<String>) -> Self {
        self.security = Some(security.into());
        self
    }

    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout = Some(seconds);
        self
    }

    /// Checks the options and resolves defaults.
    ///
    /// `default_timeout` is used when no timeout was given or it is zero.
    ///
    /// # Errors
    ///
    /// - `MissingSsid` if the SSID is empty
    /// - `SsidTooLong` if the SSID exceeds 32 bytes, the radio's buffer size;
    ///   checked only once the SSID is known to be non-empty
    /// - `InvalidSecurityType` for anything other than wpa2, wpa, wep or unsecured
    /// - `MissingPassword` if a secured network has no (or an empty) password
    pub fn validate(&self, default_timeout: Duration) -> Result<ConnectionRequest, WifiError> {
        if self.ssid.is_empty() {
            return Err(WifiError::MissingSsid);
        }

        if self.ssid.len() > limits::SSID_MAX_LEN {
            return Err(WifiError::SsidTooLong(self.ssid.len()));
        }

        let security = match self.security.as_deref() {
            None | Some("") => SecurityType::default(),
            Some(raw) => raw.parse()?,
        };

        let timeout = match self.timeout {
            Some(seconds) if seconds > 0 => Duration::from_secs(seconds),
            _ => default_timeout,
        };

        let password = self.password.clone().filter(|p| !p.is_empty());
        if password.is_none() && security.requires_password() {
            return Err(WifiError::MissingPassword(security));
        }

        Ok(ConnectionRequest {
            ssid: self.ssid.clone(),
            password,
            security,
            timeout,
        })
    }

    /// Like [`validate`](Self::validate), using the built-in 20 second default timeout.
    pub fn validate_default(&self) -> Result<ConnectionRequest, WifiError> {
        self.validate(timeouts::connect_timeout())
    }
}

/// Accepts a JSON number or a numeric string; anything else means "not given".
fn lenient_seconds<'de, D>(deserializer: D) -> std::result::Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        serde_json::Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 1.0).map(|f| f.trunc() as u64))
            .filter(|secs| *secs > 0),
        serde_json::Value::String(s) => parse_leading_int(&s),
        _ => None,
    }))
}

/// A validated connect request.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionRequest {
    pub ssid: String,
    /// Always present unless `security` is `Unsecured`.
    pub password: Option<String>,
    pub security: SecurityType,
    pub timeout: Duration,
}

impl Debug for ConnectionRequest {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionRequest")
            .field("ssid", &self.ssid)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("security", &self.security)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Network metadata reported by the driver for the current association.
///
/// Parsed from the driver's JSON status payload, e.g.
/// `{"event": "status", "connected": 1, "ip": "10.0.0.12", "ssid": "home"}`.
/// Fields the crate does not know about are kept in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConnectionInfo {
    #[serde(default, deserialize_with = "flag")]
    pub connected: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip: Option<Ipv4Addr>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dns: Option<Ipv4Addr>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dhcp: Option<Ipv4Addr>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gateway: Option<Ipv4Addr>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ConnectionInfo {
    /// Parses a driver status payload.
    ///
    /// # Errors
    ///
    /// Returns `MalformedPayload` if the payload is not a JSON object of the
    /// expected shape.
    pub fn parse(payload: &str) -> Result<Self, WifiError> {
        serde_json::from_str(payload).map_err(|e| WifiError::MalformedPayload(e.to_string()))
    }
}

/// The chip reports `connected` as 0/1; other producers use booleans.
fn flag<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
    }

    Ok(match Flag::deserialize(deserializer)? {
        Flag::Bool(b) => b,
        Flag::Int(n) => n != 0,
    })
}

/// Why a `Disconnected` event was emitted.
///
/// Failed connect attempts and link loss are reported on the same channel
/// but kept apart here so listeners can tell them apart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisconnectReason {
    /// The driver reported that an association attempt failed.
    ConnectFailed(String),
    /// The link went down, after a disconnect request or on its own.
    LinkDown,
}

impl Display for DisconnectReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConnectFailed(reason) => write!(f, "connection failed: {reason}"),
            Self::LinkDown => write!(f, "WiFi disconnected"),
        }
    }
}

/// Notifications delivered to subscribers of a
/// [`ConnectionManager`](crate::ConnectionManager).
#[derive(Debug, Clone, PartialEq)]
pub enum WifiEvent {
    /// Association completed; carries the parsed network metadata.
    Connected(ConnectionInfo),
    /// A connect attempt failed or the link went down.
    Disconnected(DisconnectReason),
    /// A connect attempt did not complete within its timeout.
    Timeout,
    /// An asynchronous failure: busy driver, malformed payload or hang.
    Error(WifiError),
}

impl WifiEvent {
    /// Short event name: `connect`, `disconnect`, `timeout` or `error`.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Connected(_) => "connect",
            Self::Disconnected(_) => "disconnect",
            Self::Timeout => "timeout",
            Self::Error(_) => "error",
        }
    }
}

/// Connection manager configuration.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use wifiman::ManagerConfig;
///
/// let config = ManagerConfig::new().with_default_timeout(Duration::from_secs(45));
/// assert_eq!(config.default_timeout, Duration::from_secs(45));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ManagerConfig {
    /// Timeout applied to connect requests that do not specify one.
    pub default_timeout: Duration,
}

impl ManagerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the default connect timeout. A zero duration keeps the built-in default.
    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        if !timeout.is_zero() {
            self.default_timeout = timeout;
        }
        self
    }
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            default_timeout: timeouts::connect_timeout(),
        }
    }
}

/// Broad classes of [`WifiError`], matching how each one is delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Bad options; returned synchronously before any hardware call.
    Validation,
    /// The driver rejected a command because another is in flight.
    Busy,
    /// No driver completion arrived in time.
    Timeout,
    /// The driver returned a success payload that could not be parsed.
    MalformedPayload,
    /// The chip stopped responding.
    Hang,
    /// The driver reported a failed or abandoned attempt.
    Connection,
    /// The crate was used without the runtime pieces it needs.
    Runtime,
}

/// Errors that can occur while managing the radio connection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WifiError {
    /// The connect options carried no SSID.
    #[error("no SSID given")]
    MissingSsid,

    /// The SSID is longer than the radio accepts.
    #[error("SSID is {0} bytes long (at most 32 allowed)")]
    SsidTooLong(usize),

    /// The security string names no supported type.
    #[error(
        "{0} is not a supported security type. Supported types are 'wpa2', 'wpa', 'wep', and 'unsecured'"
    )]
    InvalidSecurityType(String),

    /// A secured network was requested without a password.
    #[error("no password given for a network with security type {0}")]
    MissingPassword(SecurityType),

    /// The driver is still busy with an earlier connect/disconnect cycle.
    #[error("previous connect in progress")]
    ConnectInProgress,

    /// The driver refused to disconnect because it is busy.
    #[error("could not disconnect, WiFi is currently busy")]
    DisconnectBusy,

    /// The connect attempt did not complete in time.
    #[error("connection timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    /// The driver's success payload could not be parsed.
    #[error("malformed connection payload: {0}")]
    MalformedPayload(String),

    /// The chip reported that it is hanging.
    #[error("WiFi chip is hanging")]
    Hang,

    /// The driver reported a failed association.
    #[error("connection failed: {0}")]
    ConnectFailed(String),

    /// A newer connect request replaced this one before it completed.
    #[error("connect request superseded by a newer one")]
    Superseded,

    /// The request's completion was dropped without an outcome.
    #[error("connect request dropped before completion")]
    Canceled,

    /// A radio reset dropped the request before the driver answered.
    #[error("request abandoned by a radio reset")]
    Reset,

    /// No process-wide connection manager has been installed.
    #[error("connection manager not installed")]
    NotInstalled,

    /// No tokio runtime is available to drive timers.
    #[error("no tokio runtime available")]
    NoRuntime,
}

impl WifiError {
    /// Returns the class this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingSsid
            | Self::SsidTooLong(_)
            | Self::InvalidSecurityType(_)
            | Self::MissingPassword(_) => ErrorKind::Validation,
            Self::ConnectInProgress | Self::DisconnectBusy => ErrorKind::Busy,
            Self::Timeout(_) => ErrorKind::Timeout,
            Self::MalformedPayload(_) => ErrorKind::MalformedPayload,
            Self::Hang => ErrorKind::Hang,
            Self::ConnectFailed(_) | Self::Superseded | Self::Canceled | Self::Reset => {
                ErrorKind::Connection
            }
            Self::NotInstalled | Self::NoRuntime => ErrorKind::Runtime,
        }
    }
}
