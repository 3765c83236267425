use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use thiserror::Error;

use crate::types::constants::passphrase;

/// Connection state of a managed wireless interface.
///
/// States are ordered: everything up to and including
/// [`Autoconnect`](StationState::Autoconnect) is on the disconnected side,
/// everything after it is on the connected side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum StationState {
    /// Interface is not link-up.
    Off,
    /// Idle, waiting for explicit user direction.
    Disconnected,
    /// Idle, connecting on its own to known networks after each scan.
    Autoconnect,
    /// A connect attempt is outstanding.
    Connecting,
    /// Associated and keyed.
    Connected,
    /// A user-initiated disconnect is outstanding.
    Disconnecting,
}

impl StationState {
    /// Returns `true` for states past [`Autoconnect`](StationState::Autoconnect).
    pub fn is_connected_side(self) -> bool {
        self > StationState::Autoconnect
    }

    /// String exposed through the `State` property.
    ///
    /// The three idle states collapse into `"disconnected"`.
    pub fn bus_str(self) -> &'static str {
        match self {
            StationState::Off | StationState::Disconnected | StationState::Autoconnect => {
                "disconnected"
            }
            StationState::Connecting => "connecting",
            StationState::Connected => "connected",
            StationState::Disconnecting => "disconnecting",
        }
    }

    /// Whether moving from `self` to `next` changes what external clients see.
    pub fn externally_distinct(self, next: StationState) -> bool {
        if self.is_connected_side() {
            self != next
        } else {
            next.is_connected_side()
        }
    }
}

impl Display for StationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StationState::Off => "off",
            StationState::Disconnected => "disconnected",
            StationState::Autoconnect => "autoconnect",
            StationState::Connecting => "connecting",
            StationState::Connected => "connected",
            StationState::Disconnecting => "disconnecting",
        };
        f.write_str(s)
    }
}

/// Security type of a network, derived from capability bits and the
/// advertised RSN/WPA information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Security {
    /// Open network
    None,
    /// Static WEP keys
    Wep,
    /// WPA/WPA2 Personal
    Psk,
    /// WPA/WPA2 Enterprise
    Ieee8021x,
}

impl Security {
    /// Parses the tag used in network paths and bus replies.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "open" => Some(Security::None),
            "wep" => Some(Security::Wep),
            "psk" => Some(Security::Psk),
            "8021x" => Some(Security::Ieee8021x),
            _ => None,
        }
    }

    /// Returns `true` if connecting requires a key exchange.
    pub fn needs_handshake(self) -> bool {
        matches!(self, Security::Psk | Security::Ieee8021x)
    }
}

impl Display for Security {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Security::None => "open",
            Security::Wep => "wep",
            Security::Psk => "psk",
            Security::Ieee8021x => "8021x",
        };
        f.write_str(s)
    }
}

/// Wi-Fi frequency band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Band {
    TwoPointFourGhz,
    FiveGhz,
    SixGhz,
}

/// Terminal outcome of a link-layer connect attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectOutcome {
    Success,
    /// Superseded by a disconnect, link-down or teardown.
    Aborted,
    HandshakeFailed,
    LinkFailed,
}

impl ConnectOutcome {
    /// The error a pending requester receives for this outcome, if any.
    pub fn error(self) -> Option<StationError> {
        match self {
            ConnectOutcome::Success => None,
            ConnectOutcome::Aborted => Some(StationError::Aborted),
            ConnectOutcome::HandshakeFailed => Some(StationError::HandshakeFailed),
            ConnectOutcome::LinkFailed => Some(StationError::LinkFailed),
        }
    }
}

impl Display for ConnectOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectOutcome::Success => write!(f, "success"),
            ConnectOutcome::Aborted => write!(f, "aborted"),
            ConnectOutcome::HandshakeFailed => write!(f, "handshake failed"),
            ConnectOutcome::LinkFailed => write!(f, "link failed"),
        }
    }
}

/// Progress and loss events reported by the link layer for the current
/// connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkEvent {
    Authenticating,
    Associating,
    Handshaking,
    /// The handshake reached key installation.
    SettingKeys,
    LostBeacon,
    /// The access point deauthenticated or disassociated us.
    ApDisconnect,
}

impl Display for LinkEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkEvent::Authenticating => write!(f, "Authenticating"),
            LinkEvent::Associating => write!(f, "Associating"),
            LinkEvent::Handshaking => write!(f, "Handshaking"),
            LinkEvent::SettingKeys => write!(f, "Setting keys"),
            LinkEvent::LostBeacon => write!(f, "Lost beacon"),
            LinkEvent::ApDisconnect => write!(f, "Disconnected by AP"),
        }
    }
}

/// Why a network left the catalogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalReason {
    /// No access point for it remained in the latest scan.
    OutOfRange,
    /// The interface went down or is being torn down.
    Shutdown,
}

impl Display for RemovalReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemovalReason::OutOfRange => write!(f, "out of range"),
            RemovalReason::Shutdown => write!(f, "shutdown"),
        }
    }
}

/// Externally visible properties of an interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceProperty {
    Name,
    ConnectedNetwork,
    Powered,
    Scanning,
    State,
}

/// Events delivered to per-interface watchers.
#[derive(Debug, Clone, PartialEq)]
pub enum StationEvent {
    /// Every state transition, whether or not clients see it.
    StateChanged {
        old: StationState,
        new: StationState,
    },
    /// An interface property changed value.
    PropertyChanged(DeviceProperty),
    /// The `Connected` flag of the network at `path` changed.
    NetworkConnectedChanged { path: String },
    NetworkAdded { path: String },
    /// Sent while the network is still reachable through the catalogue.
    NetworkRemoved { path: String, reason: RemovalReason },
    /// A push-button enrollment found its registrar.
    WscTargetFound { address: [u8; 6] },
}

/// Events delivered to interface-appearance watchers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceEvent {
    /// The interface came up.
    Inserted(u32),
    /// The interface went down or disappeared.
    Removed(u32),
}

/// Pre-shared key material for a personal network.
#[derive(Clone, PartialEq, Eq)]
pub enum Secret {
    /// 8 to 63 character passphrase.
    Passphrase(String),
    /// Raw 256-bit pre-shared key.
    Psk([u8; passphrase::PSK_LEN]),
}

impl Secret {
    /// Validates and wraps a passphrase.
    ///
    /// # Errors
    ///
    /// Returns [`StationError::InvalidInput`] if the passphrase is not
    /// between 8 and 63 characters.
    pub fn passphrase(value: impl Into<String>) -> Result<Self> {
        let value = value.into();
        let len = value.chars().count();
        if !(passphrase::MIN_LEN..=passphrase::MAX_LEN).contains(&len) {
            return Err(StationError::InvalidInput(format!(
                "passphrase must be {}-{} characters, got {len}",
                passphrase::MIN_LEN,
                passphrase::MAX_LEN
            )));
        }
        Ok(Secret::Passphrase(value))
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Secret::Passphrase(_) => f.write_str("Passphrase(<redacted>)"),
            Secret::Psk(_) => f.write_str("Psk(<redacted>)"),
        }
    }
}

/// EAP (Extensible Authentication Protocol) method for 802.1X networks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EapMethod {
    /// Protected EAP (PEAPv0); tunnels inner authentication in TLS.
    Peap,
    /// Tunneled TLS; similar to PEAP with more inner methods.
    Ttls,
    /// Certificate-based mutual authentication.
    Tls,
    /// GSM SIM authentication.
    Sim,
    /// UMTS AKA authentication.
    Aka,
}

impl EapMethod {
    /// Returns `true` for methods that run an inner (phase 2) method.
    pub fn is_tunneled(self) -> bool {
        matches!(self, EapMethod::Peap | EapMethod::Ttls)
    }
}

/// Phase 2 (inner) authentication methods for tunneled EAP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase2 {
    /// Microsoft Challenge Handshake Authentication Protocol v2.
    Mschapv2,
    /// Password Authentication Protocol, protected by the TLS tunnel.
    Pap,
}

/// Enterprise configuration handed to the handshake engine.
///
/// # Examples
///
/// ```rust
/// use iwrs::{EapMethod, EapSettings, Phase2};
///
/// let settings = EapSettings::new(EapMethod::Peap, "employee@company.com")
///     .with_password("my_password")
///     .with_phase2(Phase2::Mschapv2)
///     .with_ca_cert("/etc/ssl/certs/company-ca.pem");
///
/// assert!(settings.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EapSettings {
    /// Outer EAP method
    pub method: EapMethod,
    /// User identity (usually email or username)
    pub identity: String,
    /// Password for tunneled methods
    pub password: Option<String>,
    /// Anonymous outer identity (for privacy)
    pub anonymous_identity: Option<String>,
    /// Path to the CA certificate used to verify the server
    pub ca_cert_path: Option<String>,
    /// Inner authentication method for PEAP/TTLS
    pub phase2: Option<Phase2>,
}

impl EapSettings {
    pub fn new(method: EapMethod, identity: impl Into<String>) -> Self {
        Self {
            method,
            identity: identity.into(),
            password: None,
            anonymous_identity: None,
            ca_cert_path: None,
            phase2: None,
        }
    }

    #[must_use]
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    #[must_use]
    pub fn with_anonymous_identity(mut self, identity: impl Into<String>) -> Self {
        self.anonymous_identity = Some(identity.into());
        self
    }

    #[must_use]
    pub fn with_ca_cert(mut self, path: impl Into<String>) -> Self {
        self.ca_cert_path = Some(path.into());
        self
    }

    #[must_use]
    pub fn with_phase2(mut self, phase2: Phase2) -> Self {
        self.phase2 = Some(phase2);
        self
    }

    /// Checks that a tunneled method has everything its inner method needs.
    ///
    /// # Errors
    ///
    /// Returns [`StationError::InvalidInput`] when the identity is empty, or
    /// a PEAP/TTLS configuration lacks a password or phase 2 method.
    pub fn validate(&self) -> Result<()> {
        if self.identity.trim().is_empty() {
            return Err(StationError::InvalidInput("EAP identity is empty".into()));
        }
        if self.method.is_tunneled() {
            if self.password.is_none() {
                return Err(StationError::InvalidInput(format!(
                    "{:?} requires a password",
                    self.method
                )));
            }
            if self.phase2.is_none() {
                return Err(StationError::InvalidInput(format!(
                    "{:?} requires a phase 2 method",
                    self.method
                )));
            }
        }
        Ok(())
    }
}

/// Credentials for one network, as kept by the credential store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetworkSettings {
    Open,
    Psk(Secret),
    Eap(EapSettings),
}

impl NetworkSettings {
    /// The security type these settings apply to.
    pub fn security(&self) -> Security {
        match self {
            NetworkSettings::Open => Security::None,
            NetworkSettings::Psk(_) => Security::Psk,
            NetworkSettings::Eap(_) => Security::Ieee8021x,
        }
    }
}

/// One entry of the rank-ordered network list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NetworkSummary {
    /// Catalogue key and object path
    pub path: String,
    /// Decoded SSID
    pub name: String,
    /// Strongest signal in mBm (100 * dBm)
    pub signal_strength: i16,
    /// Security type
    pub security: Security,
}

/// Errors that can occur while managing a station.
///
/// Request-level errors are returned synchronously to the caller and never
/// alter state. Asynchronous failures are delivered to the pending
/// requester.
#[derive(Debug, Error)]
pub enum StationError {
    /// A conflicting request is already pending.
    #[error("operation already in progress")]
    Busy,

    /// Disconnect was requested with nothing connected.
    #[error("not connected")]
    NotConnected,

    /// The link layer refused the request.
    #[error("request rejected by link layer")]
    Rejected,

    /// The request was superseded by shutdown or teardown.
    #[error("operation aborted")]
    Aborted,

    /// The key exchange did not complete.
    #[error("handshake failed")]
    HandshakeFailed,

    /// Generic asynchronous failure reported by the link layer.
    #[error("link failed")]
    LinkFailed,

    /// Malformed data from an untrusted source.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The operation cannot be served in the current state.
    #[error("not available")]
    NotAvailable,

    /// No interface or network matches the given identity.
    #[error("not found")]
    NotFound,

    /// No secret is available for a secured network.
    #[error("no secrets available")]
    NoSecrets,

    /// The security configuration cannot be served by this station.
    #[error("not supported")]
    NotSupported,

    /// More than one registrar is in push-button mode.
    #[error("push-button session overlap")]
    SessionOverlap,

    /// A D-Bus communication error occurred.
    #[error("D-Bus error: {0}")]
    Dbus(#[from] zbus::Error),
}

/// Type alias for results with [`StationError`].
pub type Result<T> = std::result::Result<T, StationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_ordering_splits_at_autoconnect() {
        assert!(!StationState::Off.is_connected_side());
        assert!(!StationState::Disconnected.is_connected_side());
        assert!(!StationState::Autoconnect.is_connected_side());
        assert!(StationState::Connecting.is_connected_side());
        assert!(StationState::Connected.is_connected_side());
        assert!(StationState::Disconnecting.is_connected_side());
    }

    #[test]
    fn state_bus_str_collapses_idle_states() {
        assert_eq!(StationState::Off.bus_str(), "disconnected");
        assert_eq!(StationState::Disconnected.bus_str(), "disconnected");
        assert_eq!(StationState::Autoconnect.bus_str(), "disconnected");
        assert_eq!(StationState::Connecting.bus_str(), "connecting");
        assert_eq!(StationState::Connected.bus_str(), "connected");
        assert_eq!(StationState::Disconnecting.bus_str(), "disconnecting");
    }

    #[test]
    fn state_display() {
        assert_eq!(format!("{}", StationState::Off), "off");
        assert_eq!(format!("{}", StationState::Autoconnect), "autoconnect");
        assert_eq!(format!("{}", StationState::Disconnecting), "disconnecting");
    }

    #[test]
    fn externally_distinct_transitions() {
        use StationState::*;

        assert!(!Off.externally_distinct(Autoconnect));
        assert!(!Disconnected.externally_distinct(Autoconnect));
        assert!(!Autoconnect.externally_distinct(Disconnected));
        assert!(Autoconnect.externally_distinct(Connecting));
        assert!(Connecting.externally_distinct(Connected));
        assert!(Connected.externally_distinct(Disconnected));
        assert!(!Connected.externally_distinct(Connected));
    }

    #[test]
    fn security_tags_round_trip() {
        for security in [
            Security::None,
            Security::Wep,
            Security::Psk,
            Security::Ieee8021x,
        ] {
            assert_eq!(Security::from_tag(&security.to_string()), Some(security));
        }
        assert_eq!(Security::from_tag("wpa3"), None);
    }

    #[test]
    fn passphrase_length_is_checked() {
        assert!(Secret::passphrase("short").is_err());
        assert!(Secret::passphrase("long enough").is_ok());
        assert!(Secret::passphrase("x".repeat(63)).is_ok());
        assert!(matches!(
            Secret::passphrase("x".repeat(64)),
            Err(StationError::InvalidInput(_))
        ));
    }

    #[test]
    fn secret_debug_is_redacted() {
        let secret = Secret::Passphrase("hunter2hunter2".into());
        assert!(!format!("{secret:?}").contains("hunter2"));
    }

    #[test]
    fn eap_settings_validation() {
        let peap = EapSettings::new(EapMethod::Peap, "user@example.com");
        assert!(peap.validate().is_err());

        let peap = peap.with_password("pw").with_phase2(Phase2::Mschapv2);
        assert!(peap.validate().is_ok());

        let tls = EapSettings::new(EapMethod::Tls, "user@example.com");
        assert!(tls.validate().is_ok());

        let empty = EapSettings::new(EapMethod::Sim, "  ");
        assert!(matches!(
            empty.validate(),
            Err(StationError::InvalidInput(_))
        ));
    }

    #[test]
    fn settings_security() {
        assert_eq!(NetworkSettings::Open.security(), Security::None);
        assert_eq!(
            NetworkSettings::Psk(Secret::Psk([0; 32])).security(),
            Security::Psk
        );
        assert_eq!(
            NetworkSettings::Eap(EapSettings::new(EapMethod::Tls, "id")).security(),
            Security::Ieee8021x
        );
    }

    #[test]
    fn connect_outcome_errors() {
        assert!(ConnectOutcome::Success.error().is_none());
        assert!(matches!(
            ConnectOutcome::Aborted.error(),
            Some(StationError::Aborted)
        ));
        assert!(matches!(
            ConnectOutcome::HandshakeFailed.error(),
            Some(StationError::HandshakeFailed)
        ));
    }

    #[test]
    fn error_display() {
        assert_eq!(StationError::Busy.to_string(), "operation already in progress");
        assert_eq!(
            StationError::InvalidInput("bad ssid".into()).to_string(),
            "invalid input: bad ssid"
        );
    }
}
