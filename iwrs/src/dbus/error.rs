//! Bus error replies.

use zbus::DBusError;

use crate::api::models::StationError;

/// Error names returned to bus clients, under `net.connman.iwd`.
#[derive(Debug, DBusError)]
#[zbus(prefix = "net.connman.iwd")]
pub enum BusError {
    #[zbus(error)]
    ZBus(zbus::Error),
    Busy(String),
    Failed(String),
    Aborted(String),
    NotAvailable(String),
    InvalidArgs(String),
    NotConnected(String),
    NotFound(String),
    NotSupported(String),
    NoAgent(String),
    SessionOverlap(String),
}

impl From<StationError> for BusError {
    fn from(err: StationError) -> Self {
        let message = err.to_string();
        match err {
            StationError::Busy => BusError::Busy(message),
            StationError::NotConnected => BusError::NotConnected(message),
            StationError::Rejected
            | StationError::HandshakeFailed
            | StationError::LinkFailed => BusError::Failed(message),
            StationError::Aborted => BusError::Aborted(message),
            StationError::InvalidInput(_) => BusError::InvalidArgs(message),
            StationError::NotAvailable => BusError::NotAvailable(message),
            StationError::NotFound => BusError::NotFound(message),
            StationError::NoSecrets => BusError::NoAgent(message),
            StationError::NotSupported => BusError::NotSupported(message),
            StationError::SessionOverlap => BusError::SessionOverlap(message),
            StationError::Dbus(e) => BusError::ZBus(e),
        }
    }
}
