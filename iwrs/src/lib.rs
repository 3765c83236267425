//! Connection-management core for a wireless station daemon.
//!
//! This crate keeps track of the access points a wireless interface can
//! hear, groups them into networks, and drives the interface through
//! connecting, connected and disconnecting:
//!
//! - Ingesting scan results into a rank-ordered network catalogue
//! - Autoconnecting to known networks, best candidate first
//! - Explicit connect, disconnect, scan and power requests
//! - Wi-Fi Simple Configuration push-button enrollment
//! - Fan-out of state and property changes to watchers and the system bus
//!
//! The core does no I/O of its own. It talks to the radio through a
//! [`LinkLayer`] implementation, which returns as soon as an operation is
//! issued and reports completion later as a [`LinkNotification`].
//! Credentials come from a [`CredentialStore`].
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use iwrs::{
//!     ConnectOutcome, LinkLayer, LinkNotification, MemoryStore, NetworkSettings, Result,
//!     ScanBss, ScanRequest, SecurityContext, StationConfig, StationInfo, StationManager,
//!     StationState,
//! };
//!
//! struct Radio;
//!
//! impl LinkLayer for Radio {
//!     fn scan(&mut self, _: &ScanRequest) -> Result<()> { Ok(()) }
//!     fn set_periodic_scan(&mut self, _: bool) {}
//!     fn connect(&mut self, _: &ScanBss, _: Option<SecurityContext>) -> Result<()> { Ok(()) }
//!     fn disconnect(&mut self) -> Result<()> { Ok(()) }
//!     fn set_powered(&mut self, _: bool) -> Result<()> { Ok(()) }
//! }
//!
//! # fn main() -> iwrs::Result<()> {
//! let store = MemoryStore::new().with_network("Home", NetworkSettings::Open);
//! let mut manager = StationManager::new(StationConfig::default(), Arc::new(store));
//!
//! let info = StationInfo { index: 3, name: "wlan0".into(), address: [2, 0, 0, 0, 0, 1], phy: 0 };
//! manager.add_station(info, Box::new(Radio))?;
//! manager.dispatch(3, LinkNotification::Up)?;
//!
//! // A scan finds the known network; the station connects on its own.
//! let home = ScanBss::new([0, 0, 0, 0, 0, 1], "Home", 2412, -5000);
//! manager.dispatch(3, LinkNotification::ScanResults(vec![home]))?;
//! manager.dispatch(3, LinkNotification::ConnectResult(ConnectOutcome::Success))?;
//!
//! let station = manager.station(3).expect("managed");
//! assert_eq!(station.state(), StationState::Connected);
//! # Ok(())
//! # }
//! ```
//!
//! # Error Handling
//!
//! Requests either fail synchronously with a [`StationError`], leaving the
//! station untouched, or are accepted and answered later through the
//! [`Requester`] passed in.
//!
//! # Logging
//!
//! This crate uses the [`log`](https://docs.rs/log) facade for logging. To see
//! log output, add a logging implementation like `env_logger`.

// Internal implementation modules
pub(crate) mod core;
pub(crate) mod monitoring;
mod types;
mod util;

// Public API modules
pub mod api;
pub mod dbus;

// Re-exported public API
pub use crate::api::bss::{
    AkmSuite, CipherSuite, ElementInfo, RsnInfo, ScanBss, SecurityElement, WscProbeResponse,
};
pub use crate::api::config::StationConfig;
pub use crate::api::models::{
    Band, ConnectOutcome, DeviceEvent, DeviceProperty, EapMethod, EapSettings, LinkEvent,
    NetworkSettings, NetworkSummary, Phase2, RemovalReason, Secret, Security, StationError,
    StationEvent, StationState,
};
pub use crate::api::station_manager::StationManager;
pub use crate::core::autoconnect::{AutoconnectQueue, Candidate};
pub use crate::core::catalogue::{Catalogue, IngestReport};
pub use crate::core::link::{CredentialStore, LinkLayer, LinkNotification, ScanMode, ScanRequest};
pub use crate::core::network::{BssRef, Network};
pub use crate::core::request::{Reply, Requester, requester};
pub use crate::core::security::{ElementKind, HandshakeSecret, SecurityContext};
pub use crate::core::station::{Station, StationInfo};
pub use crate::core::store::MemoryStore;
pub use crate::core::wsc::{
    AssociationState, PbcSelection, PrimaryDeviceType, RequestType, WscCredential,
    WscProbeRequest, select_pbc_target, uuid_from_addr,
};
pub use crate::dbus::{BusService, SharedManager};
pub use crate::util::utils::{address_to_string, network_path};

/// A specialized `Result` type for station operations.
pub type Result<T> = std::result::Result<T, StationError>;
