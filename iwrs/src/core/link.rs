//! Contracts with the collaborators the station drives.
//!
//! The station never blocks on a collaborator. Calls on [`LinkLayer`]
//! return as soon as the operation is issued, and completion comes back
//! as a [`LinkNotification`] dispatched to the owning station.

use crate::api::bss::ScanBss;
use crate::api::models::{ConnectOutcome, LinkEvent, NetworkSettings, Result, Security};
use crate::core::security::SecurityContext;
use crate::core::wsc::WscProbeRequest;

/// Scan flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanMode {
    /// Listen for beacons only.
    Passive,
    /// Send probe requests.
    Active,
}

/// One scan request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanRequest {
    pub mode: ScanMode,
    /// Enrollee attributes carried in the probe requests
    pub wsc: Option<WscProbeRequest>,
}

impl ScanRequest {
    pub fn passive() -> Self {
        Self {
            mode: ScanMode::Passive,
            wsc: None,
        }
    }

    pub fn active_wsc(request: WscProbeRequest) -> Self {
        Self {
            mode: ScanMode::Active,
            wsc: Some(request),
        }
    }
}

/// Link-layer driver interface for one wireless interface.
///
/// An `Err` return means the driver refused the operation synchronously;
/// no completion will follow.
pub trait LinkLayer: Send {
    /// Starts a scan. Completion: [`LinkNotification::ScanTriggered`] then
    /// [`LinkNotification::ScanResults`].
    fn scan(&mut self, request: &ScanRequest) -> Result<()>;

    /// Starts or stops the driver's periodic background scan. Its results
    /// arrive as [`LinkNotification::ScanResults`].
    fn set_periodic_scan(&mut self, enabled: bool);

    /// Starts a connect attempt. Completion: [`LinkNotification::ConnectResult`].
    fn connect(&mut self, bss: &ScanBss, security: Option<SecurityContext>) -> Result<()>;

    /// Completion: [`LinkNotification::DisconnectResult`].
    fn disconnect(&mut self) -> Result<()>;

    /// Completion: [`LinkNotification::PoweredResult`], then `Up` or `Down`.
    fn set_powered(&mut self, powered: bool) -> Result<()>;
}

/// Persistent credential storage shared by all stations.
pub trait CredentialStore: Send + Sync {
    /// Trust multiplier for a known network, `None` if unknown.
    fn rank_modifier(&self, ssid: &str, security: Security) -> Option<f64>;

    /// Stored credentials for a known network.
    fn settings(&self, ssid: &str, security: Security) -> Option<NetworkSettings>;

    /// Persists credentials that proved to work, or that were provisioned
    /// out of band.
    fn sync(&self, security: Security, ssid: &str, settings: &NetworkSettings);

    /// Records a successful connection for recency ordering.
    fn mark_connected(&self, ssid: &str, security: Security);
}

/// Everything the link layer can report about one interface.
#[derive(Debug)]
pub enum LinkNotification {
    Up,
    Down,
    /// The interface was renamed.
    NameChanged(String),
    ScanTriggered(Result<()>),
    ScanResults(Vec<ScanBss>),
    ConnectResult(ConnectOutcome),
    DisconnectResult(bool),
    Event(LinkEvent),
    PoweredResult(Result<()>),
}
