//! Per-interface connection orchestrator and state machine.
//!
//! A [`Station`] owns everything about one managed wireless interface: the
//! catalogue of networks in range, the connected access point and network,
//! the autoconnect candidates and every pending request. It never blocks.
//! Operations are issued to the [`LinkLayer`] and return immediately, and
//! completions come back through the `handle_*` methods, normally by way of
//! [`Station::handle`].
//!
//! State transitions:
//!
//! ```text
//! OFF --up--> AUTOCONNECT | DISCONNECTED
//! DISCONNECTED <--autoconnect flag--> AUTOCONNECT
//! AUTOCONNECT | DISCONNECTED --connect--> CONNECTING --success--> CONNECTED
//! CONNECTING | CONNECTED --loss/failure--> DISCONNECTED [--> AUTOCONNECT]
//! CONNECTED --disconnect--> DISCONNECTING --result--> DISCONNECTED [--> AUTOCONNECT]
//! any --down--> OFF
//! ```

use log::{debug, info, warn};
use std::sync::Arc;
use std::time::Instant;

use crate::api::bss::{CipherSuite, ScanBss};
use crate::api::config::StationConfig;
use crate::api::models::{
    ConnectOutcome, DeviceProperty, LinkEvent, NetworkSettings, NetworkSummary, RemovalReason,
    Result, StationError, StationEvent, StationState,
};
use crate::core::autoconnect::AutoconnectQueue;
use crate::core::catalogue::{Catalogue, Pin};
use crate::core::link::{CredentialStore, LinkLayer, LinkNotification, ScanRequest};
use crate::core::network::Network;
use crate::core::request::{Requester, reply, send};
use crate::core::security::build_context;
use crate::core::wsc::{PbcSelection, WscCredential, WscProbeRequest, WscSession, select_pbc_target};
use crate::monitoring::watchlist::Watchlist;
use crate::util::utils::{address_to_string, device_path};

/// Identity of a managed interface, as reported by the link layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StationInfo {
    /// Interface index
    pub index: u32,
    /// Interface name, e.g. `wlan0`
    pub name: String,
    /// Hardware address
    pub address: [u8; 6],
    /// Index of the radio the interface belongs to
    pub phy: u32,
}

/// The connected access point and its network. Held together so that one
/// is never present without the other.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Connection {
    network: String,
    bss: [u8; 6],
}

pub struct Station {
    index: u32,
    name: String,
    address: [u8; 6],
    path: String,
    adapter_path: String,
    state: StationState,
    scanning: bool,
    autoconnect: bool,
    periodic_scan: bool,
    supported_ciphers: CipherSuite,
    catalogue: Catalogue,
    connection: Option<Connection>,
    autoconnect_queue: AutoconnectQueue,
    scan_pending: Option<Requester>,
    connect_pending: Option<Requester>,
    disconnect_pending: Option<Requester>,
    powered_pending: Option<Requester>,
    wsc: Option<WscSession>,
    link: Box<dyn LinkLayer>,
    store: Arc<dyn CredentialStore>,
    watchers: Watchlist<StationEvent>,
}

impl Station {
    /// Creates a station in the [`Off`](StationState::Off) state. Feed it
    /// [`LinkNotification::Up`] once the interface is up.
    pub fn new(
        info: StationInfo,
        link: Box<dyn LinkLayer>,
        store: Arc<dyn CredentialStore>,
        config: &StationConfig,
    ) -> Self {
        let adapter_path = config.adapter_path(info.phy);
        let path = device_path(&adapter_path, info.index);

        Self {
            index: info.index,
            name: info.name,
            address: info.address,
            catalogue: Catalogue::new(path.clone()),
            path,
            adapter_path,
            state: StationState::Off,
            scanning: false,
            autoconnect: config.autoconnect,
            periodic_scan: false,
            supported_ciphers: config.supported_ciphers,
            connection: None,
            autoconnect_queue: AutoconnectQueue::default(),
            scan_pending: None,
            connect_pending: None,
            disconnect_pending: None,
            powered_pending: None,
            wsc: None,
            link,
            store,
            watchers: Watchlist::new(),
        }
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn address(&self) -> [u8; 6] {
        self.address
    }

    /// Object path of the interface.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Object path of the radio the interface belongs to.
    pub fn adapter_path(&self) -> &str {
        &self.adapter_path
    }

    pub fn state(&self) -> StationState {
        self.state
    }

    pub fn is_powered(&self) -> bool {
        self.state != StationState::Off
    }

    pub fn is_scanning(&self) -> bool {
        self.scanning
    }

    pub fn autoconnect(&self) -> bool {
        self.autoconnect
    }

    /// Path of the connected network.
    pub fn connected_network(&self) -> Option<&str> {
        self.connection.as_ref().map(|c| c.network.as_str())
    }

    /// Address of the connected access point.
    pub fn connected_bss(&self) -> Option<[u8; 6]> {
        self.connection.as_ref().map(|c| c.bss)
    }

    pub fn catalogue(&self) -> &Catalogue {
        &self.catalogue
    }

    pub fn network(&self, path: &str) -> Option<&Network> {
        self.catalogue.network(path)
    }

    /// Networks in range, best first.
    pub fn ordered_networks(&self) -> Vec<NetworkSummary> {
        self.catalogue.ranked().map(Network::summary).collect()
    }

    /// Candidates not yet tried in the current autoconnect cycle.
    pub fn autoconnect_candidates(&self) -> &AutoconnectQueue {
        &self.autoconnect_queue
    }

    /// Whether a connect or disconnect is in flight, or a connection is
    /// up.
    pub fn is_busy(&self) -> bool {
        self.state.is_connected_side()
            || self.connect_pending.is_some()
            || self.disconnect_pending.is_some()
    }

    pub fn wsc_pending(&self) -> bool {
        self.wsc.is_some()
    }

    /// Subscribes to every event this station emits.
    pub fn watch_add<F>(&mut self, func: F) -> u32
    where
        F: FnMut(&StationEvent) + Send + 'static,
    {
        self.watchers.add(func)
    }

    /// Subscribes with a cleanup closure, run on removal or teardown.
    pub fn watch_add_with_destroy<F, D>(&mut self, func: F, destroy: D) -> u32
    where
        F: FnMut(&StationEvent) + Send + 'static,
        D: FnOnce() + Send + 'static,
    {
        self.watchers.add_with_destroy(func, destroy)
    }

    pub fn watch_remove(&mut self, id: u32) -> bool {
        self.watchers.remove(id)
    }

    pub fn watch_count(&self) -> usize {
        self.watchers.len()
    }

    /// Supplies a secret for the next attempt on `network`, e.g. from a
    /// user prompt.
    ///
    /// # Errors
    ///
    /// - [`StationError::NotFound`] for an unknown network
    /// - [`StationError::InvalidInput`] when the settings do not match the
    ///   network's security type
    pub fn set_network_secret(&mut self, network: &str, settings: NetworkSettings) -> Result<()> {
        let network = self
            .catalogue
            .network_mut(network)
            .ok_or(StationError::NotFound)?;

        if settings.security() != network.security() {
            return Err(StationError::InvalidInput(format!(
                "{} settings for a {} network",
                settings.security(),
                network.security()
            )));
        }

        network.set_pending_secret(settings);
        Ok(())
    }

    /// Dispatches a link-layer notification to its handler.
    pub fn handle(&mut self, notification: LinkNotification) {
        match notification {
            LinkNotification::Up => self.handle_link_up(),
            LinkNotification::Down => self.handle_link_down(),
            LinkNotification::NameChanged(name) => self.handle_name_changed(name),
            LinkNotification::ScanTriggered(result) => self.handle_scan_triggered(result),
            LinkNotification::ScanResults(observations) => self.handle_scan_results(observations),
            LinkNotification::ConnectResult(outcome) => self.handle_connect_result(outcome),
            LinkNotification::DisconnectResult(success) => self.handle_disconnect_result(success),
            LinkNotification::Event(event) => self.handle_link_event(event),
            LinkNotification::PoweredResult(result) => self.handle_powered_result(result),
        }
    }

    fn notify(&mut self, event: StationEvent) {
        self.watchers.notify(&event);
    }

    fn enter_state(&mut self, new: StationState) {
        let old = self.state;
        debug!("Old State: {old}, new state: {new}");

        match new {
            StationState::Autoconnect => self.set_periodic_scan(true),
            StationState::Off | StationState::Disconnected | StationState::Connected => {
                self.set_periodic_scan(false)
            }
            StationState::Connecting | StationState::Disconnecting => {}
        }

        self.state = new;

        if old.externally_distinct(new) {
            self.notify(StationEvent::PropertyChanged(DeviceProperty::State));
        }
        self.notify(StationEvent::StateChanged { old, new });
    }

    /// DISCONNECTED, then AUTOCONNECT if the flag is set.
    fn enter_idle(&mut self) {
        self.enter_state(StationState::Disconnected);
        if self.autoconnect {
            self.enter_state(StationState::Autoconnect);
        }
    }

    fn set_periodic_scan(&mut self, enabled: bool) {
        if self.periodic_scan != enabled {
            self.periodic_scan = enabled;
            self.link.set_periodic_scan(enabled);
        }
    }

    fn set_scanning(&mut self, scanning: bool) {
        if self.scanning != scanning {
            self.scanning = scanning;
            self.notify(StationEvent::PropertyChanged(DeviceProperty::Scanning));
        }
    }

    /// Drops the connected references and tells clients.
    fn clear_connection(&mut self) {
        if let Some(connection) = self.connection.take() {
            self.notify(StationEvent::PropertyChanged(DeviceProperty::ConnectedNetwork));
            self.notify(StationEvent::NetworkConnectedChanged {
                path: connection.network,
            });
        }
    }

    /// Common path for every loss of an active or in-progress connection.
    fn disassociated(&mut self) {
        debug!("{} disassociated", self.index);
        self.clear_connection();
        self.enter_idle();
    }

    /// Interface came up.
    pub fn handle_link_up(&mut self) {
        if self.state != StationState::Off {
            debug!("{}: already up", self.index);
            return;
        }

        info!("{} is up", self.name);
        if self.autoconnect {
            self.enter_state(StationState::Autoconnect);
        } else {
            self.enter_state(StationState::Disconnected);
        }
        self.notify(StationEvent::PropertyChanged(DeviceProperty::Powered));
    }

    /// Interface went down: every pending request is aborted and every
    /// network is dropped.
    pub fn handle_link_down(&mut self) {
        if self.state == StationState::Off {
            debug!("{}: already down", self.index);
            return;
        }

        info!("{} is down", self.name);
        self.enter_state(StationState::Off);

        reply(&mut self.scan_pending, Err(StationError::Aborted));
        reply(&mut self.connect_pending, Err(StationError::Aborted));
        reply(&mut self.disconnect_pending, Err(StationError::Aborted));
        if let Some(session) = self.wsc.take() {
            send(session.requester, Err(StationError::Aborted));
        }

        self.drop_catalogue();
        self.set_scanning(false);
        self.notify(StationEvent::PropertyChanged(DeviceProperty::Powered));
    }

    fn drop_catalogue(&mut self) {
        self.clear_connection();
        self.autoconnect_queue.clear();
        self.catalogue
            .clear(RemovalReason::Shutdown, &mut |e| self.watchers.notify(&e));
    }

    /// Interface is going away. Resolves every pending request and runs
    /// watcher cleanups. The station must not be used afterwards.
    pub fn shutdown(&mut self) {
        debug!("Tearing down {}", self.index);

        reply(&mut self.scan_pending, Err(StationError::Aborted));
        reply(&mut self.connect_pending, Err(StationError::Aborted));
        reply(&mut self.disconnect_pending, Err(StationError::Aborted));
        reply(&mut self.powered_pending, Err(StationError::Aborted));
        if let Some(session) = self.wsc.take() {
            send(session.requester, Err(StationError::NotAvailable));
        }

        self.drop_catalogue();
        self.set_periodic_scan(false);
        self.watchers.clear();
    }

    pub fn handle_name_changed(&mut self, name: String) {
        if self.name != name {
            self.name = name;
            self.notify(StationEvent::PropertyChanged(DeviceProperty::Name));
        }
    }

    /// Requests a passive scan. Answered once the scan is triggered.
    ///
    /// # Errors
    ///
    /// - [`StationError::NotAvailable`] while the interface is down
    /// - [`StationError::Busy`] while another scan request or an enrollment
    ///   scan is pending
    /// - [`StationError::Rejected`] if the link layer refuses
    pub fn scan(&mut self, requester: Requester) -> Result<()> {
        debug!("Scan requested on {}", self.index);

        if self.state == StationState::Off {
            return Err(StationError::NotAvailable);
        }
        if self.scan_pending.is_some() || self.wsc.as_ref().is_some_and(|s| s.scanning) {
            return Err(StationError::Busy);
        }

        if let Err(e) = self.link.scan(&ScanRequest::passive()) {
            warn!("Scan on {} refused: {e}", self.index);
            return Err(StationError::Rejected);
        }

        self.scan_pending = Some(requester);
        Ok(())
    }

    pub fn handle_scan_triggered(&mut self, result: Result<()>) {
        debug!("Scan triggered on {}: {result:?}", self.index);

        match result {
            Ok(()) => {
                self.set_scanning(true);
                reply(&mut self.scan_pending, Ok(()));
            }
            Err(e) => {
                warn!("Scan on {} failed to start: {e}", self.index);
                if self.scan_pending.is_some() {
                    reply(&mut self.scan_pending, Err(e));
                } else if self.wsc.as_ref().is_some_and(|s| s.scanning) {
                    if let Some(session) = self.wsc.take() {
                        send(session.requester, Err(e));
                    }
                }
            }
        }
    }

    /// Ingests a completed scan, then runs push-button selection and
    /// autoconnect as appropriate.
    pub fn handle_scan_results(&mut self, observations: Vec<ScanBss>) {
        if self.state == StationState::Off {
            debug!("Ignoring scan results on {}: interface is down", self.index);
            return;
        }

        self.set_scanning(false);

        // Enrollment looks at every responder, including ones the
        // catalogue refuses to expose.
        let registrars: Vec<ScanBss> = match self.wsc.as_mut() {
            Some(session) => {
                session.scanning = false;
                observations
                    .iter()
                    .filter(|b| b.wsc.is_some())
                    .cloned()
                    .collect()
            }
            None => Vec::new(),
        };

        let store = Arc::clone(&self.store);
        let pin = self.connection.as_ref().map(|c| Pin {
            network: &c.network,
            addr: c.bss,
        });
        let report = self.catalogue.ingest(
            observations,
            pin,
            store.as_ref(),
            Instant::now(),
            &mut |e| self.watchers.notify(&e),
        );
        debug!(
            "{}: {} accepted, {} rejected, {} networks",
            self.index,
            report.accepted,
            report.rejected,
            self.catalogue.len()
        );

        self.autoconnect_queue.clear();

        if self.wsc.is_some() {
            self.wsc_scan_results(&registrars);
            return;
        }

        if self.state == StationState::Autoconnect {
            self.autoconnect_queue = AutoconnectQueue::build(&self.catalogue, store.as_ref());
            self.select_next();
        }
    }

    /// Attempts autoconnect candidates head first until one is accepted.
    ///
    /// Does nothing outside [`Autoconnect`](StationState::Autoconnect), so
    /// calling it again while an attempt is outstanding is harmless.
    pub fn select_next(&mut self) {
        if self.state != StationState::Autoconnect {
            debug!("Not selecting: state is {}", self.state);
            return;
        }

        while let Some(candidate) = self.autoconnect_queue.pop() {
            if let Some(bss) = self.catalogue.bss(&candidate.bss) {
                debug!(
                    "Considering autoconnecting to BSS '{}' with SSID: {}, freq: {}, rank: {}, strength: {}",
                    address_to_string(&bss.addr),
                    self.catalogue
                        .network(&candidate.network)
                        .map_or("", Network::ssid),
                    bss.frequency,
                    candidate.effective_rank,
                    bss.signal_strength
                );
            }

            match self.connect(&candidate.network, candidate.bss, None) {
                Ok(()) => return,
                Err(e) => debug!("Autoconnect to {} failed: {e}", candidate.network),
            }
        }
    }

    /// Connects to the best access point of `network`.
    ///
    /// # Errors
    ///
    /// Same as [`Station::connect`].
    pub fn connect_network(&mut self, network: &str, requester: Option<Requester>) -> Result<()> {
        let bss = self
            .catalogue
            .network(network)
            .and_then(Network::best_bss)
            .map(|b| b.addr)
            .ok_or(StationError::NotFound)?;
        self.connect(network, bss, requester)
    }

    /// Starts connecting to access point `bss` of `network`.
    ///
    /// The requester is answered with the outcome of the attempt. On error
    /// nothing changes and the requester is dropped.
    ///
    /// # Errors
    ///
    /// - [`StationError::NotAvailable`] while the interface is down
    /// - [`StationError::Busy`] while connecting, connected or disconnecting
    /// - [`StationError::NotFound`] for an unknown network or access point
    /// - [`StationError::NoSecrets`], [`StationError::NotSupported`] or
    ///   [`StationError::InvalidInput`] if no security context can be built
    /// - [`StationError::Rejected`] if the link layer refuses
    pub fn connect(
        &mut self,
        network: &str,
        bss: [u8; 6],
        requester: Option<Requester>,
    ) -> Result<()> {
        if self.state == StationState::Off {
            return Err(StationError::NotAvailable);
        }
        if self.is_busy() {
            return Err(StationError::Busy);
        }

        let net = self
            .catalogue
            .network(network)
            .ok_or(StationError::NotFound)?;
        if !net.contains_bss(&bss) {
            return Err(StationError::NotFound);
        }
        let observation = self.catalogue.bss(&bss).ok_or(StationError::NotFound)?;

        let settings = net.settings(self.store.as_ref());
        let context = build_context(
            observation,
            net.ssid(),
            net.security(),
            settings,
            self.address,
            self.supported_ciphers,
        )
        .inspect_err(|e| warn!("Cannot connect to {}: {e}", net.ssid()))?;

        if let Err(e) = self.link.connect(observation, context) {
            warn!("Connect to {} refused: {e}", address_to_string(&bss));
            return Err(StationError::Rejected);
        }

        info!(
            "Connecting to {} via {}",
            net.ssid(),
            address_to_string(&bss)
        );

        self.connection = Some(Connection {
            network: network.to_string(),
            bss,
        });
        self.connect_pending = requester;
        self.enter_state(StationState::Connecting);

        self.notify(StationEvent::PropertyChanged(DeviceProperty::ConnectedNetwork));
        self.notify(StationEvent::NetworkConnectedChanged {
            path: network.to_string(),
        });
        Ok(())
    }

    pub fn handle_connect_result(&mut self, outcome: ConnectOutcome) {
        debug!("{}, result: {outcome}", self.index);

        let result = match outcome.error() {
            Some(e) => Err(e),
            None => Ok(()),
        };
        reply(&mut self.connect_pending, result);

        if self.state != StationState::Connecting {
            debug!("Connect result in state {}, nothing to do", self.state);
            return;
        }

        let Some(path) = self.connection.as_ref().map(|c| c.network.clone()) else {
            return;
        };

        match outcome {
            ConnectOutcome::Success => {
                if let Some(network) = self.catalogue.network(&path) {
                    info!("Connected to {}", network.ssid());
                    network.connected(self.store.as_ref());
                }
                self.enter_state(StationState::Connected);
                self.autoconnect = true;
            }
            // Nothing progressed on the link; return to where the attempt
            // started without holding it against the network.
            ConnectOutcome::Aborted => {
                self.clear_connection();
                self.enter_idle();
            }
            ConnectOutcome::HandshakeFailed | ConnectOutcome::LinkFailed => {
                if let Some(network) = self.catalogue.network_mut(&path) {
                    network.connect_failed();
                }
                self.disassociated();
            }
        }
    }

    /// Disconnects the current connection.
    ///
    /// The connected references are cleared at once: if the disconnect
    /// fails the real link state is unknown, so it is taken to be down.
    ///
    /// # Errors
    ///
    /// - [`StationError::Busy`] while already disconnecting
    /// - [`StationError::NotConnected`] with nothing connected
    /// - [`StationError::Rejected`] if the link layer refuses
    pub fn disconnect(&mut self, requester: Option<Requester>) -> Result<()> {
        if self.state == StationState::Disconnecting || self.disconnect_pending.is_some() {
            return Err(StationError::Busy);
        }
        if self.connection.is_none() {
            return Err(StationError::NotConnected);
        }

        if let Err(e) = self.link.disconnect() {
            warn!("Disconnect on {} refused: {e}", self.index);
            return Err(StationError::Rejected);
        }

        self.clear_connection();
        self.enter_state(StationState::Disconnecting);
        self.disconnect_pending = requester;
        Ok(())
    }

    pub fn handle_disconnect_result(&mut self, success: bool) {
        debug!("{}, success: {success}", self.index);

        let result = if success {
            Ok(())
        } else {
            Err(StationError::LinkFailed)
        };
        reply(&mut self.disconnect_pending, result);

        if self.state != StationState::Disconnecting {
            return;
        }

        self.disassociated();
    }

    pub fn handle_link_event(&mut self, event: LinkEvent) {
        let Some(path) = self.connection.as_ref().map(|c| c.network.clone()) else {
            debug!("{event} with no connection, ignoring");
            return;
        };

        match event {
            LinkEvent::Authenticating | LinkEvent::Associating | LinkEvent::Handshaking => {
                debug!("{event}");
            }
            LinkEvent::SettingKeys => {
                debug!("{event}");
                // The secret got us this far, so it is worth keeping.
                let store = Arc::clone(&self.store);
                if let Some(network) = self.catalogue.network_mut(&path) {
                    network.sync_credentials(store.as_ref());
                }
            }
            LinkEvent::LostBeacon => {
                debug!("{}: {event}", self.index);
                reply(&mut self.connect_pending, Err(StationError::LinkFailed));
                self.disassociated();
            }
            LinkEvent::ApDisconnect => {
                debug!("{}: {event}", self.index);
                if self.connect_pending.is_some() || self.state == StationState::Connecting {
                    reply(&mut self.connect_pending, Err(StationError::LinkFailed));
                    if let Some(network) = self.catalogue.network_mut(&path) {
                        network.connect_failed();
                    }
                }
                self.disassociated();
            }
        }
    }

    /// Toggles autoconnect. Moves between DISCONNECTED and AUTOCONNECT when
    /// idle.
    pub fn set_autoconnect(&mut self, autoconnect: bool) {
        if self.autoconnect == autoconnect {
            return;
        }
        self.autoconnect = autoconnect;

        if self.state == StationState::Disconnected && autoconnect {
            self.enter_state(StationState::Autoconnect);
        } else if self.state == StationState::Autoconnect && !autoconnect {
            self.autoconnect_queue.clear();
            self.enter_state(StationState::Disconnected);
        }
    }

    /// Powers the interface up or down. Answered immediately when already
    /// in the requested power state.
    ///
    /// # Errors
    ///
    /// - [`StationError::Busy`] while another power change is pending
    /// - [`StationError::Rejected`] if the link layer refuses
    pub fn set_powered(&mut self, powered: bool, requester: Requester) -> Result<()> {
        if powered == self.is_powered() {
            send(requester, Ok(()));
            return Ok(());
        }
        if self.powered_pending.is_some() {
            return Err(StationError::Busy);
        }

        if let Err(e) = self.link.set_powered(powered) {
            warn!("Power change on {} refused: {e}", self.index);
            return Err(StationError::Rejected);
        }

        self.powered_pending = Some(requester);
        Ok(())
    }

    pub fn handle_powered_result(&mut self, result: Result<()>) {
        if let Err(e) = &result {
            warn!("Power change on {} failed: {e}", self.index);
        }
        reply(&mut self.powered_pending, result);
    }

    /// Starts push-button enrollment. Answered when the enrollment
    /// completes, fails or is cancelled.
    ///
    /// # Errors
    ///
    /// - [`StationError::NotAvailable`] while the interface is down
    /// - [`StationError::Busy`] while an enrollment or another scan is pending
    /// - [`StationError::Rejected`] if the link layer refuses the scan
    pub fn wsc_push_button(&mut self, requester: Requester) -> Result<()> {
        if self.state == StationState::Off {
            return Err(StationError::NotAvailable);
        }
        if self.wsc.is_some() {
            return Err(StationError::Busy);
        }
        // A requested scan that has not reported back yet owns the radio.
        if self.scan_pending.is_some() || self.scanning {
            return Err(StationError::Busy);
        }

        let request = WscProbeRequest::push_button(&self.address);
        if let Err(e) = self.link.scan(&ScanRequest::active_wsc(request.clone())) {
            warn!("WSC scan on {} refused: {e}", self.index);
            return Err(StationError::Rejected);
        }

        info!("Push-button enrollment started on {}", self.name);
        self.wsc = Some(WscSession {
            requester,
            request,
            target: None,
            scanning: true,
        });
        Ok(())
    }

    fn wsc_scan_results(&mut self, registrars: &[ScanBss]) {
        let Some(session) = self.wsc.as_mut() else {
            return;
        };
        if session.target.is_some() {
            return;
        }

        match select_pbc_target(registrars) {
            PbcSelection::Target(address) => {
                session.target = Some(address);
                self.notify(StationEvent::WscTargetFound { address });
            }
            PbcSelection::Overlap => {
                if let Some(session) = self.wsc.take() {
                    send(session.requester, Err(StationError::SessionOverlap));
                }
            }
            PbcSelection::NotFound => {
                debug!("No PBC APs found, running the scan again");
                let request = ScanRequest::active_wsc(session.request.clone());
                match self.link.scan(&request) {
                    Ok(()) => session.scanning = true,
                    Err(e) => {
                        warn!("WSC rescan on {} refused: {e}", self.index);
                        if let Some(session) = self.wsc.take() {
                            send(session.requester, Err(StationError::Rejected));
                        }
                    }
                }
            }
        }
    }

    /// Cancels a pending enrollment, answering it with
    /// [`StationError::Aborted`].
    ///
    /// # Errors
    ///
    /// [`StationError::NotAvailable`] when no enrollment is pending.
    pub fn wsc_cancel(&mut self) -> Result<()> {
        let session = self.wsc.take().ok_or(StationError::NotAvailable)?;
        send(session.requester, Err(StationError::Aborted));
        Ok(())
    }

    /// Finishes a pending enrollment with the provisioning outcome.
    /// Provisioned credentials are stored.
    ///
    /// # Errors
    ///
    /// [`StationError::NotAvailable`] when no enrollment is pending.
    pub fn wsc_complete(&mut self, outcome: Result<Vec<WscCredential>>) -> Result<()> {
        let session = self.wsc.take().ok_or(StationError::NotAvailable)?;

        match outcome {
            Ok(credentials) => {
                for credential in &credentials {
                    self.store.sync(
                        credential.settings.security(),
                        &credential.ssid,
                        &credential.settings,
                    );
                }
                info!("Enrollment provisioned {} networks", credentials.len());
                send(session.requester, Ok(()));
            }
            Err(e) => {
                warn!("Enrollment failed: {e}");
                send(session.requester, Err(e));
            }
        }
        Ok(())
    }
}
