//! Access-point registry and network catalogue.
//!
//! The catalogue owns the current observation set of one interface and the
//! networks built from it. Every scan cycle replaces the observation set
//! through [`Catalogue::ingest`], which regroups observations into
//! networks, drops networks left without access points and rebuilds the
//! rank-ordered view.
//!
//! Networks refer to observations by hardware address only, so dropping an
//! observation never leaves a dangling reference behind.

use log::{debug, warn};
use std::collections::HashMap;
use std::time::Instant;

use crate::api::bss::ScanBss;
use crate::api::models::{RemovalReason, Security, StationEvent};
use crate::core::link::CredentialStore;
use crate::core::network::Network;
use crate::core::security::classify;
use crate::util::utils::{
    address_to_string, decode_ssid_or_empty, network_path, ssid_for_log, ssid_is_utf8,
};

/// The access point the station is connected to, pinned across scans.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Pin<'a> {
    pub network: &'a str,
    pub addr: [u8; 6],
}

/// Summary of one ingestion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// Observations promoted into networks
    pub accepted: usize,
    /// Observations skipped as malformed
    pub rejected: usize,
    /// The connected access point was missing and had to be carried over
    pub pinned: bool,
}

#[derive(Debug)]
pub struct Catalogue {
    device_path: String,
    observations: Vec<ScanBss>,
    networks: HashMap<String, Network>,
    /// Network paths in the order the networks were created.
    created: Vec<String>,
    /// Network paths by descending rank.
    ranked: Vec<String>,
}

impl Catalogue {
    pub(crate) fn new(device_path: impl Into<String>) -> Self {
        Self {
            device_path: device_path.into(),
            observations: Vec::new(),
            networks: HashMap::new(),
            created: Vec::new(),
            ranked: Vec::new(),
        }
    }

    /// Current observation set.
    pub fn observations(&self) -> &[ScanBss] {
        &self.observations
    }

    pub fn bss(&self, addr: &[u8; 6]) -> Option<&ScanBss> {
        self.observations.iter().find(|b| &b.addr == addr)
    }

    pub fn network(&self, path: &str) -> Option<&Network> {
        self.networks.get(path)
    }

    pub(crate) fn network_mut(&mut self, path: &str) -> Option<&mut Network> {
        self.networks.get_mut(path)
    }

    /// Looks a network up by its identity.
    pub fn find(&self, ssid: &str, security: Security) -> Option<&Network> {
        self.networks
            .get(&network_path(&self.device_path, ssid, security))
    }

    /// Networks in descending rank order.
    pub fn ranked(&self) -> impl Iterator<Item = &Network> {
        self.ranked.iter().filter_map(|p| self.networks.get(p))
    }

    pub fn len(&self) -> usize {
        self.networks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.networks.is_empty()
    }

    /// Replaces the observation set with a new scan cycle.
    ///
    /// `pin` names the connected access point: when it is missing from
    /// `observations` the previous observation is carried over and kept on
    /// its network. `on_change` hears about every network added or removed;
    /// removals are announced while the network is still in the catalogue.
    pub(crate) fn ingest(
        &mut self,
        observations: Vec<ScanBss>,
        pin: Option<Pin<'_>>,
        store: &dyn CredentialStore,
        now: Instant,
        on_change: &mut dyn FnMut(StationEvent),
    ) -> IngestReport {
        let mut report = IngestReport::default();
        let previous = std::mem::take(&mut self.observations);

        for network in self.networks.values_mut() {
            network.clear_bss();
        }

        for bss in dedup(observations) {
            if self.process_bss(bss, now, on_change) {
                report.accepted += 1;
            } else {
                report.rejected += 1;
            }
        }

        if let Some(pin) = pin {
            report.pinned = self.keep_pinned(pin, previous);
        }

        let mut removed = Vec::new();
        for path in &self.created {
            let Some(network) = self.networks.get_mut(path) else {
                continue;
            };

            if network.bss_list_is_empty() {
                debug!(
                    "No remaining BSSs for SSID: {} -- Removing network",
                    network.ssid()
                );
                on_change(StationEvent::NetworkRemoved {
                    path: path.clone(),
                    reason: RemovalReason::OutOfRange,
                });
                removed.push(path.clone());
                continue;
            }

            network.update_rank(store.rank_modifier(network.ssid(), network.security()));
        }

        for path in &removed {
            self.networks.remove(path);
        }
        self.created.retain(|p| self.networks.contains_key(p));
        self.rebuild_ranked();

        report
    }

    /// Drops every network and observation.
    pub(crate) fn clear(&mut self, reason: RemovalReason, on_change: &mut dyn FnMut(StationEvent)) {
        for path in self.created.drain(..) {
            on_change(StationEvent::NetworkRemoved {
                path: path.clone(),
                reason,
            });
            self.networks.remove(&path);
        }
        self.networks.clear();
        self.ranked.clear();
        self.observations.clear();
    }

    /// Classifies one observation and attaches it to its network. Returns
    /// `false` if the observation was skipped.
    fn process_bss(
        &mut self,
        mut bss: ScanBss,
        now: Instant,
        on_change: &mut dyn FnMut(StationEvent),
    ) -> bool {
        debug!(
            "Found BSS '{}' with SSID: {}, freq: {}, rank: {}, strength: {}",
            address_to_string(&bss.addr),
            ssid_for_log(&bss.ssid),
            bss.frequency,
            bss.rank,
            bss.signal_strength
        );

        if !ssid_is_utf8(&bss.ssid) {
            warn!("Ignoring BSS with non-UTF8 SSID");
            return false;
        }

        let security = match classify(&mut bss) {
            Ok(security) => security,
            Err(e) => {
                warn!("Ignoring BSS {}: {e}", address_to_string(&bss.addr));
                return false;
            }
        };

        let ssid = decode_ssid_or_empty(&bss.ssid).into_owned();
        let path = network_path(&self.device_path, &ssid, security);

        if !self.networks.contains_key(&path) {
            debug!("Added new Network \"{ssid}\" security {security}");
            self.networks.insert(
                path.clone(),
                Network::new(path.clone(), ssid, security, now),
            );
            self.created.push(path.clone());
            on_change(StationEvent::NetworkAdded { path: path.clone() });
        }

        let Some(network) = self.networks.get_mut(&path) else {
            return false;
        };
        if network.bss_list_is_empty() {
            network.seen(now);
        }
        network.attach(&bss);
        self.observations.push(bss);
        true
    }

    fn keep_pinned(&mut self, pin: Pin<'_>, previous: Vec<ScanBss>) -> bool {
        let Some(network) = self.networks.get_mut(pin.network) else {
            warn!("Connected network {} not in catalogue", pin.network);
            return false;
        };

        if let Some(bss) = self.observations.iter().find(|b| b.addr == pin.addr) {
            if !network.contains_bss(&pin.addr) {
                warn!(
                    "Connected BSS {} now advertises a different network",
                    address_to_string(&pin.addr)
                );
                network.attach(bss);
            }
            return false;
        }

        warn!("Connected BSS not in scan results!");

        let Some(bss) = previous.into_iter().find(|b| b.addr == pin.addr) else {
            warn!(
                "Connected BSS {} not in previous results either",
                address_to_string(&pin.addr)
            );
            return false;
        };

        network.attach(&bss);
        self.observations.push(bss);
        true
    }

    fn rebuild_ranked(&mut self) {
        let mut ranked: Vec<(u32, String)> = self
            .created
            .iter()
            .filter_map(|p| self.networks.get(p).map(|n| (n.rank(), p.clone())))
            .collect();
        // Stable: equal ranks keep creation order.
        ranked.sort_by(|a, b| b.0.cmp(&a.0));
        self.ranked = ranked.into_iter().map(|(_, p)| p).collect();
    }
}

/// Keeps one observation per hardware address, the one with the higher
/// rank; order follows the first appearance of each address.
fn dedup(observations: Vec<ScanBss>) -> Vec<ScanBss> {
    let mut out: Vec<ScanBss> = Vec::with_capacity(observations.len());
    for bss in observations {
        match out.iter_mut().find(|b| b.addr == bss.addr) {
            Some(existing) if bss.rank > existing.rank => *existing = bss,
            Some(_) => debug!("Dropping duplicate BSS {}", address_to_string(&bss.addr)),
            None => out.push(bss),
        }
    }
    out
}
