//! Network entity: every access point sharing one SSID and security type.

use log::debug;
use std::time::Instant;

use crate::api::bss::ScanBss;
use crate::api::models::{NetworkSettings, NetworkSummary, Security};
use crate::core::link::CredentialStore;

/// Weak reference to an observation in the station's current set.
///
/// Rank and signal are copied so the network can order its access points
/// without reaching into the observation set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BssRef {
    pub addr: [u8; 6],
    pub rank: u16,
    pub signal_strength: i32,
}

impl From<&ScanBss> for BssRef {
    fn from(bss: &ScanBss) -> Self {
        Self {
            addr: bss.addr,
            rank: bss.rank,
            signal_strength: bss.signal_strength,
        }
    }
}

#[derive(Debug)]
pub struct Network {
    path: String,
    ssid: String,
    security: Security,
    /// Sorted by descending rank; equal ranks keep insertion order.
    bss_list: Vec<BssRef>,
    rank: u32,
    first_seen: Instant,
    last_seen: Instant,
    /// Secret supplied for the next attempt, not yet known to work.
    pending_secret: Option<NetworkSettings>,
    /// The stored secret failed and must not be offered again.
    stored_secret_rejected: bool,
}

impl Network {
    pub(crate) fn new(path: String, ssid: String, security: Security, now: Instant) -> Self {
        Self {
            path,
            ssid,
            security,
            bss_list: Vec::new(),
            rank: 0,
            first_seen: now,
            last_seen: now,
            pending_secret: None,
            stored_secret_rejected: false,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn ssid(&self) -> &str {
        &self.ssid
    }

    pub fn security(&self) -> Security {
        self.security
    }

    pub fn rank(&self) -> u32 {
        self.rank
    }

    pub fn first_seen(&self) -> Instant {
        self.first_seen
    }

    pub fn last_seen(&self) -> Instant {
        self.last_seen
    }

    pub fn bss_list(&self) -> &[BssRef] {
        &self.bss_list
    }

    /// The access point with the highest rank.
    pub fn best_bss(&self) -> Option<&BssRef> {
        self.bss_list.first()
    }

    pub fn contains_bss(&self, addr: &[u8; 6]) -> bool {
        self.bss_list.iter().any(|b| &b.addr == addr)
    }

    pub fn bss_list_is_empty(&self) -> bool {
        self.bss_list.is_empty()
    }

    /// Strongest signal among the attached access points, in mBm.
    pub fn signal_strength(&self) -> i32 {
        self.bss_list
            .iter()
            .map(|b| b.signal_strength)
            .max()
            .unwrap_or(i32::MIN)
    }

    pub(crate) fn seen(&mut self, now: Instant) {
        self.last_seen = now;
    }

    pub(crate) fn attach(&mut self, bss: &ScanBss) {
        let entry = BssRef::from(bss);
        let at = self
            .bss_list
            .iter()
            .position(|b| b.rank < entry.rank)
            .unwrap_or(self.bss_list.len());
        self.bss_list.insert(at, entry);
    }

    pub(crate) fn clear_bss(&mut self) {
        self.bss_list.clear();
    }

    /// Recomputes the network rank from its best access point.
    ///
    /// Known networks are lifted above every unknown one and scaled by
    /// their trust modifier.
    pub(crate) fn update_rank(&mut self, modifier: Option<f64>) {
        let best = u32::from(self.best_bss().map_or(0, |b| b.rank));
        self.rank = match modifier {
            Some(m) => ((f64::from(best) * m) as u32).saturating_add(u32::from(u16::MAX)),
            None => best,
        };
    }

    /// Supplies a secret for the next connect attempt.
    pub fn set_pending_secret(&mut self, settings: NetworkSettings) {
        self.pending_secret = Some(settings);
    }

    /// Credentials to offer on the next attempt: a freshly supplied secret
    /// first, then the stored one unless it already failed.
    pub(crate) fn settings(&self, store: &dyn CredentialStore) -> Option<NetworkSettings> {
        if let Some(pending) = &self.pending_secret {
            return Some(pending.clone());
        }
        if self.stored_secret_rejected {
            return None;
        }
        store.settings(&self.ssid, self.security)
    }

    /// Records a failed attempt. For personal networks the secret that was
    /// used is no longer trusted.
    pub(crate) fn connect_failed(&mut self) {
        if self.security != Security::Psk {
            return;
        }
        if self.pending_secret.take().is_some() {
            debug!("Discarding supplied secret for {}", self.ssid);
        } else {
            debug!("Stored secret for {} rejected", self.ssid);
            self.stored_secret_rejected = true;
        }
    }

    /// Persists a supplied secret once the handshake has reached key
    /// installation.
    pub(crate) fn sync_credentials(&mut self, store: &dyn CredentialStore) {
        if let Some(settings) = self.pending_secret.take() {
            store.sync(self.security, &self.ssid, &settings);
            self.stored_secret_rejected = false;
        }
    }

    pub(crate) fn connected(&self, store: &dyn CredentialStore) {
        store.mark_connected(&self.ssid, self.security);
    }

    pub fn summary(&self) -> NetworkSummary {
        let mbm = self.signal_strength();
        NetworkSummary {
            path: self.path.clone(),
            name: self.ssid.clone(),
            signal_strength: mbm.clamp(i32::from(i16::MIN), i32::from(i16::MAX)) as i16,
            security: self.security,
        }
    }
}
