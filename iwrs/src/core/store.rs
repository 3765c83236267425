//! In-memory credential store.

use log::debug;
use std::sync::{Mutex, PoisonError};

use crate::api::models::{NetworkSettings, Security};
use crate::core::link::CredentialStore;
use crate::types::constants::rank;

#[derive(Debug, Clone)]
struct KnownNetwork {
    ssid: String,
    security: Security,
    settings: NetworkSettings,
}

/// A [`CredentialStore`] that keeps known networks in memory, most recently
/// connected first.
///
/// The rank modifier of a known network decreases with how long ago it was
/// last connected.
///
/// # Examples
///
/// ```rust
/// use iwrs::{CredentialStore, MemoryStore, NetworkSettings, Security};
///
/// let store = MemoryStore::new()
///     .with_network("Home", NetworkSettings::Open)
///     .with_network("Cafe", NetworkSettings::Open);
///
/// assert_eq!(store.rank_modifier("Home", Security::None), Some(1.0));
/// assert_eq!(store.rank_modifier("Cafe", Security::None), Some(0.9));
/// assert_eq!(store.rank_modifier("Airport", Security::None), None);
/// ```
#[derive(Debug, Default)]
pub struct MemoryStore {
    known: Mutex<Vec<KnownNetwork>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a known network behind every existing one.
    #[must_use]
    pub fn with_network(self, ssid: impl Into<String>, settings: NetworkSettings) -> Self {
        self.insert(ssid, settings);
        self
    }

    /// Adds or updates a known network. New entries go to the back.
    pub fn insert(&self, ssid: impl Into<String>, settings: NetworkSettings) {
        let ssid = ssid.into();
        let security = settings.security();
        let mut known = self.lock();

        if let Some(entry) = known
            .iter_mut()
            .find(|k| k.ssid == ssid && k.security == security)
        {
            entry.settings = settings;
            return;
        }

        known.push(KnownNetwork {
            ssid,
            security,
            settings,
        });
    }

    /// Drops a known network. Returns `true` if it existed.
    pub fn forget(&self, ssid: &str, security: Security) -> bool {
        let mut known = self.lock();
        let before = known.len();
        known.retain(|k| !(k.ssid == ssid && k.security == security));
        known.len() != before
    }

    /// Known networks, most recently connected first.
    pub fn known(&self) -> Vec<(String, Security)> {
        self.lock()
            .iter()
            .map(|k| (k.ssid.clone(), k.security))
            .collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<KnownNetwork>> {
        self.known.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl CredentialStore for MemoryStore {
    fn rank_modifier(&self, ssid: &str, security: Security) -> Option<f64> {
        let offset = self
            .lock()
            .iter()
            .position(|k| k.ssid == ssid && k.security == security)?;

        let table = &rank::KNOWN_NETWORK_MODIFIERS;
        Some(table[offset.min(table.len() - 1)])
    }

    fn settings(&self, ssid: &str, security: Security) -> Option<NetworkSettings> {
        self.lock()
            .iter()
            .find(|k| k.ssid == ssid && k.security == security)
            .map(|k| k.settings.clone())
    }

    fn sync(&self, security: Security, ssid: &str, settings: &NetworkSettings) {
        if settings.security() != security {
            debug!("Ignoring {} settings for {security} network {ssid}", settings.security());
            return;
        }
        debug!("Storing credentials for {ssid} ({security})");
        self.insert(ssid, settings.clone());
    }

    fn mark_connected(&self, ssid: &str, security: Security) {
        let mut known = self.lock();

        match known
            .iter()
            .position(|k| k.ssid == ssid && k.security == security)
        {
            Some(offset) => {
                let entry = known.remove(offset);
                known.insert(0, entry);
            }
            None if security == Security::None => {
                known.insert(
                    0,
                    KnownNetwork {
                        ssid: ssid.to_string(),
                        security,
                        settings: NetworkSettings::Open,
                    },
                );
            }
            None => debug!("Connected to {ssid} ({security}) without stored credentials"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::Secret;

    fn psk(pass: &str) -> NetworkSettings {
        NetworkSettings::Psk(Secret::Passphrase(pass.into()))
    }

    #[test]
    fn modifiers_follow_recency() {
        let store = MemoryStore::new();
        for i in 0..10 {
            store.insert(format!("net{i}"), NetworkSettings::Open);
        }

        assert_eq!(store.rank_modifier("net0", Security::None), Some(1.0));
        assert_eq!(store.rank_modifier("net1", Security::None), Some(0.9));
        assert_eq!(store.rank_modifier("net7", Security::None), Some(0.3));
        assert_eq!(store.rank_modifier("net9", Security::None), Some(0.3));
    }

    #[test]
    fn security_is_part_of_identity() {
        let store = MemoryStore::new().with_network("Home", psk("password1"));
        assert!(store.rank_modifier("Home", Security::Psk).is_some());
        assert!(store.rank_modifier("Home", Security::None).is_none());
        assert!(store.settings("Home", Security::Psk).is_some());
    }

    #[test]
    fn mark_connected_moves_to_front() {
        let store = MemoryStore::new()
            .with_network("a", NetworkSettings::Open)
            .with_network("b", NetworkSettings::Open);

        store.mark_connected("b", Security::None);
        assert_eq!(store.rank_modifier("b", Security::None), Some(1.0));
        assert_eq!(store.rank_modifier("a", Security::None), Some(0.9));
    }

    #[test]
    fn mark_connected_remembers_open_networks() {
        let store = MemoryStore::new();
        store.mark_connected("Cafe", Security::None);
        store.mark_connected("Locked", Security::Psk);

        assert_eq!(store.known(), vec![("Cafe".to_string(), Security::None)]);
    }

    #[test]
    fn sync_updates_in_place() {
        let store = MemoryStore::new()
            .with_network("a", NetworkSettings::Open)
            .with_network("Home", psk("old password"));

        store.sync(Security::Psk, "Home", &psk("new password"));
        assert_eq!(store.settings("Home", Security::Psk), Some(psk("new password")));
        assert_eq!(store.rank_modifier("Home", Security::Psk), Some(0.9));
    }

    #[test]
    fn sync_ignores_mismatched_security() {
        let store = MemoryStore::new();
        store.sync(Security::Psk, "Home", &NetworkSettings::Open);
        assert!(store.known().is_empty());
    }

    #[test]
    fn forget_removes() {
        let store = MemoryStore::new().with_network("a", NetworkSettings::Open);
        assert!(store.forget("a", Security::None));
        assert!(!store.forget("a", Security::None));
    }
}
