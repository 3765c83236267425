use log::{debug, info};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::api::config::StationConfig;
use crate::api::models::{DeviceEvent, Result, StationError};
use crate::core::link::{CredentialStore, LinkLayer, LinkNotification};
use crate::core::network::Network;
use crate::core::station::{Station, StationInfo};
use crate::monitoring::watchlist::Watchlist;

/// Owner of every managed wireless interface.
///
/// The manager routes link-layer notifications to the station they belong
/// to and tells interface watchers when an interface comes up or goes away.
/// All stations share one credential store.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use iwrs::{
///     LinkLayer, LinkNotification, MemoryStore, Result, ScanBss, ScanRequest,
///     SecurityContext, StationConfig, StationInfo, StationManager, StationState,
/// };
///
/// struct NullLink;
///
/// impl LinkLayer for NullLink {
///     fn scan(&mut self, _: &ScanRequest) -> Result<()> { Ok(()) }
///     fn set_periodic_scan(&mut self, _: bool) {}
///     fn connect(&mut self, _: &ScanBss, _: Option<SecurityContext>) -> Result<()> { Ok(()) }
///     fn disconnect(&mut self) -> Result<()> { Ok(()) }
///     fn set_powered(&mut self, _: bool) -> Result<()> { Ok(()) }
/// }
///
/// # fn main() -> iwrs::Result<()> {
/// let mut manager = StationManager::new(StationConfig::default(), Arc::new(MemoryStore::new()));
/// let info = StationInfo { index: 3, name: "wlan0".into(), address: [2, 0, 0, 0, 0, 1], phy: 0 };
///
/// manager.add_station(info, Box::new(NullLink))?;
/// manager.dispatch(3, LinkNotification::Up)?;
///
/// assert_eq!(manager.station(3).map(|s| s.state()), Some(StationState::Autoconnect));
/// # Ok(())
/// # }
/// ```
pub struct StationManager {
    config: StationConfig,
    store: Arc<dyn CredentialStore>,
    stations: BTreeMap<u32, Station>,
    watchers: Watchlist<DeviceEvent>,
}

impl StationManager {
    pub fn new(config: StationConfig, store: Arc<dyn CredentialStore>) -> Self {
        Self {
            config,
            store,
            stations: BTreeMap::new(),
            watchers: Watchlist::new(),
        }
    }

    pub fn config(&self) -> &StationConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn CredentialStore> {
        &self.store
    }

    /// Starts managing an interface. The station starts out
    /// [`Off`](crate::StationState::Off).
    ///
    /// # Errors
    ///
    /// [`StationError::InvalidInput`] if the interface is already managed.
    pub fn add_station(
        &mut self,
        info: StationInfo,
        link: Box<dyn LinkLayer>,
    ) -> Result<&mut Station> {
        let index = info.index;
        if self.stations.contains_key(&index) {
            return Err(StationError::InvalidInput(format!(
                "interface {index} is already managed"
            )));
        }

        info!("Managing {} (index {index})", info.name);
        let station = Station::new(info, link, Arc::clone(&self.store), &self.config);
        Ok(self.stations.entry(index).or_insert(station))
    }

    /// Stops managing an interface, resolving everything it had pending.
    ///
    /// # Errors
    ///
    /// [`StationError::NotFound`] for an unknown interface.
    pub fn remove_station(&mut self, index: u32) -> Result<()> {
        let mut station = self.stations.remove(&index).ok_or(StationError::NotFound)?;

        info!("Releasing {} (index {index})", station.name());
        if station.is_powered() {
            self.watchers.notify(&DeviceEvent::Removed(index));
        }
        station.shutdown();
        Ok(())
    }

    pub fn station(&self, index: u32) -> Option<&Station> {
        self.stations.get(&index)
    }

    pub fn station_mut(&mut self, index: u32) -> Option<&mut Station> {
        self.stations.get_mut(&index)
    }

    /// Managed stations by ascending interface index.
    pub fn stations(&self) -> impl Iterator<Item = &Station> {
        self.stations.values()
    }

    /// Looks a station up by its object path.
    pub fn station_by_path(&self, path: &str) -> Option<&Station> {
        self.stations.values().find(|s| s.path() == path)
    }

    /// Looks a network up by its object path, across all stations.
    /// Returns the owning interface index with it.
    pub fn network_by_path(&self, path: &str) -> Option<(u32, &Network)> {
        self.stations
            .values()
            .find_map(|s| s.network(path).map(|n| (s.index(), n)))
    }

    /// Routes a link-layer notification to the interface it concerns.
    ///
    /// # Errors
    ///
    /// [`StationError::NotFound`] for an unknown interface.
    pub fn dispatch(&mut self, index: u32, notification: LinkNotification) -> Result<()> {
        let station = self.stations.get_mut(&index).ok_or_else(|| {
            debug!("Notification for unmanaged interface {index}");
            StationError::NotFound
        })?;

        let was_powered = station.is_powered();
        station.handle(notification);
        let powered = station.is_powered();

        match (was_powered, powered) {
            (false, true) => self.watchers.notify(&DeviceEvent::Inserted(index)),
            (true, false) => self.watchers.notify(&DeviceEvent::Removed(index)),
            _ => {}
        }
        Ok(())
    }

    /// Subscribes to interfaces coming up and going away.
    pub fn watch_add<F>(&mut self, func: F) -> u32
    where
        F: FnMut(&DeviceEvent) + Send + 'static,
    {
        self.watchers.add(func)
    }

    pub fn watch_remove(&mut self, id: u32) -> bool {
        self.watchers.remove(id)
    }

    /// Releases every interface, then every interface watcher.
    pub fn shutdown(&mut self) {
        let indexes: Vec<u32> = self.stations.keys().copied().collect();
        for index in indexes {
            let _ = self.remove_station(index);
        }

        if !self.watchers.is_empty() {
            debug!("Dropping {} interface watchers", self.watchers.len());
        }
        self.watchers.clear();
    }
}

impl Drop for StationManager {
    fn drop(&mut self) {
        self.shutdown();
    }
}
