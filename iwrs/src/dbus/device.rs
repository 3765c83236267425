use zbus::fdo;
use zbus::interface;
use zvariant::OwnedObjectPath;

use crate::api::station_manager::StationManager;
use crate::core::request::requester;
use crate::core::station::Station;
use crate::dbus::error::BusError;
use crate::dbus::{SharedManager, await_reply, object_path};
use crate::util::utils::address_to_string;

/// `net.connman.iwd.Device` object of one interface.
pub struct DeviceObject {
    manager: SharedManager,
    index: u32,
}

impl DeviceObject {
    pub(crate) fn new(manager: SharedManager, index: u32) -> Self {
        Self { manager, index }
    }

    async fn read<T>(&self, f: impl FnOnce(&Station) -> T) -> fdo::Result<T> {
        let manager = self.manager.lock().await;
        manager
            .station(self.index)
            .map(f)
            .ok_or_else(|| fdo::Error::UnknownObject(format!("interface {}", self.index)))
    }
}

pub(crate) fn station_mut(
    manager: &mut StationManager,
    index: u32,
) -> Result<&mut Station, BusError> {
    manager
        .station_mut(index)
        .ok_or_else(|| BusError::NotFound(format!("interface {index}")))
}

#[interface(name = "net.connman.iwd.Device")]
impl DeviceObject {
    async fn scan(&self) -> Result<(), BusError> {
        let (tx, rx) = requester();
        {
            let mut manager = self.manager.lock().await;
            station_mut(&mut manager, self.index)?.scan(tx)?;
        }
        await_reply(rx).await
    }

    async fn disconnect(&self) -> Result<(), BusError> {
        let (tx, rx) = requester();
        {
            let mut manager = self.manager.lock().await;
            let station = station_mut(&mut manager, self.index)?;
            // An explicit disconnect means the user wants to stay off.
            station.set_autoconnect(false);
            station.disconnect(Some(tx))?;
        }
        await_reply(rx).await
    }

    async fn get_ordered_networks(
        &self,
    ) -> Result<Vec<(OwnedObjectPath, String, i16, String)>, BusError> {
        let manager = self.manager.lock().await;
        let station = manager
            .station(self.index)
            .ok_or_else(|| BusError::NotFound(format!("interface {}", self.index)))?;

        station
            .ordered_networks()
            .into_iter()
            .map(|n| {
                let path = object_path(&n.path).map_err(|e| BusError::Failed(e.to_string()))?;
                Ok((path, n.name, n.signal_strength, n.security.to_string()))
            })
            .collect()
    }

    #[zbus(property)]
    async fn name(&self) -> fdo::Result<String> {
        self.read(|s| s.name().to_string()).await
    }

    #[zbus(property)]
    async fn address(&self) -> fdo::Result<String> {
        self.read(|s| address_to_string(&s.address())).await
    }

    /// `/` when nothing is connected.
    #[zbus(property)]
    async fn connected_network(&self) -> fdo::Result<OwnedObjectPath> {
        let path = self
            .read(|s| s.connected_network().unwrap_or("/").to_string())
            .await?;
        object_path(&path)
    }

    #[zbus(property)]
    async fn powered(&self) -> fdo::Result<bool> {
        self.read(Station::is_powered).await
    }

    #[zbus(property)]
    async fn set_powered(&mut self, powered: bool) -> fdo::Result<()> {
        let (tx, rx) = requester();
        {
            let mut manager = self.manager.lock().await;
            station_mut(&mut manager, self.index)
                .and_then(|s| s.set_powered(powered, tx).map_err(BusError::from))
                .map_err(|e| fdo::Error::Failed(e.to_string()))?;
        }
        await_reply(rx)
            .await
            .map_err(|e| fdo::Error::Failed(e.to_string()))
    }

    #[zbus(property)]
    async fn scanning(&self) -> fdo::Result<bool> {
        self.read(Station::is_scanning).await
    }

    #[zbus(property)]
    async fn state(&self) -> fdo::Result<String> {
        self.read(|s| s.state().bus_str().to_string()).await
    }

    #[zbus(property)]
    async fn adapter(&self) -> fdo::Result<OwnedObjectPath> {
        let path = self.read(|s| s.adapter_path().to_string()).await?;
        object_path(&path)
    }
}
