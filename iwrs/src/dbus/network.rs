use zbus::fdo;
use zbus::interface;
use zvariant::OwnedObjectPath;

use crate::core::request::requester;
use crate::dbus::device::station_mut;
use crate::dbus::error::BusError;
use crate::dbus::{SharedManager, await_reply, object_path};

/// `net.connman.iwd.Network` object of one catalogue entry.
pub struct NetworkObject {
    manager: SharedManager,
    index: u32,
    path: String,
}

impl NetworkObject {
    pub(crate) fn new(manager: SharedManager, index: u32, path: String) -> Self {
        Self {
            manager,
            index,
            path,
        }
    }
}

#[interface(name = "net.connman.iwd.Network")]
impl NetworkObject {
    async fn connect(&self) -> Result<(), BusError> {
        let (tx, rx) = requester();
        {
            let mut manager = self.manager.lock().await;
            station_mut(&mut manager, self.index)?.connect_network(&self.path, Some(tx))?;
        }
        await_reply(rx).await
    }

    #[zbus(property)]
    async fn name(&self) -> fdo::Result<String> {
        let manager = self.manager.lock().await;
        manager
            .station(self.index)
            .and_then(|s| s.network(&self.path))
            .map(|n| n.ssid().to_string())
            .ok_or_else(|| fdo::Error::UnknownObject(self.path.clone()))
    }

    #[zbus(property)]
    async fn connected(&self) -> fdo::Result<bool> {
        let manager = self.manager.lock().await;
        Ok(manager
            .station(self.index)
            .and_then(|s| s.connected_network())
            .is_some_and(|p| p == self.path))
    }

    #[zbus(property)]
    async fn device(&self) -> fdo::Result<OwnedObjectPath> {
        let manager = self.manager.lock().await;
        let station = manager
            .station(self.index)
            .ok_or_else(|| fdo::Error::UnknownObject(self.path.clone()))?;
        object_path(station.path())
    }

    #[zbus(property, name = "Type")]
    async fn security_type(&self) -> fdo::Result<String> {
        let manager = self.manager.lock().await;
        manager
            .station(self.index)
            .and_then(|s| s.network(&self.path))
            .map(|n| n.security().to_string())
            .ok_or_else(|| fdo::Error::UnknownObject(self.path.clone()))
    }
}
