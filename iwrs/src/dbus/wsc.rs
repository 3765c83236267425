use zbus::interface;

use crate::core::request::requester;
use crate::dbus::device::station_mut;
use crate::dbus::error::BusError;
use crate::dbus::{SharedManager, await_reply};

/// `net.connman.iwd.WiFiSimpleConfiguration` object, next to the device.
pub struct WscObject {
    manager: SharedManager,
    index: u32,
}

impl WscObject {
    pub(crate) fn new(manager: SharedManager, index: u32) -> Self {
        Self { manager, index }
    }
}

#[interface(name = "net.connman.iwd.WiFiSimpleConfiguration")]
impl WscObject {
    async fn push_button(&self) -> Result<(), BusError> {
        let (tx, rx) = requester();
        {
            let mut manager = self.manager.lock().await;
            station_mut(&mut manager, self.index)?.wsc_push_button(tx)?;
        }
        await_reply(rx).await
    }

    async fn cancel(&self) -> Result<(), BusError> {
        let mut manager = self.manager.lock().await;
        station_mut(&mut manager, self.index)?.wsc_cancel()?;
        Ok(())
    }
}
