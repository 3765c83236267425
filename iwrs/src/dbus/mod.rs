//! System bus surface.
//!
//! Each managed interface is exported as a `net.connman.iwd.Device` object
//! with a `net.connman.iwd.WiFiSimpleConfiguration` object at the same
//! path, and every network in its catalogue as a `net.connman.iwd.Network`
//! object. Station events are forwarded to a pump task that emits the
//! matching property-change signals and keeps network objects registered.

mod device;
mod error;
mod network;
mod wsc;

pub use device::DeviceObject;
pub use error::BusError;
pub use network::NetworkObject;
pub use wsc::WscObject;

use log::{debug, warn};
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use zbus::{Connection, fdo};
use zvariant::OwnedObjectPath;

use crate::api::models::{DeviceProperty, Result, StationError, StationEvent};
use crate::api::station_manager::StationManager;
use crate::core::request::Reply;
use crate::types::constants::bus;

/// Manager handle shared between bus objects.
pub type SharedManager = Arc<Mutex<StationManager>>;

/// One station event on its way to the bus.
#[derive(Debug)]
struct BusEvent {
    index: u32,
    device_path: String,
    event: StationEvent,
}

pub(crate) fn object_path(path: &str) -> fdo::Result<OwnedObjectPath> {
    OwnedObjectPath::try_from(path.to_string()).map_err(|e| fdo::Error::Failed(e.to_string()))
}

/// Waits for a pending request to be answered.
pub(crate) async fn await_reply(rx: Reply) -> std::result::Result<(), BusError> {
    match rx.await {
        Ok(result) => result.map_err(BusError::from),
        Err(_) => Err(BusError::Aborted("request dropped".into())),
    }
}

/// Exports stations on a bus connection.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use tokio::sync::Mutex;
/// use iwrs::{BusService, MemoryStore, StationConfig, StationManager};
///
/// # async fn example() -> iwrs::Result<()> {
/// let conn = zbus::Connection::system().await?;
/// let manager = Arc::new(Mutex::new(StationManager::new(
///     StationConfig::default(),
///     Arc::new(MemoryStore::new()),
/// )));
///
/// let service = BusService::start(conn, manager);
/// // once the interface has been added to the manager
/// service.attach(3).await?;
/// # Ok(())
/// # }
/// ```
pub struct BusService {
    conn: Connection,
    manager: SharedManager,
    events: mpsc::UnboundedSender<BusEvent>,
    pump: JoinHandle<()>,
}

impl BusService {
    /// Starts the signal pump. Must be called from within a tokio runtime.
    pub fn start(conn: Connection, manager: SharedManager) -> Self {
        let (events, rx) = mpsc::unbounded_channel();
        let pump = tokio::spawn(pump(conn.clone(), Arc::clone(&manager), rx));

        Self {
            conn,
            manager,
            events,
            pump,
        }
    }

    pub fn manager(&self) -> &SharedManager {
        &self.manager
    }

    /// Exports a managed interface and the networks it currently sees.
    ///
    /// # Errors
    ///
    /// - [`StationError::NotFound`] for an unknown interface
    /// - [`StationError::Dbus`] if registration fails
    pub async fn attach(&self, index: u32) -> Result<()> {
        let (device_path, networks) = {
            let mut manager = self.manager.lock().await;
            let station = manager.station_mut(index).ok_or(StationError::NotFound)?;
            let device_path = station.path().to_string();
            let networks: Vec<String> = station
                .catalogue()
                .ranked()
                .map(|n| n.path().to_string())
                .collect();

            let events = self.events.clone();
            let path = device_path.clone();
            station.watch_add(move |event| {
                let forwarded = BusEvent {
                    index,
                    device_path: path.clone(),
                    event: event.clone(),
                };
                if events.send(forwarded).is_err() {
                    debug!("Bus pump is gone, dropping event");
                }
            });

            (device_path, networks)
        };

        let server = self.conn.object_server();
        server
            .at(
                device_path.as_str(),
                DeviceObject::new(Arc::clone(&self.manager), index),
            )
            .await?;
        server
            .at(
                device_path.as_str(),
                WscObject::new(Arc::clone(&self.manager), index),
            )
            .await?;
        debug!("Registered {} at {device_path}", bus::DEVICE_INTERFACE);

        for path in networks {
            register_network(&self.conn, &self.manager, index, path).await?;
        }
        Ok(())
    }

    /// Releases a managed interface and withdraws its objects.
    ///
    /// # Errors
    ///
    /// - [`StationError::NotFound`] for an unknown interface
    /// - [`StationError::Dbus`] if unregistration fails
    pub async fn release(&self, index: u32) -> Result<()> {
        let device_path = {
            let mut manager = self.manager.lock().await;
            let path = manager
                .station(index)
                .map(|s| s.path().to_string())
                .ok_or(StationError::NotFound)?;
            // Network removals flow through the pump.
            manager.remove_station(index)?;
            path
        };

        let server = self.conn.object_server();
        server
            .remove::<WscObject, _>(device_path.as_str())
            .await?;
        server
            .remove::<DeviceObject, _>(device_path.as_str())
            .await?;
        debug!("Removed {} at {device_path}", bus::DEVICE_INTERFACE);
        Ok(())
    }
}

impl Drop for BusService {
    fn drop(&mut self) {
        self.pump.abort();
    }
}

async fn register_network(
    conn: &Connection,
    manager: &SharedManager,
    index: u32,
    path: String,
) -> Result<()> {
    let object = NetworkObject::new(Arc::clone(manager), index, path.clone());
    if conn.object_server().at(path.as_str(), object).await? {
        debug!("Registered {} at {path}", bus::NETWORK_INTERFACE);
    }
    Ok(())
}

async fn pump(
    conn: Connection,
    manager: SharedManager,
    mut rx: mpsc::UnboundedReceiver<BusEvent>,
) {
    while let Some(forwarded) = rx.recv().await {
        if let Err(e) = emit(&conn, &manager, forwarded).await {
            warn!("Failed to publish station event: {e}");
        }
    }
    debug!("Bus pump stopped");
}

async fn emit(conn: &Connection, manager: &SharedManager, forwarded: BusEvent) -> Result<()> {
    let BusEvent {
        index,
        device_path,
        event,
    } = forwarded;
    let server = conn.object_server();

    match event {
        StationEvent::PropertyChanged(property) => {
            let iface_ref = server
                .interface::<_, DeviceObject>(device_path.as_str())
                .await?;
            let iface = iface_ref.get().await;
            let emitter = iface_ref.signal_emitter();
            match property {
                DeviceProperty::Name => iface.name_changed(emitter).await?,
                DeviceProperty::ConnectedNetwork => {
                    iface.connected_network_changed(emitter).await?
                }
                DeviceProperty::Powered => iface.powered_changed(emitter).await?,
                DeviceProperty::Scanning => iface.scanning_changed(emitter).await?,
                DeviceProperty::State => iface.state_changed(emitter).await?,
            }
        }
        StationEvent::NetworkConnectedChanged { path } => {
            let iface_ref = server.interface::<_, NetworkObject>(path.as_str()).await?;
            let iface = iface_ref.get().await;
            iface.connected_changed(iface_ref.signal_emitter()).await?;
        }
        StationEvent::NetworkAdded { path } => {
            register_network(conn, manager, index, path).await?;
        }
        StationEvent::NetworkRemoved { path, reason } => {
            if server.remove::<NetworkObject, _>(path.as_str()).await? {
                debug!("Removed {} at {path}: {reason}", bus::NETWORK_INTERFACE);
            }
        }
        StationEvent::StateChanged { old, new } => {
            debug!("{device_path}: {old} -> {new}");
        }
        StationEvent::WscTargetFound { address } => {
            debug!(
                "{}: {device_path} enrolling with {address:02x?}",
                bus::WSC_INTERFACE
            );
        }
    }
    Ok(())
}
