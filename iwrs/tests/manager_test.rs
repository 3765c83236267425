//! Interface lifecycle, power and enrollment through the manager.

mod common;

use std::sync::{Arc, Mutex};

use common::{Fixture, INDEX, LinkCall, addr, open_bss};
use iwrs::{
    DeviceEvent, LinkNotification, MemoryStore, NetworkSettings, ScanBss, ScanMode, Secret,
    Security, StationError, StationEvent, StationState, WscCredential, WscProbeResponse,
    requester,
};

fn pbc_bss(last: u8, freq: u32, uuid: u8) -> ScanBss {
    ScanBss::new(addr(last), "Printer", freq, -5000).with_wsc(WscProbeResponse {
        selected_registrar: true,
        device_password_id: 0x0004,
        uuid_e: [uuid; 16],
    })
}

fn watch_devices(fx: &mut Fixture) -> Arc<Mutex<Vec<DeviceEvent>>> {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    fx.manager.watch_add(move |e| sink.lock().unwrap().push(*e));
    events
}

#[test]
fn test_power_cycle_announces_interface() {
    let mut fx = Fixture::new(MemoryStore::new());
    let devices = watch_devices(&mut fx);

    fx.manager.dispatch(INDEX, LinkNotification::Up).unwrap();
    assert_eq!(*devices.lock().unwrap(), vec![DeviceEvent::Inserted(INDEX)]);

    let (tx, mut rx) = requester();
    fx.manager
        .station_mut(INDEX)
        .unwrap()
        .set_powered(false, tx)
        .unwrap();
    assert!(fx.link.take().contains(&LinkCall::Powered(false)));

    fx.manager
        .dispatch(INDEX, LinkNotification::PoweredResult(Ok(())))
        .unwrap();
    fx.manager.dispatch(INDEX, LinkNotification::Down).unwrap();

    assert!(matches!(rx.try_recv(), Ok(Ok(()))));
    assert_eq!(
        *devices.lock().unwrap(),
        vec![DeviceEvent::Inserted(INDEX), DeviceEvent::Removed(INDEX)]
    );
    assert_eq!(
        fx.manager.station(INDEX).unwrap().state(),
        StationState::Off
    );
}

#[test]
fn test_failed_power_change_is_reported() {
    let mut fx = Fixture::new(MemoryStore::new());
    let (tx, mut rx) = requester();
    fx.manager
        .station_mut(INDEX)
        .unwrap()
        .set_powered(true, tx)
        .unwrap();

    fx.manager
        .dispatch(
            INDEX,
            LinkNotification::PoweredResult(Err(StationError::LinkFailed)),
        )
        .unwrap();
    assert!(matches!(rx.try_recv(), Ok(Err(StationError::LinkFailed))));
    assert!(!fx.manager.station(INDEX).unwrap().is_powered());
}

#[test]
fn test_removing_station_aborts_pending_requests() {
    let mut fx = Fixture::new(MemoryStore::new());
    fx.manager.dispatch(INDEX, LinkNotification::Up).unwrap();
    let devices = watch_devices(&mut fx);

    let (tx, mut rx) = requester();
    fx.manager.station_mut(INDEX).unwrap().scan(tx).unwrap();

    fx.manager.remove_station(INDEX).unwrap();
    assert!(matches!(rx.try_recv(), Ok(Err(StationError::Aborted))));
    assert_eq!(*devices.lock().unwrap(), vec![DeviceEvent::Removed(INDEX)]);
    assert!(fx.manager.station(INDEX).is_none());
}

#[test]
fn test_watchers_stop_after_removal() {
    let mut fx = Fixture::new(MemoryStore::new());
    let devices = watch_devices(&mut fx);
    let id = fx.manager.watch_add(|_| panic!("removed watcher called"));
    assert!(fx.manager.watch_remove(id));

    fx.manager.dispatch(INDEX, LinkNotification::Up).unwrap();
    assert_eq!(devices.lock().unwrap().len(), 1);
}

#[test]
fn test_push_button_enrollment() {
    let mut fx = Fixture::new(MemoryStore::new());
    fx.manager.dispatch(INDEX, LinkNotification::Up).unwrap();
    fx.link.take();

    let (tx, mut rx) = requester();
    fx.manager
        .station_mut(INDEX)
        .unwrap()
        .wsc_push_button(tx)
        .unwrap();
    assert_eq!(fx.link.take(), vec![LinkCall::Scan(ScanMode::Active)]);

    fx.manager
        .dispatch(
            INDEX,
            LinkNotification::ScanResults(vec![pbc_bss(1, 2412, 9), pbc_bss(2, 5200, 9)]),
        )
        .unwrap();
    assert!(
        fx.take_events()
            .contains(&StationEvent::WscTargetFound { address: addr(2) })
    );

    let settings = NetworkSettings::Psk(Secret::passphrase("printer-secret").unwrap());
    fx.manager
        .station_mut(INDEX)
        .unwrap()
        .wsc_complete(Ok(vec![WscCredential {
            ssid: "Printer".into(),
            settings,
        }]))
        .unwrap();

    assert!(matches!(rx.try_recv(), Ok(Ok(()))));
    assert_eq!(
        fx.store.known(),
        vec![("Printer".to_string(), Security::Psk)]
    );
}

#[test]
fn test_push_button_session_overlap() {
    let mut fx = Fixture::new(MemoryStore::new());
    fx.manager.dispatch(INDEX, LinkNotification::Up).unwrap();

    let (tx, mut rx) = requester();
    fx.manager
        .station_mut(INDEX)
        .unwrap()
        .wsc_push_button(tx)
        .unwrap();
    fx.manager
        .dispatch(
            INDEX,
            LinkNotification::ScanResults(vec![pbc_bss(1, 2412, 1), pbc_bss(2, 5180, 2)]),
        )
        .unwrap();

    assert!(matches!(rx.try_recv(), Ok(Err(StationError::SessionOverlap))));
    assert!(!fx.manager.station(INDEX).unwrap().wsc_pending());
}

#[test]
fn test_push_button_blocks_autoconnect() {
    let mut fx = Fixture::new(MemoryStore::new().with_network("Home", NetworkSettings::Open));
    fx.manager.dispatch(INDEX, LinkNotification::Up).unwrap();

    let (tx, _rx) = requester();
    fx.manager
        .station_mut(INDEX)
        .unwrap()
        .wsc_push_button(tx)
        .unwrap();
    fx.link.take();

    fx.manager
        .dispatch(
            INDEX,
            LinkNotification::ScanResults(vec![open_bss(1, "Home", -4000), pbc_bss(2, 2437, 1)]),
        )
        .unwrap();

    assert_eq!(fx.link.connects(), 0);
    assert_eq!(
        fx.manager.station(INDEX).unwrap().state(),
        StationState::Autoconnect
    );
}

#[test]
fn test_scan_refused_by_link_layer() {
    let mut fx = Fixture::new(MemoryStore::new());
    fx.manager.dispatch(INDEX, LinkNotification::Up).unwrap();
    fx.link.refuse(true);

    let (tx, _rx) = requester();
    assert!(matches!(
        fx.manager.station_mut(INDEX).unwrap().scan(tx),
        Err(StationError::Rejected)
    ));
    assert!(!fx.manager.station(INDEX).unwrap().is_scanning());
}
