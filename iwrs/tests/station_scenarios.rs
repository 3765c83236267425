//! End-to-end behaviour of one station driven through the manager.

mod common;

use common::{Fixture, INDEX, LinkCall, addr, open_bss, psk_bss};
use iwrs::{
    ConnectOutcome, LinkEvent, LinkNotification, MemoryStore, NetworkSettings, RemovalReason,
    Secret, Security, StationError, StationEvent, StationState, requester,
};

fn scan(fx: &mut Fixture, observations: Vec<iwrs::ScanBss>) {
    fx.manager
        .dispatch(INDEX, LinkNotification::ScanResults(observations))
        .unwrap();
}

fn notify(fx: &mut Fixture, notification: LinkNotification) {
    fx.manager.dispatch(INDEX, notification).unwrap();
}

fn up(fx: &mut Fixture) {
    notify(fx, LinkNotification::Up);
    fx.link.take();
    fx.take_events();
}

#[test]
fn test_same_ssid_different_security_are_two_networks() {
    let mut fx = Fixture::new(MemoryStore::new());
    up(&mut fx);

    scan(
        &mut fx,
        vec![open_bss(1, "Home", -5000), psk_bss(2, "Home", -5000)],
    );

    let station = fx.manager.station(INDEX).unwrap();
    let catalogue = station.catalogue();
    assert_eq!(catalogue.len(), 2);

    let open = catalogue.find("Home", Security::None).unwrap();
    let psk = catalogue.find("Home", Security::Psk).unwrap();
    assert_eq!(open.ssid(), psk.ssid());
    assert_ne!(open.path(), psk.path());
    assert!(open.path().ends_with("_open"));
    assert!(psk.path().ends_with("_psk"));
}

#[test]
fn test_autoconnect_aborted_returns_to_autoconnect() {
    let mut fx = Fixture::new(MemoryStore::new().with_network("Home", NetworkSettings::Open));
    up(&mut fx);
    assert_eq!(
        fx.manager.station(INDEX).unwrap().state(),
        StationState::Autoconnect
    );

    scan(&mut fx, vec![open_bss(1, "Home", -5000).with_rank(50)]);
    assert_eq!(
        fx.link.take(),
        vec![LinkCall::Connect {
            bss: addr(1),
            secured: false
        }]
    );

    notify(&mut fx, LinkNotification::ConnectResult(ConnectOutcome::Aborted));

    let station = fx.manager.station(INDEX).unwrap();
    assert_eq!(station.state(), StationState::Autoconnect);
    assert!(station.connected_network().is_none());
    assert_eq!(fx.link.connects(), 0);
}

#[test]
fn test_connect_while_connecting_is_busy() {
    let mut fx = Fixture::new(MemoryStore::new().with_network("Home", NetworkSettings::Open));
    up(&mut fx);
    scan(&mut fx, vec![open_bss(1, "Home", -5000)]);
    fx.link.take();
    fx.take_events();

    let station = fx.manager.station_mut(INDEX).unwrap();
    assert_eq!(station.state(), StationState::Connecting);
    let path = station.connected_network().unwrap().to_string();

    let (tx, _rx) = requester();
    assert!(matches!(
        station.connect_network(&path, Some(tx)),
        Err(StationError::Busy)
    ));
    assert_eq!(station.state(), StationState::Connecting);
    assert!(fx.link.take().is_empty());
    assert!(fx.take_events().is_empty());
}

#[test]
fn test_connected_bss_survives_missing_from_scan() {
    let mut fx = Fixture::new(MemoryStore::new().with_network("Home", NetworkSettings::Open));
    up(&mut fx);
    scan(&mut fx, vec![open_bss(1, "Home", -5000)]);
    notify(&mut fx, LinkNotification::ConnectResult(ConnectOutcome::Success));
    fx.take_events();

    scan(&mut fx, vec![open_bss(2, "Cafe", -4000)]);

    let station = fx.manager.station(INDEX).unwrap();
    assert_eq!(station.state(), StationState::Connected);
    assert_eq!(station.connected_bss(), Some(addr(1)));
    assert!(station.catalogue().bss(&addr(1)).is_some());

    let home = station.catalogue().find("Home", Security::None).unwrap();
    assert!(home.contains_bss(&addr(1)));
    assert_eq!(station.connected_network(), Some(home.path()));

    let events = fx.take_events();
    assert!(
        !events
            .iter()
            .any(|e| matches!(e, StationEvent::StateChanged { .. }))
    );
    assert!(
        !events
            .iter()
            .any(|e| matches!(e, StationEvent::NetworkRemoved { .. }))
    );
}

#[test]
fn test_lost_beacon_fails_pending_connect() {
    let mut fx = Fixture::new(MemoryStore::new());
    up(&mut fx);
    scan(&mut fx, vec![open_bss(1, "Cafe", -5000)]);

    let station = fx.manager.station_mut(INDEX).unwrap();
    let path = station
        .catalogue()
        .find("Cafe", Security::None)
        .unwrap()
        .path()
        .to_string();
    let (tx, mut rx) = requester();
    station.connect_network(&path, Some(tx)).unwrap();
    fx.take_events();

    notify(&mut fx, LinkNotification::Event(LinkEvent::LostBeacon));

    assert!(matches!(rx.try_recv(), Ok(Err(StationError::LinkFailed))));
    let station = fx.manager.station(INDEX).unwrap();
    assert_eq!(station.state(), StationState::Autoconnect);
    assert!(station.connected_network().is_none());
    assert!(station.connected_bss().is_none());

    let transitions: Vec<_> = fx
        .take_events()
        .into_iter()
        .filter_map(|e| match e {
            StationEvent::StateChanged { new, .. } => Some(new),
            _ => None,
        })
        .collect();
    assert_eq!(
        transitions,
        vec![StationState::Disconnected, StationState::Autoconnect]
    );
}

#[test]
fn test_lost_beacon_while_connected() {
    let mut fx = Fixture::new(MemoryStore::new().with_network("Home", NetworkSettings::Open));
    up(&mut fx);
    scan(&mut fx, vec![open_bss(1, "Home", -5000)]);
    notify(&mut fx, LinkNotification::ConnectResult(ConnectOutcome::Success));

    notify(&mut fx, LinkNotification::Event(LinkEvent::LostBeacon));

    let station = fx.manager.station(INDEX).unwrap();
    assert_eq!(station.state(), StationState::Autoconnect);
    assert!(station.connected_network().is_none());
}

#[test]
fn test_network_out_of_range_is_announced_before_removal() {
    let mut fx = Fixture::new(MemoryStore::new());
    up(&mut fx);
    scan(
        &mut fx,
        vec![open_bss(1, "Cafe", -5000), open_bss(2, "Library", -5000)],
    );
    let cafe = fx
        .manager
        .station(INDEX)
        .unwrap()
        .catalogue()
        .find("Cafe", Security::None)
        .unwrap()
        .path()
        .to_string();
    fx.take_events();

    scan(&mut fx, vec![open_bss(2, "Library", -5000)]);

    assert_eq!(
        fx.take_events(),
        vec![StationEvent::NetworkRemoved {
            path: cafe.clone(),
            reason: RemovalReason::OutOfRange
        }]
    );
    let station = fx.manager.station(INDEX).unwrap();
    assert!(station.network(&cafe).is_none());
    assert_eq!(station.catalogue().len(), 1);
}

#[test]
fn test_ordered_networks_best_first() {
    let mut fx = Fixture::new(MemoryStore::new());
    up(&mut fx);
    scan(
        &mut fx,
        vec![
            open_bss(1, "Weak", -8000),
            open_bss(2, "Strong", -3000),
            open_bss(3, "Middle", -6000),
        ],
    );

    let names: Vec<String> = fx
        .manager
        .station(INDEX)
        .unwrap()
        .ordered_networks()
        .into_iter()
        .map(|n| n.name)
        .collect();
    assert_eq!(names, vec!["Strong", "Middle", "Weak"]);
}

#[test]
fn test_explicit_disconnect_is_pessimistic() {
    let mut fx = Fixture::new(MemoryStore::new().with_network("Home", NetworkSettings::Open));
    up(&mut fx);
    scan(&mut fx, vec![open_bss(1, "Home", -5000)]);
    notify(&mut fx, LinkNotification::ConnectResult(ConnectOutcome::Success));
    fx.take_events();
    fx.link.take();

    let station = fx.manager.station_mut(INDEX).unwrap();
    station.set_autoconnect(false);
    let (tx, mut rx) = requester();
    station.disconnect(Some(tx)).unwrap();

    // cleared and announced before the link layer confirms anything
    assert!(station.connected_network().is_none());
    assert_eq!(station.state(), StationState::Disconnecting);
    assert!(
        fx.take_events()
            .iter()
            .any(|e| matches!(e, StationEvent::NetworkConnectedChanged { .. }))
    );
    assert_eq!(fx.link.take(), vec![LinkCall::Disconnect]);

    notify(&mut fx, LinkNotification::DisconnectResult(true));
    assert!(matches!(rx.try_recv(), Ok(Ok(()))));
    assert_eq!(
        fx.manager.station(INDEX).unwrap().state(),
        StationState::Disconnected
    );
}

#[test]
fn test_known_psk_network_autoconnects_with_stored_secret() {
    let secret = NetworkSettings::Psk(Secret::passphrase("correct horse").unwrap());
    let mut fx = Fixture::new(MemoryStore::new().with_network("Office", secret));
    up(&mut fx);

    scan(
        &mut fx,
        vec![psk_bss(1, "Office", -7000), psk_bss(2, "Office", -4000)],
    );

    // best access point of the network first
    assert_eq!(
        fx.link.take(),
        vec![LinkCall::Connect {
            bss: addr(2),
            secured: true
        }]
    );
}

#[test]
fn test_link_down_tears_everything_down() {
    let mut fx = Fixture::new(MemoryStore::new().with_network("Home", NetworkSettings::Open));
    up(&mut fx);
    scan(&mut fx, vec![open_bss(1, "Home", -5000)]);
    notify(&mut fx, LinkNotification::ConnectResult(ConnectOutcome::Success));
    fx.take_events();

    notify(&mut fx, LinkNotification::Down);

    let station = fx.manager.station(INDEX).unwrap();
    assert_eq!(station.state(), StationState::Off);
    assert!(!station.is_powered());
    assert!(station.catalogue().is_empty());
    assert!(station.connected_network().is_none());
    assert!(fx.take_events().iter().any(|e| matches!(
        e,
        StationEvent::NetworkRemoved {
            reason: RemovalReason::Shutdown,
            ..
        }
    )));
}
