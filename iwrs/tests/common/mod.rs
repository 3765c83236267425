//! Shared fixtures for integration tests: a link layer that records every
//! call and a station wired to it.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use iwrs::{
    AkmSuite, CipherSuite, LinkLayer, MemoryStore, Result, RsnInfo, ScanBss, ScanMode,
    ScanRequest, SecurityContext, SecurityElement, StationConfig, StationError, StationEvent,
    StationInfo, StationManager,
};

pub const INDEX: u32 = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkCall {
    Scan(ScanMode),
    PeriodicScan(bool),
    Connect { bss: [u8; 6], secured: bool },
    Disconnect,
    Powered(bool),
}

#[derive(Clone, Default)]
pub struct Recorder {
    calls: Arc<Mutex<Vec<LinkCall>>>,
    refuse: Arc<Mutex<bool>>,
}

impl Recorder {
    pub fn take(&self) -> Vec<LinkCall> {
        std::mem::take(&mut *self.calls.lock().unwrap())
    }

    pub fn connects(&self) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| matches!(c, LinkCall::Connect { .. }))
            .count()
    }

    pub fn refuse(&self, refuse: bool) {
        *self.refuse.lock().unwrap() = refuse;
    }
}

pub struct RecordingLink(Recorder);

impl RecordingLink {
    fn record(&self, call: LinkCall) -> Result<()> {
        self.0.calls.lock().unwrap().push(call);
        if *self.0.refuse.lock().unwrap() {
            return Err(StationError::Busy);
        }
        Ok(())
    }
}

impl LinkLayer for RecordingLink {
    fn scan(&mut self, request: &ScanRequest) -> Result<()> {
        self.record(LinkCall::Scan(request.mode))
    }

    fn set_periodic_scan(&mut self, enabled: bool) {
        self.0.calls.lock().unwrap().push(LinkCall::PeriodicScan(enabled));
    }

    fn connect(&mut self, bss: &ScanBss, security: Option<SecurityContext>) -> Result<()> {
        self.record(LinkCall::Connect {
            bss: bss.addr,
            secured: security.is_some(),
        })
    }

    fn disconnect(&mut self) -> Result<()> {
        self.record(LinkCall::Disconnect)
    }

    fn set_powered(&mut self, powered: bool) -> Result<()> {
        self.record(LinkCall::Powered(powered))
    }
}

pub struct Fixture {
    pub manager: StationManager,
    pub store: Arc<MemoryStore>,
    pub link: Recorder,
    pub events: Arc<Mutex<Vec<StationEvent>>>,
}

impl Fixture {
    pub fn new(store: MemoryStore) -> Self {
        let store = Arc::new(store);
        let link = Recorder::default();
        let mut manager = StationManager::new(StationConfig::default(), store.clone());

        let info = StationInfo {
            index: INDEX,
            name: "wlan0".into(),
            address: [0x02, 0x00, 0x00, 0x00, 0x00, 0xaa],
            phy: 0,
        };
        let station = manager
            .add_station(info, Box::new(RecordingLink(link.clone())))
            .unwrap();

        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        station.watch_add(move |e| sink.lock().unwrap().push(e.clone()));

        Self {
            manager,
            store,
            link,
            events,
        }
    }

    pub fn take_events(&self) -> Vec<StationEvent> {
        std::mem::take(&mut *self.events.lock().unwrap())
    }
}

pub fn addr(last: u8) -> [u8; 6] {
    [0x00, 0x11, 0x22, 0x33, 0x44, last]
}

pub fn open_bss(last: u8, ssid: &str, signal: i32) -> ScanBss {
    ScanBss::new(addr(last), ssid, 2412, signal)
}

pub fn psk_bss(last: u8, ssid: &str, signal: i32) -> ScanBss {
    ScanBss::new(addr(last), ssid, 5180, signal)
        .with_privacy()
        .with_rsne(SecurityElement::rsn(RsnInfo::new(
            CipherSuite::CCMP,
            CipherSuite::CCMP,
            AkmSuite::PSK,
        )))
}
