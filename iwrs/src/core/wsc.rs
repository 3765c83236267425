//! Wi-Fi Simple Configuration push-button enrollment.
//!
//! Push-button enrollment runs active scans that carry enrollee attributes
//! until exactly one registrar in push-button mode answers. The exchange
//! that follows is handled by the provisioning collaborator; the station
//! only tracks the session and stores the credentials it produces.

use log::debug;
use uuid::Uuid;

use crate::api::bss::ScanBss;
use crate::api::models::{Band, NetworkSettings};
use crate::core::request::Requester;
use crate::types::constants::{oui, wsc};
use crate::util::utils::{address_to_string, band_from_freq, channel_from_freq, ssid_for_log};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestType {
    EnrolleeInfo,
    EnrolleeOpen8021x,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssociationState {
    NotAssociated,
    ConnectionSuccess,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrimaryDeviceType {
    pub category: u16,
    pub oui: [u8; 3],
    pub oui_type: u8,
    pub subcategory: u16,
}

/// Enrollee attributes carried in probe requests. Encoding into the WSC
/// element is left to the link layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WscProbeRequest {
    pub version2: bool,
    pub request_type: RequestType,
    pub config_methods: u16,
    pub uuid_e: [u8; 16],
    pub primary_device_type: PrimaryDeviceType,
    pub rf_bands: u8,
    pub association_state: AssociationState,
    /// 0 means no error
    pub configuration_error: u16,
    pub device_password_id: u16,
    pub request_to_enroll: bool,
}

impl WscProbeRequest {
    /// Probe request for push-button enrollment from the interface at
    /// `addr`, advertising both the 2.4 and 5 GHz bands.
    pub fn push_button(addr: &[u8; 6]) -> Self {
        Self {
            version2: true,
            request_type: RequestType::EnrolleeInfo,
            config_methods: wsc::CONFIG_METHOD_VIRTUAL_PUSH_BUTTON | wsc::CONFIG_METHOD_KEYPAD,
            uuid_e: uuid_from_addr(addr),
            primary_device_type: PrimaryDeviceType {
                category: wsc::PRIMARY_DEVICE_CATEGORY_OTHER,
                oui: oui::WFA,
                oui_type: wsc::PRIMARY_DEVICE_OUI_TYPE,
                subcategory: 0,
            },
            rf_bands: wsc::RF_BAND_2_4_GHZ | wsc::RF_BAND_5_GHZ,
            association_state: AssociationState::NotAssociated,
            configuration_error: 0,
            device_password_id: wsc::DEVICE_PASSWORD_ID_PUSH_BUTTON,
            request_to_enroll: true,
        }
    }
}

/// Derives the enrollee UUID from the interface address. The same address
/// always yields the same UUID.
pub fn uuid_from_addr(addr: &[u8; 6]) -> [u8; 16] {
    let namespace = Uuid::from_bytes(wsc::UUID_NAMESPACE);
    *Uuid::new_v5(&namespace, addr).as_bytes()
}

/// Outcome of looking for a push-button registrar in one scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PbcSelection {
    Target([u8; 6]),
    /// More than one registrar is in push-button mode.
    Overlap,
    /// Nobody is in push-button mode yet; scan again.
    NotFound,
}

/// Picks the registrar to enroll with.
///
/// Two push-button access points on one band, or on different bands with
/// different UUIDs, are a session overlap. A dual-band registrar is
/// reached on 5 GHz.
pub fn select_pbc_target(observations: &[ScanBss]) -> PbcSelection {
    let mut bss_2g: Option<(&ScanBss, [u8; 16])> = None;
    let mut bss_5g: Option<(&ScanBss, [u8; 16])> = None;

    for bss in observations {
        debug!(
            "bss '{}' with SSID: {}, freq: {}",
            address_to_string(&bss.addr),
            ssid_for_log(&bss.ssid),
            bss.frequency
        );

        let Some(probe) = &bss.wsc else {
            continue;
        };

        debug!("SelectedRegistrar: {}", probe.selected_registrar);

        if !probe.selected_registrar
            || probe.device_password_id != wsc::DEVICE_PASSWORD_ID_PUSH_BUTTON
        {
            continue;
        }

        let slot = match band_from_freq(bss.frequency) {
            Some(Band::TwoPointFourGhz) => &mut bss_2g,
            Some(Band::FiveGhz) => &mut bss_5g,
            _ => {
                debug!(
                    "Skipping PBC AP on channel {:?}",
                    channel_from_freq(bss.frequency)
                );
                continue;
            }
        };

        if slot.is_some() {
            debug!("Session overlap on one band");
            return PbcSelection::Overlap;
        }
        *slot = Some((bss, probe.uuid_e));
    }

    match (bss_2g, bss_5g) {
        (Some((_, uuid_2g)), Some((_, uuid_5g))) if uuid_2g != uuid_5g => {
            debug!("Found two PBC APs on different bands");
            PbcSelection::Overlap
        }
        (_, Some((bss, _))) | (Some((bss, _)), None) => {
            debug!("Found AP to connect to: {}", address_to_string(&bss.addr));
            PbcSelection::Target(bss.addr)
        }
        (None, None) => PbcSelection::NotFound,
    }
}

/// Credentials produced by a completed enrollment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WscCredential {
    pub ssid: String,
    pub settings: NetworkSettings,
}

/// An enrollment in progress.
#[derive(Debug)]
pub(crate) struct WscSession {
    pub requester: Requester,
    pub request: WscProbeRequest,
    /// Registrar chosen from the scan results, once found
    pub target: Option<[u8; 6]>,
    /// The session's active scan has not reported results yet
    pub scanning: bool,
}
