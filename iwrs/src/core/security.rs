//! Security classification and per-attempt security context construction.
//!
//! Each observation is classified into a [`Security`] type when it is
//! ingested. Before a secured connect attempt the station negotiates
//! ciphers and AKM against the local capability, builds its own RSN or WPA
//! element and bundles the secret for the handshake engine.

use log::debug;

use crate::api::bss::{AkmSuite, CipherSuite, ElementInfo, RsnInfo, ScanBss};
use crate::api::models::{EapSettings, NetworkSettings, Result, Secret, Security, StationError};
use crate::types::constants::{akm_selector, cipher_selector, element, oui};

/// Which element format a context negotiates with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Rsn,
    Wpa,
}

/// Secret material for the handshake engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandshakeSecret {
    Psk(Secret),
    Eap(EapSettings),
}

/// Everything the handshake engine needs for one connect attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityContext {
    /// SSID, for passphrase to PSK derivation
    pub ssid: String,
    /// Access point address
    pub authenticator: [u8; 6],
    /// Our interface address
    pub supplicant: [u8; 6],
    pub akm: AkmSuite,
    pub pairwise_cipher: CipherSuite,
    pub group_cipher: CipherSuite,
    pub kind: ElementKind,
    /// Element advertised by the access point
    pub ap_element: Vec<u8>,
    /// Element we send in the association request
    pub own_element: Vec<u8>,
    pub secret: HandshakeSecret,
}

/// Derives the security type of an observation and tags SHA-256 AKM
/// support.
///
/// # Errors
///
/// Returns [`StationError::InvalidInput`] when the governing security
/// element could not be parsed.
pub(crate) fn classify(bss: &mut ScanBss) -> Result<Security> {
    let info = match bss.security_element().map(|e| &e.info) {
        Some(ElementInfo::Parsed(info)) => Some(*info),
        Some(ElementInfo::Malformed(reason)) => {
            return Err(StationError::InvalidInput(format!(
                "unparseable security element: {reason}"
            )));
        }
        None => None,
    };

    let security = match info {
        Some(info) if info.akm_suites.intersects(AkmSuite::ANY_PSK) => Security::Psk,
        Some(info) if info.akm_suites.intersects(AkmSuite::ANY_8021X) => Security::Ieee8021x,
        _ if bss.has_privacy() => Security::Wep,
        _ => Security::None,
    };

    bss.sha256 = match (security, info) {
        (Security::Psk, Some(info)) => info.akm_suites.contains(AkmSuite::PSK_SHA256),
        (Security::Ieee8021x, Some(info)) => info.akm_suites.contains(AkmSuite::IEEE8021X_SHA256),
        _ => false,
    };

    Ok(security)
}

/// Picks the strongest cipher both sides support: CCMP, then TKIP.
pub(crate) fn select_cipher(offered: CipherSuite, local: CipherSuite) -> Option<CipherSuite> {
    let common = offered & local;
    [CipherSuite::CCMP, CipherSuite::TKIP]
        .into_iter()
        .find(|c| common.contains(*c))
}

pub(crate) fn select_akm(security: Security, sha256: bool) -> AkmSuite {
    match (security, sha256) {
        (Security::Psk, true) => AkmSuite::PSK_SHA256,
        (Security::Psk, false) => AkmSuite::PSK,
        (_, true) => AkmSuite::IEEE8021X_SHA256,
        (_, false) => AkmSuite::IEEE8021X,
    }
}

/// Builds the security context for connecting to `bss`.
///
/// Returns `Ok(None)` for open networks, which need no handshake.
///
/// # Errors
///
/// - [`StationError::NotSupported`] for WEP, for an access point without a
///   usable security element, or when no cipher is shared
/// - [`StationError::NoSecrets`] when `settings` does not carry material
///   for `security`
/// - [`StationError::InvalidInput`] for incomplete enterprise settings
pub(crate) fn build_context(
    bss: &ScanBss,
    ssid: &str,
    security: Security,
    settings: Option<NetworkSettings>,
    own_address: [u8; 6],
    local_ciphers: CipherSuite,
) -> Result<Option<SecurityContext>> {
    match security {
        Security::None => return Ok(None),
        Security::Wep => return Err(StationError::NotSupported),
        Security::Psk | Security::Ieee8021x => {}
    }

    let element = bss.security_element().ok_or(StationError::NotSupported)?;
    let ElementInfo::Parsed(ap_info) = &element.info else {
        return Err(StationError::NotSupported);
    };
    let kind = if bss.rsne.is_some() {
        ElementKind::Rsn
    } else {
        ElementKind::Wpa
    };

    let pairwise = select_cipher(ap_info.pairwise_ciphers, local_ciphers).ok_or_else(|| {
        debug!(
            "No common pairwise cipher: AP {:?}, local {:?}",
            ap_info.pairwise_ciphers, local_ciphers
        );
        StationError::NotSupported
    })?;
    let group = select_cipher(ap_info.group_cipher, local_ciphers).ok_or_else(|| {
        debug!(
            "No common group cipher: AP {:?}, local {:?}",
            ap_info.group_cipher, local_ciphers
        );
        StationError::NotSupported
    })?;

    let akm = select_akm(security, bss.sha256 && kind == ElementKind::Rsn);

    let secret = match (security, settings) {
        (Security::Psk, Some(NetworkSettings::Psk(secret))) => HandshakeSecret::Psk(secret),
        (Security::Ieee8021x, Some(NetworkSettings::Eap(eap))) => {
            eap.validate()?;
            HandshakeSecret::Eap(eap)
        }
        _ => return Err(StationError::NoSecrets),
    };

    let own = RsnInfo::new(group, pairwise, akm);
    let own_element = match kind {
        ElementKind::Rsn => encode_rsne(&own),
        ElementKind::Wpa => encode_wpa(&own),
    };

    Ok(Some(SecurityContext {
        ssid: ssid.to_string(),
        authenticator: bss.addr,
        supplicant: own_address,
        akm,
        pairwise_cipher: pairwise,
        group_cipher: group,
        kind,
        ap_element: element.raw.clone(),
        own_element,
        secret,
    }))
}

fn cipher_type(cipher: CipherSuite) -> u8 {
    if cipher == CipherSuite::WEP40 {
        cipher_selector::WEP40
    } else if cipher == CipherSuite::TKIP {
        cipher_selector::TKIP
    } else if cipher == CipherSuite::WEP104 {
        cipher_selector::WEP104
    } else if cipher == CipherSuite::BIP {
        cipher_selector::BIP
    } else {
        cipher_selector::CCMP
    }
}

fn akm_type(akm: AkmSuite) -> u8 {
    if akm == AkmSuite::IEEE8021X {
        akm_selector::IEEE8021X
    } else if akm == AkmSuite::FT_8021X {
        akm_selector::FT_8021X
    } else if akm == AkmSuite::FT_PSK {
        akm_selector::FT_PSK
    } else if akm == AkmSuite::IEEE8021X_SHA256 {
        akm_selector::IEEE8021X_SHA256
    } else if akm == AkmSuite::PSK_SHA256 {
        akm_selector::PSK_SHA256
    } else {
        akm_selector::PSK
    }
}

/// Appends version, group, pairwise list and AKM list.
fn encode_suites(out: &mut Vec<u8>, version: u16, selector_oui: [u8; 3], info: &RsnInfo) {
    out.extend_from_slice(&version.to_le_bytes());

    // An empty group cipher encodes as CCMP, the RSN default.
    let group = info.group_cipher.iter().next().unwrap_or(CipherSuite::CCMP);
    out.extend_from_slice(&selector_oui);
    out.push(cipher_type(group));

    out.extend_from_slice(&(info.pairwise_ciphers.iter().count() as u16).to_le_bytes());
    for cipher in info.pairwise_ciphers.iter() {
        out.extend_from_slice(&selector_oui);
        out.push(cipher_type(cipher));
    }

    out.extend_from_slice(&(info.akm_suites.iter().count() as u16).to_le_bytes());
    for akm in info.akm_suites.iter() {
        out.extend_from_slice(&selector_oui);
        out.push(akm_type(akm));
    }
}

/// Encodes an RSN element (id 48) with zeroed capabilities.
pub(crate) fn encode_rsne(info: &RsnInfo) -> Vec<u8> {
    let mut body = Vec::with_capacity(20);
    encode_suites(&mut body, element::RSN_VERSION, oui::IEEE80211, info);
    body.extend_from_slice(&[0, 0]);

    let mut out = Vec::with_capacity(body.len() + 2);
    out.push(element::RSN);
    out.push(body.len() as u8);
    out.extend_from_slice(&body);
    out
}

/// Encodes a WPA vendor element (id 221, OUI 00:50:F2 type 1).
pub(crate) fn encode_wpa(info: &RsnInfo) -> Vec<u8> {
    let mut body = Vec::with_capacity(22);
    body.extend_from_slice(&oui::MICROSOFT);
    body.push(element::WPA_OUI_TYPE);
    encode_suites(&mut body, element::WPA_VERSION, oui::MICROSOFT, info);

    let mut out = Vec::with_capacity(body.len() + 2);
    out.push(element::VENDOR);
    out.push(body.len() as u8);
    out.extend_from_slice(&body);
    out
}
