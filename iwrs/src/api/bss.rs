//! Access-point observations as delivered by the link layer.
//!
//! A [`ScanBss`] is one access point seen in one scan cycle. Information
//! elements arrive already parsed by the link layer's element decoder;
//! the station core only reads the parsed view and forwards the raw bytes
//! to the handshake engine.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::core::security::{encode_rsne, encode_wpa};
use crate::types::constants::{capability, rank};

bitflags! {
    /// Cipher suites, as advertised by an access point or supported locally.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct CipherSuite: u8 {
        const WEP40 = 0b0000_0001;
        const TKIP = 0b0000_0010;
        const CCMP = 0b0000_0100;
        const WEP104 = 0b0000_1000;
        /// Group management cipher; never used for data frames.
        const BIP = 0b0001_0000;
    }
}

bitflags! {
    /// Authentication and key management suites.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct AkmSuite: u8 {
        const IEEE8021X = 0b0000_0001;
        const PSK = 0b0000_0010;
        const FT_8021X = 0b0000_0100;
        const FT_PSK = 0b0000_1000;
        const IEEE8021X_SHA256 = 0b0001_0000;
        const PSK_SHA256 = 0b0010_0000;
    }
}

impl AkmSuite {
    /// Every personal (pre-shared key) suite.
    pub const ANY_PSK: AkmSuite = AkmSuite::PSK
        .union(AkmSuite::FT_PSK)
        .union(AkmSuite::PSK_SHA256);

    /// Every enterprise (802.1X) suite.
    pub const ANY_8021X: AkmSuite = AkmSuite::IEEE8021X
        .union(AkmSuite::FT_8021X)
        .union(AkmSuite::IEEE8021X_SHA256);
}

/// Parsed content of an RSN or WPA information element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RsnInfo {
    pub group_cipher: CipherSuite,
    pub pairwise_ciphers: CipherSuite,
    pub akm_suites: AkmSuite,
}

impl RsnInfo {
    pub fn new(group: CipherSuite, pairwise: CipherSuite, akm: AkmSuite) -> Self {
        Self {
            group_cipher: group,
            pairwise_ciphers: pairwise,
            akm_suites: akm,
        }
    }
}

/// Result of decoding a security element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementInfo {
    Parsed(RsnInfo),
    /// The decoder rejected the element; the reason is kept for logging.
    Malformed(String),
}

/// A security element as advertised by an access point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityElement {
    /// Element bytes including the id and length octets
    pub raw: Vec<u8>,
    pub info: ElementInfo,
}

impl SecurityElement {
    /// An RSN element advertising `info`.
    pub fn rsn(info: RsnInfo) -> Self {
        Self {
            raw: encode_rsne(&info),
            info: ElementInfo::Parsed(info),
        }
    }

    /// A WPA vendor element advertising `info`.
    pub fn wpa(info: RsnInfo) -> Self {
        Self {
            raw: encode_wpa(&info),
            info: ElementInfo::Parsed(info),
        }
    }

    /// An element the decoder could not make sense of.
    pub fn malformed(raw: Vec<u8>, reason: impl Into<String>) -> Self {
        Self {
            raw,
            info: ElementInfo::Malformed(reason.into()),
        }
    }
}

/// Parsed Wi-Fi Simple Configuration attributes from a probe response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WscProbeResponse {
    /// A registrar is actively accepting enrollees.
    pub selected_registrar: bool,
    pub device_password_id: u16,
    pub uuid_e: [u8; 16],
}

/// One access point seen in one scan cycle.
///
/// # Examples
///
/// ```rust
/// use iwrs::{AkmSuite, CipherSuite, RsnInfo, ScanBss, SecurityElement};
///
/// let bss = ScanBss::new([0x02, 0, 0, 0, 0, 1], "Home", 5180, -4500)
///     .with_privacy()
///     .with_rsne(SecurityElement::rsn(RsnInfo::new(
///         CipherSuite::CCMP,
///         CipherSuite::CCMP,
///         AkmSuite::PSK,
///     )));
///
/// assert!(bss.rank > 0);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ScanBss {
    /// Hardware address; unique within one scan cycle
    pub addr: [u8; 6],
    /// Raw SSID bytes (0-32, not necessarily UTF-8)
    pub ssid: Vec<u8>,
    /// Frequency in MHz
    pub frequency: u32,
    /// Signal strength in mBm (100 * dBm)
    pub signal_strength: i32,
    /// Capability information field
    pub capability: u16,
    pub rsne: Option<SecurityElement>,
    pub wpa: Option<SecurityElement>,
    pub wsc: Option<WscProbeResponse>,
    /// Desirability derived from signal, security and band
    pub rank: u16,
    /// The AP offers the SHA-256 variant of the negotiated AKM
    pub sha256: bool,
}

impl ScanBss {
    pub fn new(addr: [u8; 6], ssid: impl Into<Vec<u8>>, frequency: u32, signal_strength: i32) -> Self {
        let mut bss = Self {
            addr,
            ssid: ssid.into(),
            frequency,
            signal_strength,
            capability: 0,
            rsne: None,
            wpa: None,
            wsc: None,
            rank: 0,
            sha256: false,
        };
        bss.compute_rank();
        bss
    }

    #[must_use]
    pub fn with_capability(mut self, capability: u16) -> Self {
        self.capability = capability;
        self.compute_rank();
        self
    }

    /// Sets the privacy capability bit.
    #[must_use]
    pub fn with_privacy(self) -> Self {
        let capability = self.capability | capability::PRIVACY;
        self.with_capability(capability)
    }

    #[must_use]
    pub fn with_rsne(mut self, element: SecurityElement) -> Self {
        self.rsne = Some(element);
        self.compute_rank();
        self
    }

    #[must_use]
    pub fn with_wpa(mut self, element: SecurityElement) -> Self {
        self.wpa = Some(element);
        self.compute_rank();
        self
    }

    #[must_use]
    pub fn with_wsc(mut self, wsc: WscProbeResponse) -> Self {
        self.wsc = Some(wsc);
        self
    }

    /// Overrides the computed rank. Later `with_*` calls recompute it.
    #[must_use]
    pub fn with_rank(mut self, rank: u16) -> Self {
        self.rank = rank;
        self
    }

    pub fn has_privacy(&self) -> bool {
        self.capability & capability::PRIVACY != 0
    }

    /// The security element that governs this observation: RSN first,
    /// then WPA.
    pub fn security_element(&self) -> Option<&SecurityElement> {
        self.rsne.as_ref().or(self.wpa.as_ref())
    }

    /// Computes the rank: heavily slanted towards signal strength, then
    /// RSN over WPA over open, privacy, and 5 GHz over 2.4 GHz.
    pub fn compute_rank(&mut self) {
        let mut value = rank::BASE + f64::from(self.signal_strength);

        if self.rsne.is_some() {
            value *= rank::RSNE_FACTOR;
        } else if self.wpa.is_some() {
            value *= rank::WPA_FACTOR;
        } else {
            value *= rank::OPEN_FACTOR;
        }

        if !self.has_privacy() {
            value *= rank::NO_PRIVACY_FACTOR;
        }

        if self.frequency > rank::FIVE_GHZ_THRESHOLD_MHZ {
            value *= rank::FIVE_GHZ_FACTOR;
        }

        self.rank = value.clamp(0.0, f64::from(u16::MAX)) as u16;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn psk_info() -> RsnInfo {
        RsnInfo::new(CipherSuite::CCMP, CipherSuite::CCMP, AkmSuite::PSK)
    }

    #[test]
    fn rank_prefers_rsn_over_wpa_over_open() {
        let addr = [0, 1, 2, 3, 4, 5];
        let open = ScanBss::new(addr, "a", 2412, -5000);
        let wpa = ScanBss::new(addr, "a", 2412, -5000)
            .with_privacy()
            .with_wpa(SecurityElement::wpa(psk_info()));
        let rsn = ScanBss::new(addr, "a", 2412, -5000)
            .with_privacy()
            .with_rsne(SecurityElement::rsn(psk_info()));

        assert!(rsn.rank > wpa.rank);
        assert!(wpa.rank > open.rank);
    }

    #[test]
    fn rank_values() {
        // (10000 - 5000) * 0.5 * 0.5
        let open = ScanBss::new([0; 6], "a", 2412, -5000);
        assert_eq!(open.rank, 1250);

        // (10000 - 5000) * 1.2 * 1.1
        let rsn = ScanBss::new([0; 6], "a", 5180, -5000)
            .with_privacy()
            .with_rsne(SecurityElement::rsn(psk_info()));
        assert_eq!(rsn.rank, 6600);
    }

    #[test]
    fn rank_clamps_to_u16() {
        let mut bss = ScanBss::new([0; 6], "a", 2412, 100_000)
            .with_privacy()
            .with_rsne(SecurityElement::rsn(psk_info()));
        bss.compute_rank();
        assert_eq!(bss.rank, u16::MAX);
    }

    #[test]
    fn rank_override_sticks_until_recompute() {
        let bss = ScanBss::new([0; 6], "a", 2412, -5000).with_rank(50);
        assert_eq!(bss.rank, 50);
    }

    #[test]
    fn security_element_prefers_rsn() {
        let bss = ScanBss::new([0; 6], "a", 2412, -5000)
            .with_wpa(SecurityElement::wpa(psk_info()))
            .with_rsne(SecurityElement::malformed(vec![48, 0], "truncated"));
        assert!(matches!(
            bss.security_element().map(|e| &e.info),
            Some(ElementInfo::Malformed(_))
        ));
    }

    #[test]
    fn akm_groups() {
        assert!(AkmSuite::ANY_PSK.contains(AkmSuite::PSK_SHA256));
        assert!(!AkmSuite::ANY_PSK.intersects(AkmSuite::IEEE8021X));
        assert!(AkmSuite::ANY_8021X.contains(AkmSuite::FT_8021X));
    }
}
