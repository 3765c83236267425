//! Utility functions for Wi-Fi data conversion and object naming.
//!
//! Provides helpers for converting between Wi-Fi data representations:
//! frequency to channel and band, SSID bytes to strings, hardware addresses
//! to their colon-separated form, and the object paths derived from them.

use log::warn;
use std::borrow::Cow;
use std::fmt::Write as _;
use std::str;

use crate::api::models::{Band, Security};
use crate::types::constants::{frequency, ssid};

/// Converts a Wi-Fi frequency in MHz to a channel number.
///
/// Supports 2.4GHz (channels 1-14), 5GHz, and 6GHz bands.
/// Returns `None` for frequencies outside known Wi-Fi bands.
pub(crate) fn channel_from_freq(mhz: u32) -> Option<u16> {
    match mhz {
        frequency::BAND_2_4_START..=frequency::BAND_2_4_END => {
            Some(((mhz - frequency::BAND_2_4_START) / frequency::CHANNEL_SPACING + 1) as u16)
        }
        frequency::BAND_2_4_CH14 => Some(14),
        frequency::BAND_5_START..=frequency::BAND_5_END => {
            Some(((mhz - 5000) / frequency::CHANNEL_SPACING) as u16)
        }
        frequency::BAND_6_START..=frequency::BAND_6_END => {
            Some(((mhz - frequency::BAND_6_START) / frequency::CHANNEL_SPACING + 1) as u16)
        }
        _ => None,
    }
}

/// Maps a frequency in MHz to the band it belongs to.
pub(crate) fn band_from_freq(mhz: u32) -> Option<Band> {
    match mhz {
        frequency::BAND_2_4_START..=frequency::BAND_2_4_END | frequency::BAND_2_4_CH14 => {
            Some(Band::TwoPointFourGhz)
        }
        frequency::BAND_5_START..=frequency::BAND_5_END => Some(Band::FiveGhz),
        frequency::BAND_6_START..=frequency::BAND_6_END => Some(Band::SixGhz),
        _ => None,
    }
}

/// Returns true if the SSID can be promoted to a network: at most 32 bytes
/// of valid UTF-8.
pub(crate) fn ssid_is_utf8(bytes: &[u8]) -> bool {
    bytes.len() <= ssid::MAX_LEN && str::from_utf8(bytes).is_ok()
}

/// Decode SSID bytes for display in logs, replacing invalid sequences.
pub(crate) fn ssid_for_log(bytes: &[u8]) -> Cow<'_, str> {
    String::from_utf8_lossy(bytes)
}

/// Decode SSID bytes for comparison purposes, defaulting to empty string if invalid.
pub(crate) fn decode_ssid_or_empty(bytes: &[u8]) -> Cow<'_, str> {
    if bytes.is_empty() {
        return Cow::Borrowed("");
    }

    match str::from_utf8(bytes) {
        Ok(s) => Cow::Borrowed(s),
        Err(e) => {
            warn!("Invalid UTF-8 in SSID during comparison: {e}");
            Cow::Borrowed("")
        }
    }
}

/// Formats a hardware address as `aa:bb:cc:dd:ee:ff`.
pub fn address_to_string(addr: &[u8; 6]) -> String {
    let mut out = String::with_capacity(17);
    for (i, byte) in addr.iter().enumerate() {
        if i > 0 {
            out.push(':');
        }
        let _ = write!(out, "{byte:02x}");
    }
    out
}

/// Hex-encodes every byte of the SSID.
pub(crate) fn ssid_to_hex(ssid: &str) -> String {
    ssid.bytes().fold(String::with_capacity(ssid.len() * 2), |mut out, b| {
        let _ = write!(out, "{b:02x}");
        out
    })
}

/// Builds the object path of an interface from its adapter path and index.
pub(crate) fn device_path(adapter_path: &str, index: u32) -> String {
    format!("{adapter_path}/{index}")
}

/// Builds the identity of a network: the interface path, the hex-encoded
/// SSID and the security tag. The result is both the catalogue key and
/// the externally addressable object path.
pub fn network_path(device_path: &str, ssid: &str, security: Security) -> String {
    format!("{device_path}/{}_{security}", ssid_to_hex(ssid))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_from_freq_2_4ghz() {
        assert_eq!(channel_from_freq(2412), Some(1));
        assert_eq!(channel_from_freq(2437), Some(6));
        assert_eq!(channel_from_freq(2472), Some(13));
        assert_eq!(channel_from_freq(2484), Some(14));
    }

    #[test]
    fn test_channel_from_freq_5ghz() {
        assert_eq!(channel_from_freq(5180), Some(36));
        assert_eq!(channel_from_freq(5500), Some(100));
    }

    #[test]
    fn test_channel_from_freq_invalid() {
        assert_eq!(channel_from_freq(1000), None);
        assert_eq!(channel_from_freq(9999), None);
    }

    #[test]
    fn test_band_from_freq() {
        assert_eq!(band_from_freq(2437), Some(Band::TwoPointFourGhz));
        assert_eq!(band_from_freq(2484), Some(Band::TwoPointFourGhz));
        assert_eq!(band_from_freq(5180), Some(Band::FiveGhz));
        assert_eq!(band_from_freq(6115), Some(Band::SixGhz));
        assert_eq!(band_from_freq(900), None);
    }

    #[test]
    fn test_ssid_is_utf8() {
        assert!(ssid_is_utf8(b"Home"));
        assert!(ssid_is_utf8(b""));
        assert!(ssid_is_utf8("café".as_bytes()));
        assert!(!ssid_is_utf8(&[0xff, 0xfe, 0x41]));
        assert!(!ssid_is_utf8(&[b'a'; 33]));
    }

    #[test]
    fn test_decode_ssid_or_empty() {
        assert_eq!(decode_ssid_or_empty(b"MyNetwork"), "MyNetwork");
        assert_eq!(decode_ssid_or_empty(b""), "");
        assert_eq!(decode_ssid_or_empty(&[0xc3, 0x28]), "");
    }

    #[test]
    fn test_address_to_string() {
        assert_eq!(
            address_to_string(&[0x00, 0x11, 0x22, 0xaa, 0xbb, 0xff]),
            "00:11:22:aa:bb:ff"
        );
    }

    #[test]
    fn test_network_path() {
        assert_eq!(ssid_to_hex("Home"), "486f6d65");
        assert_eq!(
            network_path("/net/connman/iwd/0/3", "Home", Security::Psk),
            "/net/connman/iwd/0/3/486f6d65_psk"
        );
        assert_eq!(
            network_path("/net/connman/iwd/0/3", "Home", Security::None),
            "/net/connman/iwd/0/3/486f6d65_open"
        );
    }

    #[test]
    fn test_device_path() {
        assert_eq!(device_path("/net/connman/iwd/0", 3), "/net/connman/iwd/0/3");
    }
}
