//! Constants for 802.11 and station bookkeeping values.
//!
//! These constants correspond to the numeric codes carried in information
//! elements (cipher and AKM suite selectors, WSC attribute values) as well
//! as the factors used to rank scan results.

/// BSS capability information bits.
pub mod capability {
    /// Privacy bit; set when the BSS requires WEP or better.
    pub const PRIVACY: u16 = 0x0010;
}

/// Rank computation factors for scan observations.
///
/// Signal strength is reported in mBm (100 * dBm) and is negative, so the
/// base offset keeps every rank positive before the factors are applied.
pub mod rank {
    pub const BASE: f64 = 10000.0;
    pub const RSNE_FACTOR: f64 = 1.2;
    pub const WPA_FACTOR: f64 = 1.0;
    pub const OPEN_FACTOR: f64 = 0.5;
    pub const NO_PRIVACY_FACTOR: f64 = 0.5;
    pub const FIVE_GHZ_FACTOR: f64 = 1.1;
    pub const FIVE_GHZ_THRESHOLD_MHZ: u32 = 4000;

    /// Rank modifiers for known networks, indexed by how recently the
    /// network was connected (0 = most recent). Past the end the last
    /// entry applies.
    pub const KNOWN_NETWORK_MODIFIERS: [f64; 8] = [1.0, 0.9, 0.8, 0.7, 0.6, 0.5, 0.4, 0.3];
}

/// Suite selector OUIs.
pub mod oui {
    pub const IEEE80211: [u8; 3] = [0x00, 0x0f, 0xac];
    pub const MICROSOFT: [u8; 3] = [0x00, 0x50, 0xf2];
    pub const WFA: [u8; 3] = [0x00, 0x50, 0xf2];
}

/// Cipher suite selector types.
pub mod cipher_selector {
    pub const WEP40: u8 = 1;
    pub const TKIP: u8 = 2;
    pub const CCMP: u8 = 4;
    pub const WEP104: u8 = 5;
    pub const BIP: u8 = 6;
}

/// AKM suite selector types.
pub mod akm_selector {
    pub const IEEE8021X: u8 = 1;
    pub const PSK: u8 = 2;
    pub const FT_8021X: u8 = 3;
    pub const FT_PSK: u8 = 4;
    pub const IEEE8021X_SHA256: u8 = 5;
    pub const PSK_SHA256: u8 = 6;
}

/// Information element identifiers.
pub mod element {
    pub const RSN: u8 = 48;
    pub const VENDOR: u8 = 221;
    pub const WPA_OUI_TYPE: u8 = 1;
    pub const RSN_VERSION: u16 = 1;
    pub const WPA_VERSION: u16 = 1;
}

/// Wi-Fi Simple Configuration values used by push-button enrollment.
pub mod wsc {
    pub const DEVICE_PASSWORD_ID_PUSH_BUTTON: u16 = 0x0004;
    pub const CONFIG_METHOD_KEYPAD: u16 = 0x0100;
    pub const CONFIG_METHOD_VIRTUAL_PUSH_BUTTON: u16 = 0x0280;
    pub const RF_BAND_2_4_GHZ: u8 = 0x01;
    pub const RF_BAND_5_GHZ: u8 = 0x02;
    pub const PRIMARY_DEVICE_CATEGORY_OTHER: u16 = 255;
    pub const PRIMARY_DEVICE_OUI_TYPE: u8 = 0x04;

    /// Namespace for deriving the enrollee UUID from the interface address.
    pub const UUID_NAMESPACE: [u8; 16] = [
        0x52, 0x64, 0x80, 0xf8, 0xc9, 0x9b, 0x4b, 0xe5, 0xa6, 0x55, 0x58, 0xed, 0x5f, 0x5d, 0x60,
        0x84,
    ];
}

/// Control-bus naming.
pub mod bus {
    pub const DEFAULT_OBJECT_ROOT: &str = "/net/connman/iwd";
    pub const DEVICE_INTERFACE: &str = "net.connman.iwd.Device";
    pub const NETWORK_INTERFACE: &str = "net.connman.iwd.Network";
    pub const WSC_INTERFACE: &str = "net.connman.iwd.WiFiSimpleConfiguration";
}

/// SSID limits
pub mod ssid {
    pub const MAX_LEN: usize = 32;
}

/// Passphrase limits for pre-shared key networks
pub mod passphrase {
    pub const MIN_LEN: usize = 8;
    pub const MAX_LEN: usize = 63;
    pub const PSK_LEN: usize = 32;
}

/// WiFi frequency constants (MHz)
pub mod frequency {
    pub const BAND_2_4_START: u32 = 2412;
    pub const BAND_2_4_END: u32 = 2472;
    pub const BAND_2_4_CH14: u32 = 2484;
    pub const BAND_5_START: u32 = 5150;
    pub const BAND_5_END: u32 = 5925;
    pub const BAND_6_START: u32 = 5955;
    pub const BAND_6_END: u32 = 7115;
    pub const CHANNEL_SPACING: u32 = 5;
}
