use serde::{Deserialize, Serialize};

use crate::api::bss::CipherSuite;
use crate::types::constants::bus;

/// Station configuration.
///
/// Controls the initial autoconnect policy, where objects are exposed on
/// the control bus, and which ciphers the local hardware supports.
///
/// # Examples
///
/// ```rust
/// use iwrs::{CipherSuite, StationConfig};
///
/// // Defaults: autoconnect on, CCMP and TKIP
/// let config = StationConfig::default();
/// assert!(config.autoconnect);
///
/// // CCMP-only hardware, manual connections
/// let config = StationConfig::default()
///     .with_autoconnect(false)
///     .with_supported_ciphers(CipherSuite::CCMP);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StationConfig {
    /// Whether interfaces start in autoconnect mode when they come up
    pub autoconnect: bool,
    /// Object path prefix for exported objects
    pub object_root: String,
    /// Pairwise and group ciphers the hardware can run
    pub supported_ciphers: CipherSuite,
}

impl Default for StationConfig {
    /// Returns the default configuration.
    ///
    /// Defaults:
    /// - `autoconnect`: `true`
    /// - `object_root`: `/net/connman/iwd`
    /// - `supported_ciphers`: CCMP | TKIP
    fn default() -> Self {
        Self {
            autoconnect: true,
            object_root: bus::DEFAULT_OBJECT_ROOT.to_string(),
            supported_ciphers: CipherSuite::CCMP | CipherSuite::TKIP,
        }
    }
}

impl StationConfig {
    #[must_use]
    pub fn with_autoconnect(mut self, autoconnect: bool) -> Self {
        self.autoconnect = autoconnect;
        self
    }

    #[must_use]
    pub fn with_object_root(mut self, root: impl Into<String>) -> Self {
        self.object_root = root.into();
        self
    }

    #[must_use]
    pub fn with_supported_ciphers(mut self, ciphers: CipherSuite) -> Self {
        self.supported_ciphers = ciphers;
        self
    }

    /// Object path of an adapter (wiphy) under the configured root.
    pub fn adapter_path(&self, phy: u32) -> String {
        format!("{}/{phy}", self.object_root.trim_end_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = StationConfig::default();
        assert!(config.autoconnect);
        assert_eq!(config.object_root, "/net/connman/iwd");
        assert!(config.supported_ciphers.contains(CipherSuite::CCMP));
        assert!(config.supported_ciphers.contains(CipherSuite::TKIP));
    }

    #[test]
    fn builder_overrides() {
        let config = StationConfig::default()
            .with_autoconnect(false)
            .with_object_root("/test/")
            .with_supported_ciphers(CipherSuite::CCMP);

        assert!(!config.autoconnect);
        assert_eq!(config.adapter_path(0), "/test/0");
        assert_eq!(config.supported_ciphers, CipherSuite::CCMP);
    }
}
