use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{SdkError, SdkResult};

pub const PUBNET_PASSPHRASE: &str = "Public Global Stellar Network ; September 2015";
pub const TESTNET_PASSPHRASE: &str = "Test SDF Network ; September 2015";
pub const FUTURENET_PASSPHRASE: &str = "Test SDF Future Network ; October 2022";

/// Network whose ledgers are being transformed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    #[default]
    Pubnet,
    Testnet,
    Futurenet,
}

impl Network {
    pub fn passphrase(self) -> &'static str {
        match self {
            Self::Pubnet => PUBNET_PASSPHRASE,
            Self::Testnet => TESTNET_PASSPHRASE,
            Self::Futurenet => FUTURENET_PASSPHRASE,
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Pubnet => "pubnet",
            Self::Testnet => "testnet",
            Self::Futurenet => "futurenet",
        })
    }
}

/// Configuration for the effects pipeline.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectsConfig {
    /// Network the ledgers come from.
    pub network: Network,
    /// Passphrase override, for private networks.
    pub network_passphrase: Option<String>,
    /// Abort a ledger on the first failed transaction instead of logging
    /// and skipping it.
    pub strict: bool,
    /// Default `tracing` filter directive when `RUST_LOG` is unset.
    pub log_filter: String,
}

impl Default for EffectsConfig {
    fn default() -> Self {
        Self {
            network: Network::Pubnet,
            network_passphrase: None,
            strict: false,
            log_filter: "info".into(),
        }
    }
}

impl EffectsConfig {
    pub fn for_network(network: Network) -> Self {
        Self {
            network,
            ..Default::default()
        }
    }

    /// The override if set, otherwise the network's own passphrase.
    pub fn network_passphrase(&self) -> &str {
        self.network_passphrase
            .as_deref()
            .unwrap_or_else(|| self.network.passphrase())
    }

    pub fn from_toml_str(content: &str) -> SdkResult<Self> {
        toml::from_str(content).map_err(|e| SdkError::Config(e.to_string()))
    }

    pub fn from_file(path: &Path) -> SdkResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let c = EffectsConfig::default();
        assert_eq!(c.network, Network::Pubnet);
        assert!(!c.strict);
        assert_eq!(c.log_filter, "info");
        assert_eq!(c.network_passphrase(), PUBNET_PASSPHRASE);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let c = EffectsConfig::from_toml_str("network = \"testnet\"\nstrict = true\n").unwrap();
        assert_eq!(c.network, Network::Testnet);
        assert!(c.strict);
        assert_eq!(c.log_filter, "info");
        assert_eq!(c.network_passphrase(), TESTNET_PASSPHRASE);
    }

    #[test]
    fn passphrase_override() {
        let c = EffectsConfig::from_toml_str(
            "network = \"futurenet\"\nnetwork_passphrase = \"Standalone Network ; February 2017\"\n",
        )
        .unwrap();
        assert_eq!(c.network_passphrase(), "Standalone Network ; February 2017");
    }

    #[test]
    fn unknown_network_is_rejected() {
        let err = EffectsConfig::from_toml_str("network = \"mainnet\"").unwrap_err();
        assert!(matches!(err, SdkError::Config(_)));
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("effects.toml");
        std::fs::write(&path, "network = \"futurenet\"\nlog_filter = \"efx_engine=debug\"\n").unwrap();
        let c = EffectsConfig::from_file(&path).unwrap();
        assert_eq!(c.network, Network::Futurenet);
        assert_eq!(c.log_filter, "efx_engine=debug");

        let missing = EffectsConfig::from_file(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(missing, SdkError::Io(_)));
    }
}
