// Copyright 2025, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/stylus-sdk-rs/blob/main/licenses/COPYRIGHT.md

//! Target networks and the hosts considered first-party.

use std::{fmt, str::FromStr};

use reqwest::Url;

/// Hosts whose nodes are called without the third-party throttle.
pub const PRIMARY_HOSTS: &[&str] = &["wx.network", "waves.exchange"];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    /// Staging network, split into numbered stages.
    Testnet,
    /// Production network. Changes require out-of-band co-signature.
    Mainnet,
}

#[derive(Debug, thiserror::Error)]
#[error("unknown network {0:?}, expected \"testnet\" or \"mainnet\"")]
pub struct UnknownNetwork(String);

impl Network {
    /// Chain id byte embedded in addresses and transactions.
    pub fn chain_id(self) -> u8 {
        match self {
            Self::Testnet => b'T',
            Self::Mainnet => b'W',
        }
    }

    pub fn is_staging(self) -> bool {
        matches!(self, Self::Testnet)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Testnet => "testnet",
            Self::Mainnet => "mainnet",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Network {
    type Err = UnknownNetwork;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "testnet" => Ok(Self::Testnet),
            "mainnet" => Ok(Self::Mainnet),
            _ => Err(UnknownNetwork(s.to_string())),
        }
    }
}

/// Whether the node at `url` lives on one of `hosts` (or a subdomain of one).
pub fn is_primary_host(url: &str, hosts: &[impl AsRef<str>]) -> bool {
    let Ok(url) = Url::parse(url) else {
        return false;
    };
    let Some(host) = url.host_str() else {
        return false;
    };
    hosts.iter().any(|primary| {
        let primary = primary.as_ref();
        host == primary || host.ends_with(&format!(".{primary}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_ids() {
        assert_eq!(Network::Testnet.chain_id(), 84);
        assert_eq!(Network::Mainnet.chain_id(), 87);
        assert_eq!("MAINNET".parse::<Network>().unwrap(), Network::Mainnet);
        assert!("stagenet".parse::<Network>().is_err());
    }

    #[test]
    fn primary_hosts_match_subdomains() {
        assert!(is_primary_host("https://nodes.wx.network", PRIMARY_HOSTS));
        assert!(is_primary_host("https://waves.exchange/api", PRIMARY_HOSTS));
        assert!(!is_primary_host("https://nodes-testnet.example.org", PRIMARY_HOSTS));
        assert!(!is_primary_host("https://notwx.network", PRIMARY_HOSTS));
        assert!(!is_primary_host("not a url", PRIMARY_HOSTS));
    }
}
