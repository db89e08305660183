// Copyright 2025, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/stylus-sdk-rs/blob/main/licenses/COPYRIGHT.md

use std::{path::PathBuf, sync::Arc, time::Duration};

use ride_tools::core::{
    crypto::{Address, KeyPair},
    network::Network,
    node::{NodeApi, NodeClient},
    registry::Registry,
    submit::ConfirmationPolicy,
    sync::AllowHashLibrary,
};

use crate::constants::{
    DEFAULT_ARTIFACTS_DIR, DEFAULT_CONTRACTS_DIR, DEFAULT_DEADLINE_SECS, DEFAULT_PRIMARY_HOSTS,
};

#[derive(Debug, clap::Args)]
pub struct NodeArgs {
    /// Network the node belongs to
    #[arg(long, env = "NETWORK", value_enum)]
    pub network: Network,
    /// Base URL of the node REST API
    #[arg(long, env = "NODE_URL")]
    pub node_url: String,
    /// Hosts whose nodes are called without throttling
    #[arg(
        long,
        env = "PRIMARY_HOSTS",
        value_delimiter = ',',
        default_value = DEFAULT_PRIMARY_HOSTS
    )]
    pub primary_hosts: Vec<String>,
}

impl NodeArgs {
    pub fn build_node(&self) -> eyre::Result<Arc<dyn NodeApi>> {
        let client = NodeClient::new(&self.node_url, self.primary_hosts.as_slice())?;
        Ok(Arc::new(client))
    }

    pub fn chain_id(&self) -> u8 {
        self.network.chain_id()
    }
}

#[derive(Debug, clap::Args)]
pub struct RegistryArgs {
    /// Path to the TOML contract registry
    #[arg(long, env = "REGISTRY_PATH")]
    pub registry: PathBuf,
}

impl RegistryArgs {
    pub fn open(&self) -> eyre::Result<Registry> {
        if !self.registry.is_file() {
            eyre::bail!("registry {} does not exist", self.registry.display());
        }
        Ok(Registry::open(&self.registry))
    }
}

#[derive(Debug, clap::Args)]
pub struct FundingArgs {
    /// Seed phrase of the account paying for fees
    #[arg(long, env = "FEE_SEED", hide_env_values = true)]
    fee_seed: String,
}

impl FundingArgs {
    pub fn account(&self) -> eyre::Result<KeyPair> {
        if self.fee_seed.trim().is_empty() {
            eyre::bail!("empty fee seed");
        }
        Ok(KeyPair::from_seed(&self.fee_seed, 0))
    }
}

/// Accounts running the approved production versions of the pool libraries.
#[derive(Debug, clap::Args)]
pub struct CompareArgs {
    #[arg(long, env = "COMPARE_LP_ADDRESS")]
    compare_lp: String,
    #[arg(long, env = "COMPARE_LP_STABLE_ADDRESS")]
    compare_lp_stable: String,
    #[arg(long, env = "COMPARE_LP_STABLE_ADDON_ADDRESS")]
    compare_lp_stable_addon: String,
}

impl CompareArgs {
    pub fn libraries(&self, network: Network) -> eyre::Result<Vec<AllowHashLibrary>> {
        let chain_id = network.chain_id();
        Ok(AllowHashLibrary::defaults(
            Address::parse(&self.compare_lp, chain_id)?,
            Address::parse(&self.compare_lp_stable, chain_id)?,
            Address::parse(&self.compare_lp_stable_addon, chain_id)?,
        ))
    }
}

#[derive(Debug, clap::Args)]
pub struct ConfirmationArgs {
    /// Times a transaction status is polled before giving up
    #[arg(long, default_value_t = 100, value_parser = clap::value_parser!(u32).range(1..))]
    confirmation_attempts: u32,
    /// Seconds between transaction status polls
    #[arg(long, default_value_t = 10)]
    confirmation_interval: u64,
}

impl ConfirmationArgs {
    pub fn policy(&self) -> ConfirmationPolicy {
        ConfirmationPolicy {
            attempts: self.confirmation_attempts,
            interval: Duration::from_secs(self.confirmation_interval),
        }
    }
}

#[derive(Debug, clap::Args)]
pub struct PathArgs {
    /// Directory holding the contract sources
    #[arg(long, env = "CONTRACTS_DIR", default_value = DEFAULT_CONTRACTS_DIR)]
    pub contracts_dir: PathBuf,
    /// Directory receiving unsigned transactions
    #[arg(long, env = "ARTIFACTS_DIR", default_value = DEFAULT_ARTIFACTS_DIR)]
    pub artifacts_dir: PathBuf,
    #[command(flatten)]
    pub scratch: ScratchArgs,
}

#[derive(Debug, clap::Args)]
pub struct ScratchArgs {
    /// Directory for decompiled scripts while diffing. Defaults to the system temp directory.
    #[arg(long)]
    scratch_dir: Option<PathBuf>,
}

impl ScratchArgs {
    pub fn dir(&self) -> PathBuf {
        self.scratch_dir.clone().unwrap_or_else(std::env::temp_dir)
    }
}

#[derive(Debug, clap::Args)]
pub struct DeadlineArgs {
    /// Seconds after which the command gives up
    #[arg(long, default_value_t = DEFAULT_DEADLINE_SECS)]
    deadline: u64,
}

impl DeadlineArgs {
    pub fn deadline(&self) -> Duration {
        Duration::from_secs(self.deadline)
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[derive(Debug, Parser)]
    struct Cli {
        #[command(flatten)]
        node: NodeArgs,
        #[command(flatten)]
        compare: CompareArgs,
        #[command(flatten)]
        confirmation: ConfirmationArgs,
    }

    #[test]
    fn compare_addresses_must_match_the_network() {
        let lp = KeyPair::from_seed("lp", 0).address(b'W');
        let lp_stable = KeyPair::from_seed("lp_stable", 0).address(b'W');
        let addon = KeyPair::from_seed("lp_stable_addon", 0).address(b'W');
        let cli = Cli::try_parse_from([
            "ride-sync".to_string(),
            "--network=mainnet".into(),
            "--node-url=https://nodes.wx.network".into(),
            format!("--compare-lp={lp}"),
            format!("--compare-lp-stable={lp_stable}"),
            format!("--compare-lp-stable-addon={addon}"),
        ])
        .unwrap();

        assert_eq!(cli.node.primary_hosts, ["wx.network", "waves.exchange"]);
        assert_eq!(cli.confirmation.policy(), ConfirmationPolicy::default());
        let libraries = cli.compare.libraries(cli.node.network).unwrap();
        assert_eq!(libraries.len(), 3);
        assert_eq!(libraries[1].compare_address, lp_stable);
        assert!(cli.compare.libraries(Network::Testnet).is_err());
    }

    #[test]
    fn confirmations_need_at_least_one_attempt() {
        #[derive(Debug, Parser)]
        struct Confirmations {
            #[command(flatten)]
            confirmation: ConfirmationArgs,
        }

        assert!(Confirmations::try_parse_from(["ride-sync", "--confirmation-attempts=0"]).is_err());
        let one = Confirmations::try_parse_from(["ride-sync", "--confirmation-attempts=1"]).unwrap();
        assert_eq!(one.confirmation.policy().attempts, 1);
    }
}
