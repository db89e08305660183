// Copyright 2025, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/stylus-sdk-rs/blob/main/licenses/COPYRIGHT.md

use ride_tools::{core::network::Network, ops};

use crate::{common_args::RegistryArgs, error::RideSyncResult};

#[derive(Debug, clap::Args)]
pub struct Args {
    #[arg(long, env = "NETWORK", value_enum)]
    network: Network,
    /// Branch to highlight as the owner of its stages
    #[arg(long, env = "BRANCH", default_value = "")]
    branch: String,

    #[command(flatten)]
    registry: RegistryArgs,
}

pub fn exec(args: Args) -> RideSyncResult {
    let registry = args.registry.open()?;
    ops::list_contracts(&registry, args.network, &args.branch)?;
    Ok(())
}
