// Copyright 2025, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/stylus-sdk-rs/blob/main/licenses/COPYRIGHT.md

use std::path::PathBuf;

use ride_tools::{core::crypto::Address, ops};

use crate::{
    common_args::{NodeArgs, ScratchArgs},
    error::RideSyncResult,
};

#[derive(Debug, clap::Args)]
pub struct Args {
    /// Local contract source
    file: PathBuf,
    /// Account whose program is compared against
    #[arg(long)]
    address: String,
    /// Compile in size-optimized mode
    #[arg(long)]
    compact: bool,

    #[command(flatten)]
    node: NodeArgs,
    #[command(flatten)]
    scratch: ScratchArgs,
}

pub async fn exec(args: Args) -> RideSyncResult {
    let address = Address::parse(&args.address, args.node.chain_id())?;
    let node = args.node.build_node()?;
    ops::diff(node, &args.file, args.compact, &address, args.scratch.dir()).await?;
    Ok(())
}
