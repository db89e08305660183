// Copyright 2025, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/stylus-sdk-rs/blob/main/licenses/COPYRIGHT.md

use std::path::PathBuf;

use ride_tools::ops;

use crate::{common_args::NodeArgs, error::RideSyncResult};

#[derive(Debug, clap::Args)]
pub struct Args {
    /// Local contract source
    file: PathBuf,
    /// Compile in size-optimized mode
    #[arg(long)]
    compact: bool,

    #[command(flatten)]
    node: NodeArgs,
}

pub async fn exec(args: Args) -> RideSyncResult {
    let node = args.node.build_node()?;
    ops::hash(node, &args.file, args.compact).await?;
    Ok(())
}
