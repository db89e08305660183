// Copyright 2025, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/stylus-sdk-rs/blob/main/licenses/COPYRIGHT.md

use ride_tools::{core::events::LogSink, ops};

use crate::{
    common_args::{DeadlineArgs, NodeArgs},
    error::RideSyncResult,
};

#[derive(Debug, clap::Args)]
pub struct Args {
    /// Number of blocks to wait for
    blocks: u64,

    #[command(flatten)]
    node: NodeArgs,
    #[command(flatten)]
    deadline: DeadlineArgs,
}

pub async fn exec(args: Args) -> RideSyncResult {
    let node = args.node.build_node()?;
    ops::wait_blocks(node.as_ref(), args.blocks, args.deadline.deadline(), &LogSink).await?;
    Ok(())
}
