// Copyright 2025, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/stylus-sdk-rs/blob/main/licenses/COPYRIGHT.md

use crate::error::RideSyncResult;

mod contracts;
mod diff;
mod hash;
mod sync;
mod wait_blocks;

#[derive(Debug, clap::Subcommand)]
pub enum Command {
    /// Run one synchronization pass over every contract in the registry
    #[clap(visible_alias = "s")]
    Sync(sync::Args),
    /// Print the source diff between a local contract and a deployed program
    #[clap(visible_alias = "d")]
    Diff(diff::Args),
    /// Print the allowed-script hash of a local contract
    Hash(hash::Args),
    /// List registry records for a network
    #[clap(visible_alias = "c")]
    Contracts(contracts::Args),
    /// Wait until the chain advances a number of blocks
    WaitBlocks(wait_blocks::Args),
}

pub async fn exec(cmd: Command) -> RideSyncResult {
    match cmd {
        Command::Sync(args) => sync::exec(args).await,
        Command::Diff(args) => diff::exec(args).await,
        Command::Hash(args) => hash::exec(args).await,
        Command::Contracts(args) => contracts::exec(args),
        Command::WaitBlocks(args) => wait_blocks::exec(args).await,
    }
}
