// Copyright 2025, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/stylus-sdk-rs/blob/main/licenses/COPYRIGHT.md

use std::time::Duration;

use crate::core::{events::EventSink, node::NodeApi, submit};

/// Blocks until the chain has grown by `blocks`, giving up after `deadline`.
pub async fn wait_blocks(
    node: &dyn NodeApi,
    blocks: u64,
    deadline: Duration,
    events: &dyn EventSink,
) -> eyre::Result<u64> {
    let wait = submit::wait_blocks(node, blocks, submit::HEIGHT_POLL_INTERVAL, events);
    let height = tokio::time::timeout(deadline, wait)
        .await
        .map_err(|_| eyre::eyre!("chain did not advance {blocks} blocks within {deadline:?}"))??;
    mintln!("reached height {height}");
    Ok(height)
}
