// Copyright 2025, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/stylus-sdk-rs/blob/main/licenses/COPYRIGHT.md

use crate::core::sync::{SyncReport, Syncer};

/// Runs one synchronization pass and prints the per-contract report.
pub async fn sync(syncer: &mut Syncer) -> eyre::Result<SyncReport> {
    let config = syncer.config();
    greyln!(
        "syncing {} from {}",
        config.network.to_string().lavender(),
        config.contracts_dir.display()
    );
    let report = syncer.apply_changes().await?;
    println!("{report}");
    if report.is_noop() {
        mintln!("everything is up to date");
    }
    Ok(report)
}
