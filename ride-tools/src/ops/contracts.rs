// Copyright 2025, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/stylus-sdk-rs/blob/main/licenses/COPYRIGHT.md

use crate::{
    core::{network::Network, registry::Registry},
    utils::color::Color,
};

/// Prints every registry record with its derived address and, on the staging network, the
/// branch that owns its stage.
pub fn list_contracts(registry: &Registry, network: Network, branch: &str) -> eyre::Result<()> {
    let records = registry.get_all()?;
    if records.is_empty() {
        greyln!("registry is empty");
        return Ok(());
    }

    for record in &records {
        let address = record.address(network.chain_id())?;
        let stage = record
            .stage
            .map(|stage| format!("stage {stage}"))
            .unwrap_or_else(|| "no stage".into());
        let owner = if network.is_staging() {
            match registry.branch_for(network, record.stage)? {
                Some(owner) if owner == branch => owner.mint(),
                Some(owner) => owner.yellow(),
                None => "unassigned".grey(),
            }
        } else {
            "always".grey()
        };
        let keys = if record.base_secret_key.is_empty() {
            "manual signature"
        } else {
            "keys present"
        };
        println!(
            "{} {} {} {} {owner} {}",
            record.file.lavender(),
            record.tag,
            stage.grey(),
            address,
            keys.grey()
        );
    }
    greyln!("{} records", records.len());
    Ok(())
}
