// Copyright 2025, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/stylus-sdk-rs/blob/main/licenses/COPYRIGHT.md

use std::sync::Arc;

use ride_tools::{
    core::{
        events::{EventSink, LogSink},
        fee::Funder,
        submit::Submitter,
        sync::{SyncConfig, Syncer},
    },
    ops,
};

use crate::{
    common_args::{
        CompareArgs, ConfirmationArgs, DeadlineArgs, FundingArgs, NodeArgs, PathArgs,
        RegistryArgs,
    },
    error::RideSyncResult,
};

#[derive(Debug, clap::Args)]
pub struct Args {
    /// Branch this job runs for. Staging stages owned by other branches are skipped.
    #[arg(long, env = "BRANCH")]
    branch: String,

    #[command(flatten)]
    node: NodeArgs,
    #[command(flatten)]
    registry: RegistryArgs,
    #[command(flatten)]
    funding: FundingArgs,
    #[command(flatten)]
    compare: CompareArgs,
    #[command(flatten)]
    confirmation: ConfirmationArgs,
    #[command(flatten)]
    paths: PathArgs,
    #[command(flatten)]
    deadline: DeadlineArgs,
}

pub async fn exec(args: Args) -> RideSyncResult {
    let network = args.node.network;
    let config = SyncConfig {
        network,
        branch: args.branch,
        contracts_dir: args.paths.contracts_dir,
        artifacts_dir: args.paths.artifacts_dir,
        scratch_dir: args.paths.scratch.dir(),
        allow_hash_libraries: args.compare.libraries(network)?,
        deadline: args.deadline.deadline(),
    };
    let registry = args.registry.open()?;
    let node = args.node.build_node()?;
    let events: Arc<dyn EventSink> = Arc::new(LogSink);

    let policy = args.confirmation.policy();
    let funder = Funder::new(
        Arc::clone(&node),
        args.funding.account()?,
        network.chain_id(),
        policy,
        Arc::clone(&events),
    );
    let submitter = Submitter::new(Arc::clone(&node), network.chain_id(), funder, policy);

    let mut syncer = Syncer::new(config, node, registry, submitter, events);
    ops::sync(&mut syncer).await?;
    Ok(())
}
