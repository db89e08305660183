// Copyright 2025, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/stylus-sdk-rs/blob/main/licenses/COPYRIGHT.md

/// Contract sources, relative to the working directory of CI jobs.
pub const DEFAULT_CONTRACTS_DIR: &str = "../ride";
/// Unsigned production transactions picked up by the signing workflow.
pub const DEFAULT_ARTIFACTS_DIR: &str = "../.github/artifacts/txs";

/// Eight hours, in seconds.
pub const DEFAULT_DEADLINE_SECS: u64 = 8 * 60 * 60;

pub const DEFAULT_PRIMARY_HOSTS: &str = "wx.network,waves.exchange";
