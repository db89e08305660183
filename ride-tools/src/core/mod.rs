// Copyright 2025, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/stylus-sdk-rs/blob/main/licenses/COPYRIGHT.md

pub mod artifacts;
pub mod compile;
pub mod crypto;
pub mod diff;
pub mod events;
pub mod fee;
pub mod network;
pub mod node;
pub mod registry;
pub mod submit;
pub mod sync;
pub mod transaction;
