// Copyright 2025, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/stylus-sdk-rs/blob/main/licenses/COPYRIGHT.md

pub use contracts::list_contracts;
pub use diff::diff;
pub use hash::hash;
pub use sync::sync;
pub use wait_blocks::wait_blocks;

mod contracts;
mod diff;
mod hash;
mod sync;
mod wait_blocks;
