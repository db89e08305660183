// Copyright 2025, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/stylus-sdk-rs/blob/main/licenses/COPYRIGHT.md

//! General purpose utilities.
//!
//! None of these are specific to Ride contracts, but [`ride-tools`](crate) uses them to present
//! fees, balances and files to the operator.

use std::{fs, path::Path};

use color::{Color, GREY, MINT, PINK, YELLOW};

use crate::core::fee::UNIT;

pub mod color;
pub mod sys;

/// Pretty-prints an amount of the native currency given in its smallest denomination.
pub fn format_amount(amount: u64) -> String {
    let text = format!("{}.{:08} WAVES", amount / UNIT, amount % UNIT);
    if amount <= UNIT / 100 {
        text.mint()
    } else if amount <= UNIT {
        text.yellow()
    } else {
        text.red()
    }
}

/// Pretty-prints a compiled program size against the soft and hard limits of the chain.
pub fn format_script_size(len: usize, mid: usize, max: usize) -> String {
    let color = if len <= mid {
        MINT
    } else if len <= max {
        YELLOW
    } else {
        PINK
    };

    format!("{color}{} KiB{GREY} ({len} bytes)", len / 1024)
}

/// Check if a directory exists, creating it (and its parents) if not.
pub fn create_dir_if_dne(path: impl AsRef<Path>) -> std::io::Result<()> {
    let path = path.as_ref();
    if !path.is_dir() {
        fs::create_dir_all(path)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amounts_keep_eight_decimals() {
        assert!(format_amount(150_000_000).contains("1.50000000 WAVES"));
        assert!(format_amount(1_300_000).contains("0.01300000 WAVES"));
    }
}
