// Copyright 2025, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/stylus-sdk-rs/blob/main/licenses/COPYRIGHT.md

//! Terminal colors for log and report output.

use std::fmt::{Debug, Display};

pub const GREY: &str = "\x1b[0;0m\x1b[90m";
pub const LAVENDER: &str = "\x1b[38;5;183;1m";
pub const MINT: &str = "\x1b[38;5;48;1m";
pub const PINK: &str = "\x1b[38;5;161;1m";
pub const RED: &str = "\x1b[31;1m";
pub const YELLOW: &str = "\x1b[33;1m";
pub const RESET: &str = "\x1b[0;0m";

pub trait Color {
    fn grey(&self) -> String;
    fn lavender(&self) -> String;
    fn mint(&self) -> String;
    fn pink(&self) -> String;
    fn red(&self) -> String;
    fn yellow(&self) -> String;
}

impl<T: Display> Color for T {
    fn grey(&self) -> String {
        format!("{GREY}{self}{RESET}")
    }
    fn lavender(&self) -> String {
        format!("{LAVENDER}{self}{RESET}")
    }
    fn mint(&self) -> String {
        format!("{MINT}{self}{RESET}")
    }
    fn pink(&self) -> String {
        format!("{PINK}{self}{RESET}")
    }
    fn red(&self) -> String {
        format!("{RED}{self}{RESET}")
    }
    fn yellow(&self) -> String {
        format!("{YELLOW}{self}{RESET}")
    }
}

pub trait DebugColor {
    fn debug_lavender(&self) -> String;
    fn debug_mint(&self) -> String;
    fn debug_red(&self) -> String;
}

impl<T: Debug> DebugColor for T {
    fn debug_lavender(&self) -> String {
        format!("{LAVENDER}{self:?}{RESET}")
    }
    fn debug_mint(&self) -> String {
        format!("{MINT}{self:?}{RESET}")
    }
    fn debug_red(&self) -> String {
        format!("{RED}{self:?}{RESET}")
    }
}
