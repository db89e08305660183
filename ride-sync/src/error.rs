// Copyright 2025, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/stylus-sdk-rs/blob/main/licenses/COPYRIGHT.md

use std::fmt;
use std::process::ExitCode;

pub type RideSyncResult = Result<(), RideSyncError>;

#[derive(Debug)]
pub struct RideSyncError {
    error: eyre::Error,
    exit_code: ExitCode,
}

impl RideSyncError {
    pub fn exit_code(&self) -> ExitCode {
        self.exit_code
    }
}

impl fmt::Display for RideSyncError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        // Alternate form prints the whole cause chain.
        write!(f, "{:#}", self.error)
    }
}

impl From<std::io::Error> for RideSyncError {
    fn from(err: std::io::Error) -> Self {
        Self {
            error: err.into(),
            exit_code: ExitCode::FAILURE,
        }
    }
}

impl From<eyre::Error> for RideSyncError {
    fn from(error: eyre::Error) -> Self {
        Self {
            error,
            exit_code: ExitCode::FAILURE,
        }
    }
}

impl From<ride_tools::Error> for RideSyncError {
    fn from(err: ride_tools::Error) -> Self {
        Self {
            error: err.into(),
            exit_code: ExitCode::FAILURE,
        }
    }
}

impl From<ride_tools::core::registry::RegistryError> for RideSyncError {
    fn from(err: ride_tools::core::registry::RegistryError) -> Self {
        Self {
            error: err.into(),
            exit_code: ExitCode::FAILURE,
        }
    }
}

impl From<ride_tools::core::node::NodeError> for RideSyncError {
    fn from(err: ride_tools::core::node::NodeError) -> Self {
        Self {
            error: err.into(),
            exit_code: ExitCode::FAILURE,
        }
    }
}

impl From<ride_tools::core::crypto::CryptoError> for RideSyncError {
    fn from(err: ride_tools::core::crypto::CryptoError) -> Self {
        Self {
            error: err.into(),
            exit_code: ExitCode::FAILURE,
        }
    }
}
