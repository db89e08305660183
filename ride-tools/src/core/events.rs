// Copyright 2025, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/stylus-sdk-rs/blob/main/licenses/COPYRIGHT.md

//! Structured progress events.
//!
//! Components report what they do through an [`EventSink`] handed to them at construction.
//! [`LogSink`] renders events as log lines with `key=value` fields.

use std::path::PathBuf;

use crate::{
    core::{crypto::Address, network::Network, sync::SkipReason, transaction::TxId},
    utils::format_amount,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SyncEvent {
    PassStarted {
        network: Network,
        branch: String,
        records: usize,
    },
    /// No stage of the staging network is mapped to the current branch.
    BranchMismatch { branch: String },
    ContractUnchanged {
        file: String,
        tag: String,
        address: Address,
    },
    ContractSkipped {
        file: String,
        tag: String,
        reason: SkipReason,
    },
    ContractSubmitted {
        file: String,
        tag: String,
        address: Address,
        tx: TxId,
    },
    ManualSignatureRequired {
        file: String,
        tag: String,
        address: Address,
        artifact: PathBuf,
        tx_json: String,
    },
    ContractFailed {
        file: String,
        tag: String,
        address: Option<Address>,
        error: String,
    },
    AllowHashUnchanged {
        file: String,
        key: String,
        hash: String,
    },
    AllowHashUpdated {
        file: String,
        key: String,
        hash: String,
        tx: TxId,
    },
    AllowHashPending {
        file: String,
        key: String,
        hash: String,
        tx_json: String,
    },
    Funded {
        address: Address,
        amount: u64,
        balance_before: u64,
        balance_after: u64,
    },
    WaitingForConfirmations { pending: usize },
    WaitingForHeight { actual: u64, desired: u64 },
    HeightReached { actual: u64, desired: u64 },
    PassCompleted {
        submitted: usize,
        unchanged: usize,
        skipped: usize,
        manual: usize,
    },
}

pub trait EventSink: Send + Sync {
    fn record(&self, event: &SyncEvent);
}

/// Writes every event to the `log` facade.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogSink;

impl EventSink for LogSink {
    fn record(&self, event: &SyncEvent) {
        use SyncEvent::*;
        match event {
            PassStarted {
                network,
                branch,
                records,
            } => info!(@grey, "sync started {}", fields!(network = network, branch = branch, records = records)),
            BranchMismatch { branch } => {
                info!(@yellow, "no stage is mapped to this branch, nothing to do {}", fields!(branch = branch))
            }
            ContractUnchanged { file, tag, address } => {
                info!(@grey, "nothing changed {}", fields!(file = file, tag = tag, address = address))
            }
            ContractSkipped { file, tag, reason } => {
                debug!(@grey, "skipped {}", fields!(file = file, tag = tag, reason = reason))
            }
            ContractSubmitted {
                file,
                tag,
                address,
                tx,
            } => info!(@mint,
                "set-script sent {}",
                fields!(file = file, tag = tag, address = address, tx = tx, action = "deployed")
            ),
            ManualSignatureRequired {
                file,
                tag,
                address,
                artifact,
                tx_json,
            } => {
                info!(@yellow,
                    "contract changed, sign tx manually {}",
                    fields!(file = file, tag = tag, address = address, artifact = artifact.display(), action = "sign")
                );
                greyln!("{tx_json}");
            }
            ContractFailed {
                file,
                tag,
                address,
                error,
            } => {
                let address = address.map(|a| a.to_string()).unwrap_or_default();
                warn!(@red, "sync failed {}", fields!(file = file, tag = tag, address = address, error = error))
            }
            AllowHashUnchanged { file, key, hash } => {
                info!(@grey, "allowed hash is up to date {}", fields!(file = file, key = key, hash = hash))
            }
            AllowHashUpdated {
                file,
                key,
                hash,
                tx,
            } => info!(@mint, "allowed hash updated {}", fields!(file = file, key = key, hash = hash, tx = tx)),
            AllowHashPending {
                file,
                key,
                hash,
                tx_json,
            } => {
                info!(@yellow,
                    "allowed hash changed, sign and broadcast data tx to continue {}",
                    fields!(file = file, key = key, hash = hash, action = "sign")
                );
                greyln!("{tx_json}");
            }
            Funded {
                address,
                amount,
                balance_before,
                balance_after,
            } => info!(@grey,
                "sent {} {}",
                format_amount(*amount),
                fields!(address = address, balance_before = balance_before, balance_after = balance_after)
            ),
            WaitingForConfirmations { pending } => {
                info!(@grey, "waiting for transactions to be mined {}", fields!(pending = pending))
            }
            WaitingForHeight { actual, desired } => {
                info!(@grey, "waiting for height {}", fields!(actual = actual, desired = desired))
            }
            HeightReached { actual, desired } => {
                info!(@grey, "height reached {}", fields!(actual = actual, desired = desired))
            }
            PassCompleted {
                submitted,
                unchanged,
                skipped,
                manual,
            } => info!(@mint,
                "sync finished {}",
                fields!(submitted = submitted, unchanged = unchanged, skipped = skipped, manual = manual)
            ),
        }
    }
}

/// Keeps events in memory so tests can assert on them.
#[cfg(test)]
#[derive(Default)]
pub struct RecordingSink {
    events: std::sync::Mutex<Vec<SyncEvent>>,
}

#[cfg(test)]
impl RecordingSink {
    pub fn events(&self) -> Vec<SyncEvent> {
        self.events.lock().unwrap().clone()
    }
}

#[cfg(test)]
impl EventSink for RecordingSink {
    fn record(&self, event: &SyncEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

#[cfg(test)]
mod tests {
    #[test]
    fn fields_render_in_order() {
        let rendered = fields!(file = "lp.ride", tag = "lp", stage = 3);
        assert_eq!(rendered, "file=lp.ride tag=lp stage=3");
    }
}
