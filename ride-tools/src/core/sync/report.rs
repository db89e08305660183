// Copyright 2025, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/stylus-sdk-rs/blob/main/licenses/COPYRIGHT.md

use std::{fmt, path::PathBuf};

use crate::{
    core::{crypto::Address, network::Network, transaction::TxId},
    utils::color::Color,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SkipReason {
    /// The record's stage is mapped to another branch.
    BranchMismatch,
    /// A staging record without the secret keys needed to update it.
    MissingKeys,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BranchMismatch => f.write_str("branch mismatch"),
            Self::MissingKeys => f.write_str("no private keys in registry"),
        }
    }
}

/// Where a contract ended up after a pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ContractState {
    Unchanged,
    Skipped { reason: SkipReason },
    /// Broadcast, confirmation still tracked.
    Submitted { tx: TxId },
    Confirmed { tx: TxId },
    /// Unsigned transaction written for an operator to co-sign.
    NeedsManualSignature { artifact: PathBuf },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContractOutcome {
    pub file: String,
    pub tag: String,
    pub stage: Option<u32>,
    pub address: Option<Address>,
    pub state: ContractState,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AllowHashState {
    Unchanged,
    Updated { tx: TxId },
    /// Production change printed for manual co-signature.
    Pending,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AllowHashOutcome {
    pub file: String,
    pub key: String,
    pub stage: Option<u32>,
    pub hash: String,
    /// Whether the key was unset before this pass.
    pub was_empty: bool,
    pub state: AllowHashState,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SyncReport {
    pub network: Network,
    pub branch: String,
    pub allow_hashes: Vec<AllowHashOutcome>,
    pub contracts: Vec<ContractOutcome>,
}

impl SyncReport {
    pub fn new(network: Network, branch: impl Into<String>) -> Self {
        Self {
            network,
            branch: branch.into(),
            allow_hashes: Vec::new(),
            contracts: Vec::new(),
        }
    }

    /// Marks submitted contracts whose transaction is in `confirmed` as confirmed.
    pub fn confirm(&mut self, confirmed: &[TxId]) {
        for outcome in &mut self.contracts {
            if let ContractState::Submitted { tx } = outcome.state {
                if confirmed.contains(&tx) {
                    outcome.state = ContractState::Confirmed { tx };
                }
            }
        }
    }

    fn count(&self, matches: impl Fn(&ContractState) -> bool) -> usize {
        self.contracts.iter().filter(|o| matches(&o.state)).count()
    }

    pub fn submitted(&self) -> usize {
        self.count(|s| {
            matches!(
                s,
                ContractState::Submitted { .. } | ContractState::Confirmed { .. }
            )
        })
    }

    pub fn unchanged(&self) -> usize {
        self.count(|s| matches!(s, ContractState::Unchanged))
    }

    pub fn skipped(&self) -> usize {
        self.count(|s| matches!(s, ContractState::Skipped { .. }))
    }

    pub fn manual(&self) -> usize {
        self.count(|s| matches!(s, ContractState::NeedsManualSignature { .. }))
    }

    /// True when the pass changed nothing and left nothing to sign.
    pub fn is_noop(&self) -> bool {
        self.submitted() == 0
            && self.manual() == 0
            && self
                .allow_hashes
                .iter()
                .all(|a| a.state == AllowHashState::Unchanged)
    }
}

impl fmt::Display for SyncReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} {}",
            self.network.to_string().lavender(),
            format!("(branch {})", self.branch).grey()
        )?;
        for hash in &self.allow_hashes {
            let state = match &hash.state {
                AllowHashState::Unchanged => "unchanged".grey(),
                AllowHashState::Updated { tx } => format!("updated by {tx}").mint(),
                AllowHashState::Pending => "needs signature".yellow(),
            };
            writeln!(f, "  {} {} {state}", hash.file, hash.key.grey())?;
        }
        for contract in &self.contracts {
            let state = match &contract.state {
                ContractState::Unchanged => "unchanged".grey(),
                ContractState::Skipped { reason } => format!("skipped: {reason}").grey(),
                ContractState::Submitted { tx } => format!("submitted {tx}").yellow(),
                ContractState::Confirmed { tx } => format!("deployed {tx}").mint(),
                ContractState::NeedsManualSignature { artifact } => {
                    format!("sign {}", artifact.display()).yellow()
                }
            };
            let stage = contract
                .stage
                .map(|s| format!(" stage {s}"))
                .unwrap_or_default();
            writeln!(f, "  {} {}{stage} {state}", contract.file, contract.tag.grey())?;
        }
        write!(
            f,
            "{} deployed, {} unchanged, {} skipped, {} to sign",
            self.submitted(),
            self.unchanged(),
            self.skipped(),
            self.manual()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{crypto::KeyPair, transaction::Transaction};

    fn outcome(file: &str, state: ContractState) -> ContractOutcome {
        ContractOutcome {
            file: file.into(),
            tag: file.into(),
            stage: Some(1),
            address: None,
            state,
        }
    }

    #[test]
    fn confirm_promotes_submitted_only() {
        let keys = KeyPair::from_seed("report", 0);
        let tx = Transaction::set_script(b'T', keys.public, None, 1).id().unwrap();
        let other = Transaction::set_script(b'T', keys.public, None, 2).id().unwrap();

        let mut report = SyncReport::new(Network::Testnet, "dev");
        report.contracts = vec![
            outcome("a.ride", ContractState::Submitted { tx }),
            outcome("b.ride", ContractState::Submitted { tx: other }),
            outcome("c.ride", ContractState::Unchanged),
        ];
        report.confirm(&[tx]);

        assert_eq!(report.contracts[0].state, ContractState::Confirmed { tx });
        assert_eq!(
            report.contracts[1].state,
            ContractState::Submitted { tx: other }
        );
        assert_eq!(report.submitted(), 2);
        assert_eq!(report.unchanged(), 1);
        assert!(!report.is_noop());
        assert!(report.to_string().ends_with("2 deployed, 1 unchanged, 0 skipped, 0 to sign"));
    }
}
