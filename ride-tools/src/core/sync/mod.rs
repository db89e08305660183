// Copyright 2025, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/stylus-sdk-rs/blob/main/licenses/COPYRIGHT.md

//! Synchronization engine.
//!
//! A pass compiles every contract source, compares it with the program deployed on-chain and
//! brings the chain up to date:
//!
//! - on the staging network, changed contracts are funded, signed with their base and signer
//!   keys and submitted, and their confirmations are joined at the end of the pass;
//! - on the production network, changed contracts are written out as unsigned transactions for
//!   manual co-signature, except for the first activation of a shared library.
//!
//! Staging records are only touched when the current branch owns their stage. Approved library
//! hashes on the factory are refreshed before any contract.

use std::{
    collections::BTreeSet,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use crate::core::{
    artifacts::ArtifactWriter,
    compile::{CompileError, Compiler},
    crypto::{Address, SecretKey},
    diff::{print_diff, same_script, DiffError},
    events::{EventSink, SyncEvent},
    network::Network,
    node::{NodeApi, NodeError},
    registry::{ContractRecord, Registry, RegistryError},
    submit::{SubmitError, SubmitOptions, Submitter},
    transaction::Transaction,
};
use crate::utils::color::DebugColor;

mod allow_hash;
mod report;

use allow_hash::HashWasEmpty;
pub use allow_hash::{
    AllowHashLibrary, LP_FILE, LP_HASH_KEY, LP_STABLE_ADDON_FILE, LP_STABLE_ADDON_HASH_KEY,
    LP_STABLE_FILE, LP_STABLE_HASH_KEY,
};
pub use report::*;

/// Outer bound on a whole pass, confirmations included.
pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(8 * 60 * 60);

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("{0}")]
    Registry(#[from] RegistryError),
    #[error("{0}")]
    Compile(#[from] CompileError),
    #[error("{0}")]
    Node(#[from] NodeError),
    #[error("{0}")]
    Submit(#[from] SubmitError),
    #[error("{0}")]
    Diff(#[from] DiffError),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("factory (stage: {stage:?}) has no signer key")]
    MissingFactoryKey { stage: Option<u32> },
    #[error("failed to sync {file} ({tag}): {source}")]
    Contract {
        file: String,
        tag: String,
        address: Option<Address>,
        #[source]
        source: Box<SyncError>,
    },
    #[error("sync did not finish within {0:?}")]
    DeadlineExceeded(Duration),
}

#[derive(Clone, Debug)]
pub struct SyncConfig {
    pub network: Network,
    /// Branch the process runs for. Gates staging stages.
    pub branch: String,
    /// Directory holding the contract sources.
    pub contracts_dir: PathBuf,
    /// Where unsigned production transactions are written.
    pub artifacts_dir: PathBuf,
    /// Where decompiled scripts are written while diffing.
    pub scratch_dir: PathBuf,
    pub allow_hash_libraries: Vec<AllowHashLibrary>,
    pub deadline: Duration,
}

pub struct Syncer {
    config: SyncConfig,
    node: Arc<dyn NodeApi>,
    registry: Registry,
    compiler: Compiler,
    submitter: Submitter,
    events: Arc<dyn EventSink>,
}

impl Syncer {
    pub fn new(
        config: SyncConfig,
        node: Arc<dyn NodeApi>,
        registry: Registry,
        submitter: Submitter,
        events: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            compiler: Compiler::new(Arc::clone(&node)),
            config,
            node,
            registry,
            submitter,
            events,
        }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    fn chain_id(&self) -> u8 {
        self.config.network.chain_id()
    }

    /// Runs one pass within the configured deadline.
    ///
    /// On expiry the pending confirmation waits are cancelled. Transactions already broadcast are
    /// not recalled, so the next pass picks up from whatever state the chain reached.
    pub async fn apply_changes(&mut self) -> Result<SyncReport, SyncError> {
        let deadline = self.config.deadline;
        let result = tokio::time::timeout(deadline, self.run()).await;
        match result {
            Ok(result) => result,
            Err(_) => {
                self.submitter.abort_pending();
                Err(SyncError::DeadlineExceeded(deadline))
            }
        }
    }

    async fn run(&mut self) -> Result<SyncReport, SyncError> {
        let network = self.config.network;
        let records = self.registry.get_all()?;
        let mut report = SyncReport::new(network, self.config.branch.clone());
        self.events.record(&SyncEvent::PassStarted {
            network,
            branch: self.config.branch.clone(),
            records: records.len(),
        });

        let eligible = self.eligible_stages(&records)?;
        if network.is_staging() && eligible.is_empty() {
            self.events.record(&SyncEvent::BranchMismatch {
                branch: self.config.branch.clone(),
            });
            for record in &records {
                report
                    .contracts
                    .push(self.skip(record, SkipReason::BranchMismatch));
            }
            self.complete(&report);
            return Ok(report);
        }

        // Production has a single factory whatever stage its records carry.
        let factories = if self.config.allow_hash_libraries.is_empty() {
            Vec::new()
        } else if network.is_staging() {
            eligible
                .iter()
                .map(|stage| self.registry.get_factory(*stage))
                .collect::<Result<Vec<_>, _>>()?
        } else {
            vec![self.registry.get_factory(None)?]
        };
        let was_empty = self
            .refresh_allow_hashes(&factories, &mut report.allow_hashes)
            .await?;

        let mut artifacts = ArtifactWriter::new(&self.config.artifacts_dir);
        for file in source_files(&self.config.contracts_dir)? {
            for record in records.iter().filter(|record| record.file == file) {
                if !eligible.contains(&record.stage) {
                    report
                        .contracts
                        .push(self.skip(record, SkipReason::BranchMismatch));
                    continue;
                }
                let outcome = match self.sync_record(record, &mut artifacts, &was_empty).await {
                    Ok(outcome) => outcome,
                    Err(err) => return Err(self.contract_failed(record, err)),
                };
                report.contracts.push(outcome);
            }
        }

        let pending = self.submitter.pending();
        if pending > 0 {
            self.events
                .record(&SyncEvent::WaitingForConfirmations { pending });
            let confirmed = self.submitter.await_all().await?;
            report.confirm(&confirmed);
        }
        self.complete(&report);
        Ok(report)
    }

    /// Stages this process may act on. Every stage is eligible on the production network.
    fn eligible_stages(
        &self,
        records: &[ContractRecord],
    ) -> Result<BTreeSet<Option<u32>>, SyncError> {
        let stages: BTreeSet<_> = records.iter().map(|record| record.stage).collect();
        let network = self.config.network;
        if !network.is_staging() {
            return Ok(stages);
        }
        let mut eligible = BTreeSet::new();
        for stage in stages {
            let branch = self.registry.branch_for(network, stage)?;
            if branch.as_deref() == Some(self.config.branch.as_str()) {
                eligible.insert(stage);
            } else {
                debug!(@grey,
                    "skipping stage {} owned by {}",
                    stage.debug_lavender(),
                    branch.as_deref().unwrap_or("no branch")
                );
            }
        }
        Ok(eligible)
    }

    async fn sync_record(
        &mut self,
        record: &ContractRecord,
        artifacts: &mut ArtifactWriter,
        was_empty: &HashWasEmpty,
    ) -> Result<ContractOutcome, SyncError> {
        let staging = self.config.network.is_staging();
        let keys = if staging {
            match (record.base_secret()?, record.signer_secret()?) {
                (Some(base), Some(signer)) => Some((base, signer)),
                _ => return Ok(self.skip(record, SkipReason::MissingKeys)),
            }
        } else {
            None
        };
        let sender = match &keys {
            Some((base, _)) => base.public_key(),
            None => record.public_key()?,
        };
        let address = Address::from_public_key(self.chain_id(), &sender);

        let compact = self.registry.is_compact(&record.file)?;
        let path = self.config.contracts_dir.join(&record.file);
        let compiled = self.compiler.compile_file(&path, compact).await?;
        let deployed = self.node.script(&address).await?.unwrap_or_default();

        let mut outcome = ContractOutcome {
            file: record.file.clone(),
            tag: record.tag.clone(),
            stage: record.stage,
            address: Some(address),
            state: ContractState::Unchanged,
        };
        if same_script(&deployed, &compiled.base64) {
            self.events.record(&SyncEvent::ContractUnchanged {
                file: record.file.clone(),
                tag: record.tag.clone(),
                address,
            });
            return Ok(outcome);
        }

        let tx = Transaction::set_script(
            self.chain_id(),
            sender,
            Some(compiled.bytes.clone()),
            compiled.fee,
        );
        let options = SubmitOptions {
            asynchronous: true,
            ensure_fee: true,
        };

        if let Some((base, signer)) = &keys {
            outcome.state = self.deploy(record, address, tx, &[base, signer], options).await?;
            return Ok(outcome);
        }

        // A library whose approved hash was never set has no pool depending on it yet.
        let first_activation = was_empty
            .get(&(None, record.file.clone()))
            .copied()
            .unwrap_or(false);
        if first_activation {
            outcome.state = self.deploy(record, address, tx, &[], options).await?;
            return Ok(outcome);
        }

        let tx_json = serde_json::to_string_pretty(&tx)?;
        info!(@grey,
            "print diff {}",
            fields!(address = address, file = record.file, left = "blockchain", right = "local")
        );
        print_diff(
            &self.compiler,
            &self.config.scratch_dir,
            &record.file,
            &deployed,
            &compiled.base64,
        )
        .await?;
        let artifact = artifacts
            .write(&record.tag, &tx_json)
            .map_err(|source| SyncError::Io {
                path: artifacts.dir().to_path_buf(),
                source,
            })?;
        self.events.record(&SyncEvent::ManualSignatureRequired {
            file: record.file.clone(),
            tag: record.tag.clone(),
            address,
            artifact: artifact.clone(),
            tx_json,
        });
        outcome.state = ContractState::NeedsManualSignature { artifact };
        Ok(outcome)
    }

    async fn deploy(
        &mut self,
        record: &ContractRecord,
        address: Address,
        tx: Transaction,
        keys: &[&SecretKey],
        options: SubmitOptions,
    ) -> Result<ContractState, SyncError> {
        let id = self.submitter.submit(tx, keys, options).await?;
        self.events.record(&SyncEvent::ContractSubmitted {
            file: record.file.clone(),
            tag: record.tag.clone(),
            address,
            tx: id,
        });
        Ok(ContractState::Submitted { tx: id })
    }

    fn skip(&self, record: &ContractRecord, reason: SkipReason) -> ContractOutcome {
        self.events.record(&SyncEvent::ContractSkipped {
            file: record.file.clone(),
            tag: record.tag.clone(),
            reason,
        });
        ContractOutcome {
            file: record.file.clone(),
            tag: record.tag.clone(),
            stage: record.stage,
            address: None,
            state: ContractState::Skipped { reason },
        }
    }

    fn contract_failed(&self, record: &ContractRecord, err: SyncError) -> SyncError {
        let address = record
            .public_key()
            .ok()
            .map(|key| Address::from_public_key(self.chain_id(), &key));
        self.events.record(&SyncEvent::ContractFailed {
            file: record.file.clone(),
            tag: record.tag.clone(),
            address,
            error: err.to_string(),
        });
        SyncError::Contract {
            file: record.file.clone(),
            tag: record.tag.clone(),
            address,
            source: Box::new(err),
        }
    }

    fn complete(&self, report: &SyncReport) {
        self.events.record(&SyncEvent::PassCompleted {
            submitted: report.submitted(),
            unchanged: report.unchanged(),
            skipped: report.skipped(),
            manual: report.manual(),
        });
    }
}

/// Regular files of `dir`, sorted by name.
fn source_files(dir: &Path) -> Result<Vec<String>, SyncError> {
    let io_error = |source| SyncError::Io {
        path: dir.to_path_buf(),
        source,
    };
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(io_error)? {
        let entry = entry.map_err(io_error)?;
        if !entry.file_type().map_err(io_error)?.is_file() {
            continue;
        }
        if let Some(name) = entry.file_name().to_str() {
            files.push(name.to_string());
        }
    }
    files.sort();
    Ok(files)
}
