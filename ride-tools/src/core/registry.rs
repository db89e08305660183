// Copyright 2025, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/stylus-sdk-rs/blob/main/licenses/COPYRIGHT.md

//! Contract registry.
//!
//! The registry records, for every deployed contract, its source file, the stage it belongs to,
//! its account key and, on the staging network only, the secret keys needed to update it.
//! Branch records map source-control branches to staging stages.
//!
//! Records are kept in a [`RegistryDocument`] behind a [`RegistryStore`]. [`FileStore`] persists
//! the document as TOML:
//!
//! ```toml
//! [[contracts]]
//! file = "factory_v2.ride"
//! stage = 1
//! tag = "factory_v2"
//! compact = false
//! base_public_key = "..."
//! base_secret_key = "..."
//! signer_secret_key = "..."
//!
//! [[branches]]
//! branch = "dev"
//! network = "testnet"
//! stage = 1
//! ```

use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
    sync::Mutex,
};

use serde::{Deserialize, Serialize};

use crate::core::{
    crypto::{Address, CryptoError, PublicKey, SecretKey},
    network::Network,
};

/// Source file of the factory contract.
pub const FACTORY_FILE: &str = "factory_v2.ride";
/// Tag of the factory contract.
pub const FACTORY_TAG: &str = "factory_v2";

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("failed to access registry {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("toml deserialize error: {0}")]
    TomlDeserialize(#[from] toml::de::Error),
    #[error("toml serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("invalid record (file: {file:?}, tag: {tag:?}): {reason}")]
    Invalid {
        file: String,
        tag: String,
        reason: &'static str,
    },
    #[error("invalid key in record (file: {file}, tag: {tag}): {source}")]
    Key {
        file: String,
        tag: String,
        #[source]
        source: CryptoError,
    },
    #[error("duplicate record (file: {file}, tag: {tag}, stage: {stage:?})")]
    Duplicate {
        file: String,
        tag: String,
        stage: Option<u32>,
    },
    #[error("more than one branch is mapped to {network} stage {stage:?}")]
    BranchConflict {
        network: Network,
        stage: Option<u32>,
    },
    #[error("different 'compact' values for file: {0}")]
    CompactConflict(String),
    #[error("no contract found for file: {0}")]
    UnknownFile(String),
    #[error("factory not found (stage: {0:?})")]
    FactoryNotFound(Option<u32>),
    #[error("stage {0} does not exist")]
    StageNotFound(u32),
}

fn is_false(value: &bool) -> bool {
    !value
}

/// A deployed contract.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractRecord {
    pub file: String,
    /// Staging cohort. Production records carry none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<u32>,
    pub tag: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub compact: bool,
    #[serde(alias = "base_pub")]
    pub base_public_key: String,
    #[serde(default, alias = "base_prv", skip_serializing_if = "String::is_empty")]
    pub base_secret_key: String,
    #[serde(default, alias = "signer_prv", skip_serializing_if = "String::is_empty")]
    pub signer_secret_key: String,
}

impl ContractRecord {
    fn invalid(&self, reason: &'static str) -> RegistryError {
        RegistryError::Invalid {
            file: self.file.clone(),
            tag: self.tag.clone(),
            reason,
        }
    }

    fn key_error(&self, source: CryptoError) -> RegistryError {
        RegistryError::Key {
            file: self.file.clone(),
            tag: self.tag.clone(),
            source,
        }
    }

    pub fn validate(&self) -> Result<(), RegistryError> {
        if self.file.is_empty() {
            return Err(self.invalid("file is required"));
        }
        if self.tag.is_empty() {
            return Err(self.invalid("tag is required"));
        }
        if self.base_public_key.is_empty() {
            return Err(self.invalid("base public key is required"));
        }
        if !self.base_secret_key.is_empty() && self.signer_secret_key.is_empty() {
            return Err(self.invalid("base secret key requires a signer secret key"));
        }
        self.public_key()?;
        Ok(())
    }

    pub fn public_key(&self) -> Result<PublicKey, RegistryError> {
        self.base_public_key
            .parse()
            .map_err(|err| self.key_error(err))
    }

    pub fn address(&self, chain_id: u8) -> Result<Address, RegistryError> {
        Ok(Address::from_public_key(chain_id, &self.public_key()?))
    }

    /// Base account key, present on staging records only.
    pub fn base_secret(&self) -> Result<Option<SecretKey>, RegistryError> {
        self.secret(&self.base_secret_key)
    }

    /// Authorized signer key, present on staging records only.
    pub fn signer_secret(&self) -> Result<Option<SecretKey>, RegistryError> {
        self.secret(&self.signer_secret_key)
    }

    fn secret(&self, encoded: &str) -> Result<Option<SecretKey>, RegistryError> {
        if encoded.is_empty() {
            return Ok(None);
        }
        encoded
            .parse()
            .map(Some)
            .map_err(|err| self.key_error(err))
    }

    pub fn is_factory(&self) -> bool {
        self.file == FACTORY_FILE && self.tag == FACTORY_TAG
    }

    fn identity(&self) -> (&str, &str, Option<u32>) {
        (&self.file, &self.tag, self.stage)
    }
}

/// Which branch may push changes to a stage.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchRecord {
    pub branch: String,
    pub network: Network,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<u32>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryDocument {
    #[serde(default)]
    pub contracts: Vec<ContractRecord>,
    #[serde(default)]
    pub branches: Vec<BranchRecord>,
}

impl RegistryDocument {
    pub fn validate(&self) -> Result<(), RegistryError> {
        let mut seen = HashSet::new();
        for record in &self.contracts {
            record.validate()?;
            if !seen.insert(record.identity()) {
                return Err(RegistryError::Duplicate {
                    file: record.file.clone(),
                    tag: record.tag.clone(),
                    stage: record.stage,
                });
            }
        }
        let mut mapped = HashSet::new();
        for branch in &self.branches {
            if !mapped.insert((branch.network, branch.stage)) {
                return Err(RegistryError::BranchConflict {
                    network: branch.network,
                    stage: branch.stage,
                });
            }
        }
        Ok(())
    }
}

pub trait RegistryStore: Send + Sync {
    fn load(&self) -> Result<RegistryDocument, RegistryError>;
    fn save(&self, document: &RegistryDocument) -> Result<(), RegistryError>;
}

/// Registry kept in a TOML file.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> RegistryError {
        RegistryError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl RegistryStore for FileStore {
    fn load(&self) -> Result<RegistryDocument, RegistryError> {
        let text = fs::read_to_string(&self.path).map_err(|err| self.io_error(err))?;
        Ok(toml::from_str(&text)?)
    }

    fn save(&self, document: &RegistryDocument) -> Result<(), RegistryError> {
        let text = toml::to_string_pretty(document)?;
        fs::write(&self.path, text).map_err(|err| self.io_error(err))
    }
}

/// Registry held in memory, used by tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    document: Mutex<RegistryDocument>,
}

impl MemoryStore {
    pub fn new(document: RegistryDocument) -> Self {
        Self {
            document: Mutex::new(document),
        }
    }
}

impl RegistryStore for MemoryStore {
    fn load(&self) -> Result<RegistryDocument, RegistryError> {
        Ok(self
            .document
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone())
    }

    fn save(&self, document: &RegistryDocument) -> Result<(), RegistryError> {
        *self
            .document
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = document.clone();
        Ok(())
    }
}

pub struct Registry {
    store: Box<dyn RegistryStore>,
}

impl Registry {
    pub fn new(store: impl RegistryStore + 'static) -> Self {
        Self {
            store: Box::new(store),
        }
    }

    /// Opens the TOML registry at `path`.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self::new(FileStore::new(path))
    }

    fn load(&self) -> Result<RegistryDocument, RegistryError> {
        let document = self.store.load()?;
        document.validate()?;
        Ok(document)
    }

    /// Every contract record, ordered by stage then file.
    pub fn get_all(&self) -> Result<Vec<ContractRecord>, RegistryError> {
        let mut contracts = self.load()?.contracts;
        contracts.sort_by(|a, b| (a.stage, &a.file).cmp(&(b.stage, &b.file)));
        Ok(contracts)
    }

    /// Whether `file` is compiled in compact mode. All records of a file must agree.
    pub fn is_compact(&self, file: &str) -> Result<bool, RegistryError> {
        let document = self.load()?;
        let mut flags = document
            .contracts
            .iter()
            .filter(|record| record.file == file)
            .map(|record| record.compact);
        let compact = flags
            .next()
            .ok_or_else(|| RegistryError::UnknownFile(file.to_string()))?;
        if flags.any(|flag| flag != compact) {
            return Err(RegistryError::CompactConflict(file.to_string()));
        }
        Ok(compact)
    }

    /// The factory record, optionally pinned to a stage.
    pub fn get_factory(&self, stage: Option<u32>) -> Result<ContractRecord, RegistryError> {
        self.get_all()?
            .into_iter()
            .find(|record| record.is_factory() && (stage.is_none() || record.stage == stage))
            .ok_or(RegistryError::FactoryNotFound(stage))
    }

    pub fn branches(&self) -> Result<Vec<BranchRecord>, RegistryError> {
        Ok(self.load()?.branches)
    }

    /// Branch allowed to push to `stage` of `network`.
    pub fn branch_for(
        &self,
        network: Network,
        stage: Option<u32>,
    ) -> Result<Option<String>, RegistryError> {
        Ok(self
            .branches()?
            .into_iter()
            .find(|record| record.network == network && record.stage == stage)
            .map(|record| record.branch))
    }

    /// Adds a contract record. Records are never modified afterwards.
    pub fn create(&self, record: ContractRecord) -> Result<(), RegistryError> {
        record.validate()?;
        let mut document = self.load()?;
        if document
            .contracts
            .iter()
            .any(|existing| existing.identity() == record.identity())
        {
            return Err(RegistryError::Duplicate {
                file: record.file,
                tag: record.tag,
                stage: record.stage,
            });
        }
        document.contracts.push(record);
        self.store.save(&document)
    }

    /// Maps `branch` to its stage, replacing the previous mapping of that stage.
    pub fn assign_branch(&self, branch: BranchRecord) -> Result<(), RegistryError> {
        let mut document = self.load()?;
        document
            .branches
            .retain(|existing| (existing.network, existing.stage) != (branch.network, branch.stage));
        document.branches.push(branch);
        self.store.save(&document)
    }

    /// Deletes every contract and branch record of a staging stage, returning the number of
    /// contracts removed.
    pub fn drop_stage(&self, stage: u32) -> Result<usize, RegistryError> {
        let mut document = self.load()?;
        let contracts = document.contracts.len();
        let branches = document.branches.len();
        document
            .contracts
            .retain(|record| record.stage != Some(stage));
        document
            .branches
            .retain(|record| !(record.network.is_staging() && record.stage == Some(stage)));
        let removed = contracts - document.contracts.len();
        if removed == 0 && branches == document.branches.len() {
            return Err(RegistryError::StageNotFound(stage));
        }
        self.store.save(&document)?;
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::crypto::KeyPair;

    fn record(file: &str, tag: &str, stage: Option<u32>) -> ContractRecord {
        let keys = KeyPair::from_seed(&format!("{file}/{tag}/{stage:?}"), 0);
        ContractRecord {
            file: file.to_string(),
            stage,
            tag: tag.to_string(),
            compact: false,
            base_public_key: keys.public.to_string(),
            ..Default::default()
        }
    }

    fn registry(contracts: Vec<ContractRecord>) -> Registry {
        Registry::new(MemoryStore::new(RegistryDocument {
            contracts,
            branches: vec![],
        }))
    }

    #[test]
    fn sorted_by_stage_then_file() {
        let registry = registry(vec![
            record("lp.ride", "lp", Some(2)),
            record("factory_v2.ride", "factory_v2", Some(2)),
            record("lp.ride", "lp", Some(1)),
        ]);
        let order: Vec<_> = registry
            .get_all()
            .unwrap()
            .into_iter()
            .map(|r| (r.stage, r.file))
            .collect();
        assert_eq!(
            order,
            vec![
                (Some(1), "lp.ride".to_string()),
                (Some(2), "factory_v2.ride".to_string()),
                (Some(2), "lp.ride".to_string()),
            ]
        );
    }

    #[test]
    fn compact_flags_must_agree() {
        let mut compact = record("shared.src", "shared_a", Some(1));
        compact.compact = true;
        let plain = record("shared.src", "shared_b", Some(2));
        let registry = registry(vec![compact, plain]);

        let err = registry.is_compact("shared.src").unwrap_err();
        assert!(matches!(&err, RegistryError::CompactConflict(file) if file == "shared.src"));
        assert!(err.to_string().contains("shared.src"));
        assert!(matches!(
            registry.is_compact("missing.ride"),
            Err(RegistryError::UnknownFile(_))
        ));
    }

    #[test]
    fn factory_lookup() {
        let registry = registry(vec![
            record("factory_v2.ride", "factory_v2", Some(1)),
            record("factory_v2.ride", "factory_v2", Some(3)),
            record("factory_v2.ride", "factory_v2_old", Some(2)),
        ]);
        assert_eq!(registry.get_factory(Some(3)).unwrap().stage, Some(3));
        assert_eq!(registry.get_factory(None).unwrap().stage, Some(1));
        assert!(matches!(
            registry.get_factory(Some(2)),
            Err(RegistryError::FactoryNotFound(Some(2)))
        ));
    }

    #[test]
    fn validation_rejects_bad_records() {
        let mut missing_signer = record("lp.ride", "lp", Some(1));
        missing_signer.base_secret_key = "4fz".into();
        assert!(matches!(
            registry(vec![missing_signer]).get_all(),
            Err(RegistryError::Invalid { .. })
        ));

        let duplicate = registry(vec![
            record("lp.ride", "lp", Some(1)),
            record("lp.ride", "lp", Some(1)),
        ]);
        assert!(matches!(
            duplicate.get_all(),
            Err(RegistryError::Duplicate { .. })
        ));

        let mut bad_key = record("lp.ride", "lp", None);
        bad_key.base_public_key = "0OIl".into();
        assert!(matches!(
            registry(vec![bad_key]).get_all(),
            Err(RegistryError::Key { .. })
        ));
    }

    #[test]
    fn create_assign_and_drop() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("registry.toml");
        FileStore::new(&path)
            .save(&RegistryDocument::default())
            .unwrap();

        let registry = Registry::open(&path);
        registry.create(record("lp.ride", "lp", Some(4))).unwrap();
        registry
            .create(record("factory_v2.ride", "factory_v2", Some(4)))
            .unwrap();
        assert!(matches!(
            registry.create(record("lp.ride", "lp", Some(4))),
            Err(RegistryError::Duplicate { .. })
        ));

        let dev = BranchRecord {
            branch: "dev".into(),
            network: Network::Testnet,
            stage: Some(4),
        };
        registry.assign_branch(dev.clone()).unwrap();
        registry
            .assign_branch(BranchRecord {
                branch: "feature-x".into(),
                ..dev
            })
            .unwrap();
        let reopened = Registry::open(&path);
        assert_eq!(
            reopened.branch_for(Network::Testnet, Some(4)).unwrap(),
            Some("feature-x".to_string())
        );
        assert_eq!(reopened.branches().unwrap().len(), 1);

        assert_eq!(reopened.drop_stage(4).unwrap(), 2);
        assert!(reopened.get_all().unwrap().is_empty());
        assert!(reopened.branches().unwrap().is_empty());
        assert!(matches!(
            reopened.drop_stage(4),
            Err(RegistryError::StageNotFound(4))
        ));
    }

    #[test]
    fn reads_legacy_field_names() {
        let keys = KeyPair::from_seed("legacy", 0);
        let text = format!(
            r#"
            [[contracts]]
            file = "lp.ride"
            tag = "lp"
            compact = true
            base_pub = "{}"
            "#,
            keys.public
        );
        let document: RegistryDocument = toml::from_str(&text).unwrap();
        document.validate().unwrap();
        assert!(document.contracts[0].compact);
        assert_eq!(document.contracts[0].stage, None);
    }
}
