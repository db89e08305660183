// Copyright 2025, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/stylus-sdk-rs/blob/main/licenses/COPYRIGHT.md

//! Allowed script hashes.
//!
//! The factory stores the approved hash of each shared library script under a fixed key. Pools
//! only accept library versions whose hash matches, so the hashes are refreshed before any
//! contract is touched.

use std::collections::HashMap;

use super::{report::AllowHashOutcome, AllowHashState, SyncError, Syncer};
use crate::core::{
    crypto::Address,
    diff::{allow_hash, print_diff},
    events::SyncEvent,
    fee::DATA_FEE,
    registry::ContractRecord,
    submit::SubmitOptions,
    transaction::{DataEntry, Transaction},
};

pub const LP_FILE: &str = "lp.ride";
pub const LP_STABLE_FILE: &str = "lp_stable.ride";
pub const LP_STABLE_ADDON_FILE: &str = "lp_stable_addon.ride";

pub const LP_HASH_KEY: &str = "%s__allowedLpScriptHash";
pub const LP_STABLE_HASH_KEY: &str = "%s__allowedLpStableScriptHash";
pub const LP_STABLE_ADDON_HASH_KEY: &str = "%s__allowedLpStableAddonScriptHash";

/// A shared library whose approved hash lives on the factory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AllowHashLibrary {
    pub file: String,
    /// Factory storage key holding the approved hash.
    pub key: String,
    /// Account running the currently approved production script, diffed against on review.
    pub compare_address: Address,
}

impl AllowHashLibrary {
    pub fn new(file: impl Into<String>, key: impl Into<String>, compare_address: Address) -> Self {
        Self {
            file: file.into(),
            key: key.into(),
            compare_address,
        }
    }

    /// The pool libraries: `lp.ride`, `lp_stable.ride` and `lp_stable_addon.ride`.
    pub fn defaults(lp: Address, lp_stable: Address, lp_stable_addon: Address) -> Vec<Self> {
        vec![
            Self::new(LP_FILE, LP_HASH_KEY, lp),
            Self::new(LP_STABLE_FILE, LP_STABLE_HASH_KEY, lp_stable),
            Self::new(LP_STABLE_ADDON_FILE, LP_STABLE_ADDON_HASH_KEY, lp_stable_addon),
        ]
    }
}

/// Whether each library hash was unset before the pass, keyed by factory stage and file.
/// Production entries carry no stage.
pub(super) type HashWasEmpty = HashMap<(Option<u32>, String), bool>;

impl Syncer {
    pub(super) async fn refresh_allow_hashes(
        &mut self,
        factories: &[ContractRecord],
        outcomes: &mut Vec<AllowHashOutcome>,
    ) -> Result<HashWasEmpty, SyncError> {
        let mut was_empty = HashWasEmpty::new();
        let libraries = self.config.allow_hash_libraries.clone();
        let staging = self.config.network.is_staging();
        for factory in factories {
            let stage = if staging { factory.stage } else { None };
            for library in &libraries {
                let outcome = self.refresh_allow_hash(factory, library).await?;
                was_empty.insert((stage, library.file.clone()), outcome.was_empty);
                outcomes.push(outcome);
            }
        }
        Ok(was_empty)
    }

    /// Compiles `library`, compares its hash with the factory's value and updates or prepares an
    /// update of that value.
    async fn refresh_allow_hash(
        &mut self,
        factory: &ContractRecord,
        library: &AllowHashLibrary,
    ) -> Result<AllowHashOutcome, SyncError> {
        let compact = self.registry.is_compact(&library.file)?;
        let path = self.config.contracts_dir.join(&library.file);
        let compiled = self.compiler.compile_file(&path, compact).await?;
        let hash = allow_hash(&compiled.bytes);

        let factory_key = factory.public_key()?;
        let factory_address = Address::from_public_key(self.chain_id(), &factory_key);
        let actual = self
            .node
            .string_value(&factory_address, &library.key)
            .await?
            .unwrap_or_default();

        let mut outcome = AllowHashOutcome {
            file: library.file.clone(),
            key: library.key.clone(),
            stage: factory.stage,
            hash: hash.clone(),
            was_empty: actual.is_empty(),
            state: AllowHashState::Unchanged,
        };
        if actual == hash {
            self.events.record(&SyncEvent::AllowHashUnchanged {
                file: library.file.clone(),
                key: library.key.clone(),
                hash,
            });
            return Ok(outcome);
        }

        let entry = DataEntry {
            key: library.key.clone(),
            value: hash.clone(),
        };
        let tx = Transaction::data(self.chain_id(), factory_key, vec![entry], DATA_FEE);

        if self.config.network.is_staging() {
            let signer = factory
                .signer_secret()?
                .ok_or_else(|| SyncError::MissingFactoryKey { stage: factory.stage })?;
            let options = SubmitOptions {
                asynchronous: false,
                ensure_fee: true,
            };
            let id = self.submitter.submit(tx, &[&signer], options).await?;
            self.events.record(&SyncEvent::AllowHashUpdated {
                file: library.file.clone(),
                key: library.key.clone(),
                hash,
                tx: id,
            });
            outcome.state = AllowHashState::Updated { tx: id };
        } else {
            let tx_json = serde_json::to_string_pretty(&tx)?;
            let deployed = self
                .node
                .script(&library.compare_address)
                .await?
                .unwrap_or_default();
            info!(@grey,
                "print diff {}",
                fields!(address = library.compare_address, file = library.file, left = "blockchain", right = "local")
            );
            print_diff(
                &self.compiler,
                &self.config.scratch_dir,
                &library.file,
                &deployed,
                &compiled.base64,
            )
            .await?;
            self.events.record(&SyncEvent::AllowHashPending {
                file: library.file.clone(),
                key: library.key.clone(),
                hash,
                tx_json,
            });
            outcome.state = AllowHashState::Pending;
        }
        Ok(outcome)
    }
}
