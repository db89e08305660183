// Copyright 2025, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/stylus-sdk-rs/blob/main/licenses/COPYRIGHT.md

//! Proof-bearing transactions: binary body layouts, ids, signing and the broadcast JSON form.

use std::{
    fmt,
    time::{SystemTime, UNIX_EPOCH},
};

use base64::{engine::general_purpose::STANDARD, Engine};

use crate::core::crypto::{blake2b256, Address, PublicKey, SecretKey, Signature};

pub const SET_SCRIPT_TYPE: u8 = 13;
pub const DATA_TYPE: u8 = 12;
pub const TRANSFER_TYPE: u8 = 4;

pub const MAX_PROOFS: usize = 8;
pub const MAX_DATA_KEY_LENGTH: usize = 400;

const STRING_ENTRY_TYPE: u8 = 3;

#[derive(Debug, thiserror::Error)]
pub enum TransactionError {
    #[error("fee must be positive")]
    ZeroFee,
    #[error("timestamp is not set")]
    MissingTimestamp,
    #[error("data entry key is empty")]
    EmptyDataKey,
    #[error("data entry key {key:?} is {len} bytes, at most {max} are allowed", max = MAX_DATA_KEY_LENGTH)]
    DataKeyTooLong { key: String, len: usize },
    #[error("transfer amount must be positive")]
    ZeroAmount,
    #[error("script is present but empty")]
    EmptyScript,
    #[error("{what} is {len} bytes, exceeding the {max} byte limit", max = u16::MAX)]
    TooLong { what: &'static str, len: usize },
    #[error("transaction already carries {max} proofs", max = MAX_PROOFS)]
    TooManyProofs,
    #[error("{what} belongs to chain {found:?}, transaction targets {expected:?}")]
    ChainIdMismatch {
        what: &'static str,
        expected: char,
        found: char,
    },
}

/// Content-addressed transaction id: `blake2b256` of the body bytes.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TxId([u8; 32]);

impl TxId {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&bs58::encode(self.0).into_string())
    }
}

impl fmt::Debug for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TxId({self})")
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DataEntry {
    pub key: String,
    pub value: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Payload {
    /// Installs `script` on the sender account, or removes the current one when `None`.
    SetScript { script: Option<Vec<u8>> },
    /// Writes string entries to the sender account storage.
    Data { entries: Vec<DataEntry> },
    /// Moves native currency to `recipient`.
    Transfer {
        recipient: Address,
        amount: u64,
        attachment: Vec<u8>,
    },
}

#[derive(Clone, Debug)]
pub struct Transaction {
    pub chain_id: u8,
    pub sender: PublicKey,
    pub fee: u64,
    pub timestamp: u64,
    pub payload: Payload,
    pub proofs: Vec<Signature>,
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

fn put_u16_bytes(
    buf: &mut Vec<u8>,
    what: &'static str,
    bytes: &[u8],
) -> Result<(), TransactionError> {
    let len = u16::try_from(bytes.len()).map_err(|_| TransactionError::TooLong {
        what,
        len: bytes.len(),
    })?;
    buf.extend_from_slice(&len.to_be_bytes());
    buf.extend_from_slice(bytes);
    Ok(())
}

impl Transaction {
    fn new(chain_id: u8, sender: PublicKey, fee: u64, payload: Payload) -> Self {
        Self {
            chain_id,
            sender,
            fee,
            timestamp: now_millis(),
            payload,
            proofs: Vec::new(),
        }
    }

    pub fn set_script(chain_id: u8, sender: PublicKey, script: Option<Vec<u8>>, fee: u64) -> Self {
        Self::new(chain_id, sender, fee, Payload::SetScript { script })
    }

    pub fn data(chain_id: u8, sender: PublicKey, entries: Vec<DataEntry>, fee: u64) -> Self {
        Self::new(chain_id, sender, fee, Payload::Data { entries })
    }

    pub fn transfer(
        chain_id: u8,
        sender: PublicKey,
        recipient: Address,
        amount: u64,
        fee: u64,
    ) -> Self {
        let payload = Payload::Transfer {
            recipient,
            amount,
            attachment: Vec::new(),
        };
        Self::new(chain_id, sender, fee, payload)
    }

    pub fn with_timestamp(mut self, timestamp: u64) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn type_id(&self) -> u8 {
        match self.payload {
            Payload::SetScript { .. } => SET_SCRIPT_TYPE,
            Payload::Data { .. } => DATA_TYPE,
            Payload::Transfer { .. } => TRANSFER_TYPE,
        }
    }

    pub fn version(&self) -> u8 {
        match self.payload {
            Payload::Transfer { .. } => 2,
            _ => 1,
        }
    }

    pub fn sender_address(&self) -> Address {
        Address::from_public_key(self.chain_id, &self.sender)
    }

    /// Checks the structural rules the node enforces before accepting a transaction.
    pub fn validate(&self) -> Result<(), TransactionError> {
        if self.fee == 0 {
            return Err(TransactionError::ZeroFee);
        }
        if self.timestamp == 0 {
            return Err(TransactionError::MissingTimestamp);
        }
        if self.proofs.len() > MAX_PROOFS {
            return Err(TransactionError::TooManyProofs);
        }
        match &self.payload {
            Payload::SetScript { script } => {
                if script.as_ref().is_some_and(|s| s.is_empty()) {
                    return Err(TransactionError::EmptyScript);
                }
            }
            Payload::Data { entries } => {
                for entry in entries {
                    if entry.key.is_empty() {
                        return Err(TransactionError::EmptyDataKey);
                    }
                    if entry.key.len() > MAX_DATA_KEY_LENGTH {
                        return Err(TransactionError::DataKeyTooLong {
                            key: entry.key.clone(),
                            len: entry.key.len(),
                        });
                    }
                }
            }
            Payload::Transfer {
                recipient, amount, ..
            } => {
                if *amount == 0 {
                    return Err(TransactionError::ZeroAmount);
                }
                if recipient.chain_id() != self.chain_id {
                    return Err(TransactionError::ChainIdMismatch {
                        what: "recipient",
                        expected: self.chain_id as char,
                        found: recipient.chain_id() as char,
                    });
                }
            }
        }
        // Length prefixes are checked while encoding.
        self.body_bytes().map(|_| ())
    }

    /// The signed portion of the transaction.
    pub fn body_bytes(&self) -> Result<Vec<u8>, TransactionError> {
        let mut buf = vec![self.type_id(), self.version()];
        match &self.payload {
            Payload::SetScript { script } => {
                buf.push(self.chain_id);
                buf.extend_from_slice(self.sender.as_bytes());
                match script {
                    Some(script) => {
                        buf.push(1);
                        put_u16_bytes(&mut buf, "script", script)?;
                    }
                    None => buf.push(0),
                }
                buf.extend_from_slice(&self.fee.to_be_bytes());
                buf.extend_from_slice(&self.timestamp.to_be_bytes());
            }
            Payload::Data { entries } => {
                buf.extend_from_slice(self.sender.as_bytes());
                let count = u16::try_from(entries.len()).map_err(|_| TransactionError::TooLong {
                    what: "data entry list",
                    len: entries.len(),
                })?;
                buf.extend_from_slice(&count.to_be_bytes());
                for entry in entries {
                    put_u16_bytes(&mut buf, "data key", entry.key.as_bytes())?;
                    buf.push(STRING_ENTRY_TYPE);
                    put_u16_bytes(&mut buf, "data value", entry.value.as_bytes())?;
                }
                buf.extend_from_slice(&self.timestamp.to_be_bytes());
                buf.extend_from_slice(&self.fee.to_be_bytes());
            }
            Payload::Transfer {
                recipient,
                amount,
                attachment,
            } => {
                buf.extend_from_slice(self.sender.as_bytes());
                // Native asset for both the amount and the fee.
                buf.push(0);
                buf.push(0);
                buf.extend_from_slice(&self.timestamp.to_be_bytes());
                buf.extend_from_slice(&amount.to_be_bytes());
                buf.extend_from_slice(&self.fee.to_be_bytes());
                buf.extend_from_slice(recipient.as_bytes());
                put_u16_bytes(&mut buf, "attachment", attachment)?;
            }
        }
        Ok(buf)
    }

    pub fn id(&self) -> Result<TxId, TransactionError> {
        Ok(TxId(blake2b256(&self.body_bytes()?)))
    }

    /// Appends a proof signed by `key`. Proof order matters to account scripts.
    pub fn sign(&mut self, key: &SecretKey) -> Result<(), TransactionError> {
        if self.proofs.len() >= MAX_PROOFS {
            return Err(TransactionError::TooManyProofs);
        }
        let signature = key.sign(&self.body_bytes()?);
        self.proofs.push(signature);
        Ok(())
    }
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct TransactionJson {
    id: String,
    #[serde(rename = "type")]
    tx_type: u8,
    version: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    chain_id: Option<u8>,
    sender_public_key: String,
    fee: u64,
    timestamp: u64,
    proofs: Vec<String>,
    #[serde(flatten)]
    payload: PayloadJson,
}

#[derive(serde::Serialize)]
#[serde(untagged)]
enum PayloadJson {
    SetScript {
        script: Option<String>,
    },
    Data {
        data: Vec<DataEntryJson>,
    },
    Transfer {
        recipient: String,
        amount: u64,
        #[serde(rename = "assetId")]
        asset_id: Option<String>,
        #[serde(rename = "feeAssetId")]
        fee_asset_id: Option<String>,
        attachment: String,
    },
}

#[derive(serde::Serialize)]
struct DataEntryJson {
    key: String,
    #[serde(rename = "type")]
    entry_type: &'static str,
    value: String,
}

impl serde::Serialize for Transaction {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let id = self
            .id()
            .map_err(<S::Error as serde::ser::Error>::custom)?;
        let payload = match &self.payload {
            Payload::SetScript { script } => PayloadJson::SetScript {
                script: script
                    .as_ref()
                    .map(|s| format!("base64:{}", STANDARD.encode(s))),
            },
            Payload::Data { entries } => PayloadJson::Data {
                data: entries
                    .iter()
                    .map(|e| DataEntryJson {
                        key: e.key.clone(),
                        entry_type: "string",
                        value: e.value.clone(),
                    })
                    .collect(),
            },
            Payload::Transfer {
                recipient,
                amount,
                attachment,
            } => PayloadJson::Transfer {
                recipient: recipient.to_string(),
                amount: *amount,
                asset_id: None,
                fee_asset_id: None,
                attachment: bs58::encode(attachment).into_string(),
            },
        };
        let json = TransactionJson {
            id: id.to_string(),
            tx_type: self.type_id(),
            version: self.version(),
            chain_id: matches!(self.payload, Payload::SetScript { .. }).then_some(self.chain_id),
            sender_public_key: self.sender.to_string(),
            fee: self.fee,
            timestamp: self.timestamp,
            proofs: self.proofs.iter().map(ToString::to_string).collect(),
            payload,
        };
        serde::Serialize::serialize(&json, serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::crypto::KeyPair;

    fn keys() -> KeyPair {
        KeyPair::from_seed("transaction tests", 0)
    }

    #[test]
    fn set_script_body_layout() {
        let keys = keys();
        let tx = Transaction::set_script(b'T', keys.public, Some(vec![0, 1, 2]), 1_300_000)
            .with_timestamp(1_700_000_000_000);
        let body = tx.body_bytes().unwrap();
        assert_eq!(&body[..3], &[13, 1, b'T']);
        assert_eq!(&body[3..35], keys.public.as_bytes());
        assert_eq!(&body[35..41], &[1, 0, 3, 0, 1, 2]);
        assert_eq!(body.len(), 41 + 8 + 8);
    }

    #[test]
    fn id_ignores_proofs() {
        let keys = keys();
        let mut tx = Transaction::data(
            b'T',
            keys.public,
            vec![DataEntry {
                key: "k".into(),
                value: "v".into(),
            }],
            500_000,
        );
        let before = tx.id().unwrap();
        tx.sign(&keys.secret).unwrap();
        assert_eq!(tx.id().unwrap(), before);
        assert!(keys
            .public
            .verify(&tx.body_bytes().unwrap(), &tx.proofs[0]));
    }

    #[test]
    fn validation_rules() {
        let keys = keys();
        let zero_fee = Transaction::set_script(b'T', keys.public, None, 0);
        assert!(matches!(zero_fee.validate(), Err(TransactionError::ZeroFee)));

        let empty_script = Transaction::set_script(b'T', keys.public, Some(vec![]), 1);
        assert!(matches!(
            empty_script.validate(),
            Err(TransactionError::EmptyScript)
        ));

        let long_key = DataEntry {
            key: "k".repeat(401),
            value: String::new(),
        };
        let data = Transaction::data(b'T', keys.public, vec![long_key], 500_000);
        assert!(matches!(
            data.validate(),
            Err(TransactionError::DataKeyTooLong { len: 401, .. })
        ));

        let mainnet_recipient = keys.address(b'W');
        let transfer = Transaction::transfer(b'T', keys.public, mainnet_recipient, 10, 100_000);
        assert!(matches!(
            transfer.validate(),
            Err(TransactionError::ChainIdMismatch { .. })
        ));

        let ok = Transaction::transfer(b'T', keys.public, keys.address(b'T'), 10, 100_000);
        ok.validate().unwrap();
    }

    #[test]
    fn proofs_are_capped() {
        let keys = keys();
        let mut tx = Transaction::set_script(b'T', keys.public, None, 1_300_000);
        for _ in 0..MAX_PROOFS {
            tx.sign(&keys.secret).unwrap();
        }
        assert!(matches!(
            tx.sign(&keys.secret),
            Err(TransactionError::TooManyProofs)
        ));
    }

    #[test]
    fn broadcast_json_shape() {
        let keys = keys();
        let tx = Transaction::set_script(b'T', keys.public, Some(vec![0, 1, 1]), 1_300_000);
        let json = serde_json::to_value(&tx).unwrap();
        assert_eq!(json["type"], 13);
        assert_eq!(json["version"], 1);
        assert_eq!(json["chainId"], 84);
        assert_eq!(json["script"], "base64:AAEB");
        assert_eq!(json["senderPublicKey"], keys.public.to_string());
        assert_eq!(json["id"], tx.id().unwrap().to_string());
        assert_eq!(json["proofs"], serde_json::json!([]));

        let transfer = Transaction::transfer(b'T', keys.public, keys.address(b'T'), 5, 100_000);
        let json = serde_json::to_value(&transfer).unwrap();
        assert_eq!(json["type"], 4);
        assert_eq!(json["amount"], 5);
        assert!(json["assetId"].is_null());
        assert!(json.get("chainId").is_none());
    }
}
