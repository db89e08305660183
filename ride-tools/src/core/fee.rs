// Copyright 2025, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/stylus-sdk-rs/blob/main/licenses/COPYRIGHT.md

//! Transaction fees and account funding.

use std::sync::Arc;

use crate::core::{
    crypto::{Address, KeyPair},
    events::{EventSink, SyncEvent},
    node::{NodeApi, NodeError},
    submit::{self, ConfirmationPolicy, SubmitError},
    transaction::{Transaction, TransactionError, TxId},
};

/// One unit of the native currency in its smallest denomination.
pub const UNIT: u64 = 100_000_000;

/// Balance kept on every account on top of the fee it is about to pay.
pub const OPERATIONAL_BUFFER: u64 = 2 * UNIT;

pub const MIN_SET_SCRIPT_FEE: u64 = 1_300_000;
pub const SET_SCRIPT_FEE_PER_KB: u64 = 100_000;
pub const SET_SCRIPT_SURCHARGE: u64 = 400_000;

pub const TRANSFER_FEE: u64 = 100_000;
pub const DATA_FEE: u64 = 500_000;

/// Fee of a set-script transaction carrying `len` bytes of compiled script.
pub fn set_script_fee(len: usize) -> u64 {
    let kilobytes = (len as u64).div_ceil(1000);
    let fee = kilobytes * SET_SCRIPT_FEE_PER_KB + SET_SCRIPT_SURCHARGE;
    fee.max(MIN_SET_SCRIPT_FEE)
}

/// Amount missing from `balance` to cover the buffer and `fee`, if any.
pub fn funding_shortfall(balance: u64, fee: u64) -> Option<u64> {
    let threshold = OPERATIONAL_BUFFER + fee;
    (balance < threshold).then(|| threshold - balance)
}

#[derive(Debug, thiserror::Error)]
pub enum FundingError {
    #[error("{0}")]
    Node(#[from] NodeError),
    #[error("{0}")]
    Transaction(#[from] TransactionError),
    #[error("funding transfer to {address} failed: {source}")]
    Transfer {
        address: Address,
        #[source]
        source: Box<SubmitError>,
    },
}

/// Tops accounts up from a funding account before they pay fees.
pub struct Funder {
    node: Arc<dyn NodeApi>,
    account: KeyPair,
    chain_id: u8,
    policy: ConfirmationPolicy,
    events: Arc<dyn EventSink>,
}

impl Funder {
    pub fn new(
        node: Arc<dyn NodeApi>,
        account: KeyPair,
        chain_id: u8,
        policy: ConfirmationPolicy,
        events: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            node,
            account,
            chain_id,
            policy,
            events,
        }
    }

    pub fn address(&self) -> Address {
        self.account.address(self.chain_id)
    }

    /// Makes sure `address` can pay `fee`, transferring the shortfall and waiting for it to be
    /// mined when needed.
    pub async fn ensure_funded(
        &self,
        address: &Address,
        fee: u64,
    ) -> Result<Option<TxId>, FundingError> {
        let balance = self.node.balance(address).await?;
        let Some(amount) = funding_shortfall(balance, fee) else {
            return Ok(None);
        };

        let mut transfer =
            Transaction::transfer(self.chain_id, self.account.public, *address, amount, TRANSFER_FEE);
        transfer.validate()?;
        transfer.sign(&self.account.secret)?;
        let id = submit::broadcast_and_confirm(self.node.as_ref(), &transfer, &self.policy)
            .await
            .map_err(|err| FundingError::Transfer {
                address: *address,
                source: Box::new(err),
            })?;

        self.events.record(&SyncEvent::Funded {
            address: *address,
            amount,
            balance_before: balance,
            balance_after: balance + amount,
        });
        Ok(Some(id))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use mockall::predicate::eq;

    use super::*;
    use crate::core::{events::RecordingSink, node::MockNodeApi, transaction::Payload};

    #[test]
    fn set_script_fee_formula() {
        assert_eq!(set_script_fee(1), MIN_SET_SCRIPT_FEE);
        assert_eq!(set_script_fee(8_000), MIN_SET_SCRIPT_FEE);
        assert_eq!(set_script_fee(9_001), 1_400_000);
        assert_eq!(set_script_fee(32_768), 3_700_000);
    }

    #[test]
    fn set_script_fee_is_monotonic() {
        let mut previous = 0;
        for len in (0..40_000).step_by(250) {
            let fee = set_script_fee(len);
            assert!(fee >= previous);
            assert!(fee >= MIN_SET_SCRIPT_FEE);
            previous = fee;
        }
        assert!(set_script_fee(20_001) > set_script_fee(19_000));
    }

    #[test]
    fn shortfall_at_threshold() {
        let fee = 1_300_000;
        assert_eq!(funding_shortfall(OPERATIONAL_BUFFER + fee, fee), None);
        assert_eq!(funding_shortfall(OPERATIONAL_BUFFER + fee + 1, fee), None);
        assert_eq!(funding_shortfall(OPERATIONAL_BUFFER, fee), Some(fee));
        assert_eq!(funding_shortfall(0, fee), Some(OPERATIONAL_BUFFER + fee));
    }

    fn funder(node: MockNodeApi, events: Arc<RecordingSink>) -> Funder {
        Funder::new(
            Arc::new(node),
            KeyPair::from_seed("funding account", 0),
            b'T',
            ConfirmationPolicy::default(),
            events,
        )
    }

    #[tokio::test]
    async fn transfers_exact_shortfall_once() {
        let target = KeyPair::from_seed("contract", 0).address(b'T');
        let fee = 1_300_000;
        let balance = 50_000_000;
        let sent = Arc::new(Mutex::new(Vec::new()));

        let mut node = MockNodeApi::new();
        node.expect_balance()
            .with(eq(target))
            .times(1)
            .returning(move |_| Ok(balance));
        let sent_by_node = Arc::clone(&sent);
        node.expect_broadcast().times(1).returning(move |tx| {
            sent_by_node.lock().unwrap().push(tx.clone());
            Ok(())
        });
        node.expect_is_confirmed().times(1).returning(|_| Ok(true));

        let events = Arc::new(RecordingSink::default());
        let funder = funder(node, Arc::clone(&events));
        let id = funder.ensure_funded(&target, fee).await.unwrap();

        let sent = sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(Some(sent[0].id().unwrap()), id);
        let Payload::Transfer {
            recipient, amount, ..
        } = &sent[0].payload
        else {
            panic!("expected a transfer, got {:?}", sent[0].payload);
        };
        assert_eq!(*recipient, target);
        assert_eq!(*amount, OPERATIONAL_BUFFER + fee - balance);
        assert_eq!(sent[0].proofs.len(), 1);

        assert_eq!(
            events.events(),
            vec![SyncEvent::Funded {
                address: target,
                amount: OPERATIONAL_BUFFER + fee - balance,
                balance_before: balance,
                balance_after: OPERATIONAL_BUFFER + fee,
            }]
        );
    }

    #[tokio::test]
    async fn funded_accounts_get_nothing() {
        let target = KeyPair::from_seed("contract", 0).address(b'T');
        let mut node = MockNodeApi::new();
        node.expect_balance()
            .times(1)
            .returning(|_| Ok(OPERATIONAL_BUFFER + DATA_FEE));
        node.expect_broadcast().never();

        let events = Arc::new(RecordingSink::default());
        let funder = funder(node, Arc::clone(&events));
        assert_eq!(funder.ensure_funded(&target, DATA_FEE).await.unwrap(), None);
        assert!(events.events().is_empty());
    }
}
