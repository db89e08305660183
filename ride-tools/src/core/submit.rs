// Copyright 2025, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/stylus-sdk-rs/blob/main/licenses/COPYRIGHT.md

//! Transaction submission.
//!
//! [`Submitter::submit`] validates, signs, funds and broadcasts a transaction, then either waits
//! for it to be mined or hands the wait to a [`ConfirmationGroup`] that is joined once at the end
//! of a synchronization pass.

use std::{sync::Arc, time::Duration};

use tokio::task::{JoinError, JoinSet};

use crate::core::{
    crypto::SecretKey,
    events::{EventSink, SyncEvent},
    fee::{Funder, FundingError},
    node::{NodeApi, NodeError},
    transaction::{Transaction, TransactionError, TxId},
};

/// Spacing between height polls in [`wait_blocks`].
pub const HEIGHT_POLL_INTERVAL: Duration = Duration::from_secs(5);

#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error("invalid transaction: {0}")]
    Transaction(#[from] TransactionError),
    #[error("{0}")]
    Funding(#[from] FundingError),
    #[error("broadcast failed: {0}")]
    Broadcast(#[from] NodeError),
    #[error("transaction {id} was not mined after {attempts} attempts")]
    NotConfirmed {
        id: TxId,
        attempts: u32,
        #[source]
        last_error: Option<NodeError>,
    },
    #[error("confirmation task failed: {0}")]
    TaskFailed(#[from] JoinError),
}

/// How long to poll for a transaction before giving up on it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConfirmationPolicy {
    pub attempts: u32,
    pub interval: Duration,
}

impl Default for ConfirmationPolicy {
    fn default() -> Self {
        Self {
            attempts: 100,
            interval: Duration::from_secs(10),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SubmitOptions {
    /// Track the confirmation in the pending group instead of waiting inline.
    pub asynchronous: bool,
    /// Fund the sender before broadcasting.
    pub ensure_fee: bool,
}

/// Polls until `id` is mined. Lookup errors count as "not yet".
pub async fn wait_confirmed(
    node: &dyn NodeApi,
    id: &TxId,
    policy: &ConfirmationPolicy,
) -> Result<(), SubmitError> {
    let mut last_error = None;
    for attempt in 1..=policy.attempts {
        match node.is_confirmed(id).await {
            Ok(true) => {
                debug!(@grey, "tx {id} mined after {attempt} attempt(s)");
                return Ok(());
            }
            Ok(false) => last_error = None,
            Err(err) => last_error = Some(err),
        }
        if attempt < policy.attempts {
            tokio::time::sleep(policy.interval).await;
        }
    }
    Err(SubmitError::NotConfirmed {
        id: *id,
        attempts: policy.attempts,
        last_error,
    })
}

/// Broadcasts an already signed transaction and waits for it to be mined.
pub async fn broadcast_and_confirm(
    node: &dyn NodeApi,
    tx: &Transaction,
    policy: &ConfirmationPolicy,
) -> Result<TxId, SubmitError> {
    let id = tx.id()?;
    node.broadcast(tx).await?;
    wait_confirmed(node, &id, policy).await?;
    Ok(id)
}

/// Blocks until the chain is `blocks` blocks higher than it is now.
pub async fn wait_blocks(
    node: &dyn NodeApi,
    blocks: u64,
    interval: Duration,
    events: &dyn EventSink,
) -> Result<u64, NodeError> {
    let desired = node.height().await? + blocks;
    loop {
        tokio::time::sleep(interval).await;
        let actual = node.height().await?;
        if actual >= desired {
            events.record(&SyncEvent::HeightReached { actual, desired });
            return Ok(actual);
        }
        events.record(&SyncEvent::WaitingForHeight { actual, desired });
    }
}

/// Confirmation waits running in the background.
#[derive(Default)]
pub struct ConfirmationGroup {
    tasks: JoinSet<Result<TxId, SubmitError>>,
}

impl ConfirmationGroup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn track(&mut self, node: Arc<dyn NodeApi>, id: TxId, policy: ConfirmationPolicy) {
        self.tasks.spawn(async move {
            wait_confirmed(node.as_ref(), &id, &policy).await?;
            Ok(id)
        });
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Joins every tracked wait. The first failure cancels the rest and is returned.
    pub async fn await_all(&mut self) -> Result<Vec<TxId>, SubmitError> {
        let mut confirmed = Vec::with_capacity(self.tasks.len());
        while let Some(joined) = self.tasks.join_next().await {
            let failure = match joined {
                Ok(Ok(id)) => {
                    confirmed.push(id);
                    continue;
                }
                Ok(Err(err)) => err,
                Err(err) => SubmitError::TaskFailed(err),
            };
            self.tasks.abort_all();
            while self.tasks.join_next().await.is_some() {}
            return Err(failure);
        }
        Ok(confirmed)
    }

    /// Cancels every tracked wait.
    pub fn abort_all(&mut self) {
        self.tasks.abort_all();
    }
}

pub struct Submitter {
    node: Arc<dyn NodeApi>,
    chain_id: u8,
    funder: Funder,
    policy: ConfirmationPolicy,
    pending: ConfirmationGroup,
}

impl Submitter {
    pub fn new(
        node: Arc<dyn NodeApi>,
        chain_id: u8,
        funder: Funder,
        policy: ConfirmationPolicy,
    ) -> Self {
        Self {
            node,
            chain_id,
            funder,
            policy,
            pending: ConfirmationGroup::new(),
        }
    }

    /// Signs `tx` with each of `keys` in order and sends it.
    pub async fn submit(
        &mut self,
        mut tx: Transaction,
        keys: &[&SecretKey],
        options: SubmitOptions,
    ) -> Result<TxId, SubmitError> {
        if tx.chain_id != self.chain_id {
            return Err(TransactionError::ChainIdMismatch {
                what: "transaction",
                expected: self.chain_id as char,
                found: tx.chain_id as char,
            }
            .into());
        }
        tx.validate()?;
        for key in keys {
            tx.sign(key)?;
        }
        let id = tx.id()?;

        if options.ensure_fee {
            self.funder.ensure_funded(&tx.sender_address(), tx.fee).await?;
        }

        self.node.broadcast(&tx).await?;
        debug!(@grey, "broadcast tx {id} (type {}, {} proofs)", tx.type_id(), tx.proofs.len());

        if options.asynchronous {
            self.pending.track(Arc::clone(&self.node), id, self.policy);
        } else {
            wait_confirmed(self.node.as_ref(), &id, &self.policy).await?;
        }
        Ok(id)
    }

    /// Number of transactions whose confirmation is still tracked.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    pub async fn await_all(&mut self) -> Result<Vec<TxId>, SubmitError> {
        self.pending.await_all().await
    }

    /// Stops tracking pending confirmations. Broadcast transactions may still be mined.
    pub fn abort_pending(&mut self) {
        self.pending.abort_all();
    }

    pub fn chain_id(&self) -> u8 {
        self.chain_id
    }

    pub fn node(&self) -> &Arc<dyn NodeApi> {
        &self.node
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::core::{crypto::KeyPair, events::RecordingSink, fee::UNIT, node::MockNodeApi};

    fn submitter(node: MockNodeApi) -> Submitter {
        let node: Arc<dyn NodeApi> = Arc::new(node);
        let funder = Funder::new(
            Arc::clone(&node),
            KeyPair::from_seed("funding", 0),
            b'T',
            ConfirmationPolicy::default(),
            Arc::new(RecordingSink::default()),
        );
        Submitter::new(node, b'T', funder, ConfirmationPolicy::default())
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_the_attempt_budget() {
        let mut node = MockNodeApi::new();
        node.expect_is_confirmed().times(3).returning(|_| Ok(false));
        let keys = KeyPair::from_seed("contract", 0);
        let id = Transaction::set_script(b'T', keys.public, None, 1_300_000)
            .id()
            .unwrap();

        let policy = ConfirmationPolicy {
            attempts: 3,
            interval: Duration::from_secs(10),
        };
        let started = tokio::time::Instant::now();
        let result = wait_confirmed(&node, &id, &policy).await;
        assert!(matches!(
            result,
            Err(SubmitError::NotConfirmed { attempts: 3, last_error: None, .. })
        ));
        assert_eq!(started.elapsed(), Duration::from_secs(20));
    }

    #[tokio::test(start_paused = true)]
    async fn lookup_errors_are_retried() {
        let mut node = MockNodeApi::new();
        let mut calls = 0;
        node.expect_is_confirmed().times(2).returning(move |_| {
            calls += 1;
            if calls == 1 {
                Err(NodeError::Status {
                    status: 502,
                    body: "bad gateway".into(),
                })
            } else {
                Ok(true)
            }
        });
        let keys = KeyPair::from_seed("contract", 0);
        let id = Transaction::set_script(b'T', keys.public, None, 1_300_000)
            .id()
            .unwrap();
        wait_confirmed(&node, &id, &ConfirmationPolicy::default())
            .await
            .unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn async_submissions_join_at_the_end() {
        let keys = KeyPair::from_seed("contract", 0);
        let signer = KeyPair::from_seed("signer", 0);
        let broadcast = Arc::new(Mutex::new(Vec::new()));

        let mut node = MockNodeApi::new();
        node.expect_balance().returning(|_| Ok(10 * UNIT));
        let seen = Arc::clone(&broadcast);
        node.expect_broadcast().times(1).returning(move |tx| {
            seen.lock().unwrap().push(tx.clone());
            Ok(())
        });
        node.expect_is_confirmed().times(1).returning(|_| Ok(true));

        let mut submitter = submitter(node);
        let tx = Transaction::set_script(b'T', keys.public, Some(vec![0, 1, 1]), 1_300_000);
        let options = SubmitOptions {
            asynchronous: true,
            ensure_fee: true,
        };
        let id = submitter
            .submit(tx, &[&keys.secret, &signer.secret], options)
            .await
            .unwrap();
        assert_eq!(submitter.pending(), 1);
        assert_eq!(submitter.await_all().await.unwrap(), vec![id]);
        assert_eq!(submitter.pending(), 0);

        let sent = broadcast.lock().unwrap();
        let body = sent[0].body_bytes().unwrap();
        assert!(keys.public.verify(&body, &sent[0].proofs[0]));
        assert!(signer.public.verify(&body, &sent[0].proofs[1]));
    }

    #[tokio::test(start_paused = true)]
    async fn first_failure_fails_the_group() {
        let keys = KeyPair::from_seed("contract", 0);
        let good = Transaction::set_script(b'T', keys.public, None, 1_300_000)
            .id()
            .unwrap();
        let bad = Transaction::set_script(b'T', keys.public, None, 1_400_000)
            .id()
            .unwrap();

        let mut node = MockNodeApi::new();
        node.expect_is_confirmed().returning(move |id| Ok(*id == good));
        let node: Arc<dyn NodeApi> = Arc::new(node);

        let policy = ConfirmationPolicy {
            attempts: 2,
            interval: Duration::from_secs(1),
        };
        let mut group = ConfirmationGroup::new();
        group.track(Arc::clone(&node), good, policy);
        group.track(Arc::clone(&node), bad, policy);
        assert_eq!(group.len(), 2);

        let result = group.await_all().await;
        assert!(matches!(
            result,
            Err(SubmitError::NotConfirmed { id, .. }) if id == bad
        ));
        assert!(group.is_empty());
    }

    #[tokio::test]
    async fn rejects_foreign_chain_before_signing() {
        let node = MockNodeApi::new();
        let mut submitter = submitter(node);
        let keys = KeyPair::from_seed("contract", 0);
        let tx = Transaction::set_script(b'W', keys.public, None, 1_300_000);
        let result = submitter
            .submit(tx, &[&keys.secret], SubmitOptions::default())
            .await;
        assert!(matches!(
            result,
            Err(SubmitError::Transaction(TransactionError::ChainIdMismatch { .. }))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn waits_for_block_height() {
        let mut node = MockNodeApi::new();
        let mut heights = vec![100, 101, 103].into_iter();
        node.expect_height()
            .times(3)
            .returning(move || Ok(heights.next().unwrap_or(103)));
        let events = RecordingSink::default();

        let height = wait_blocks(&node, 2, HEIGHT_POLL_INTERVAL, &events)
            .await
            .unwrap();
        assert_eq!(height, 103);
        assert_eq!(
            events.events(),
            vec![
                SyncEvent::WaitingForHeight {
                    actual: 101,
                    desired: 102
                },
                SyncEvent::HeightReached {
                    actual: 103,
                    desired: 102
                },
            ]
        );
    }
}
