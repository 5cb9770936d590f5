//! Sequencing engine: the trusted-sequencer path, the forced-batch queue
//! and the permissionless forced-sequencing fallback.
//!
//! Both paths extend the same accumulator chain; a forced batch queued
//! here is satisfied either by the trusted sequencer including it in a
//! regular sequence or, after the timeout, by anyone replaying it through
//! [`RollupCore::sequence_force_batches`].

use alloy_primitives::U256;
use tracing::*;
use zkrollup_primitives::buf::Buf20;
use zkrollup_primitives::constants::{
    MAX_FORCE_BATCH_BYTE_LENGTH, MAX_TRANSACTIONS_BYTE_LENGTH, MAX_VERIFY_BATCHES,
};
use zkrollup_primitives::hash;
use zkrollup_state::batch::{
    compute_forced_batch_commitment, extend_acc_input_hash, BatchData, ForcedBatchData,
    SequencedBatch,
};

use crate::context::CallContext;
use crate::errors::SequencingError;
use crate::traits::{BatchCommitmentBinding, BridgeCtl, ExitRootManager, ProofVerifier, StakeToken};
use crate::RollupCore;

impl<T, V, G, B, C> RollupCore<T, V, G, B, C>
where
    T: StakeToken,
    V: ProofVerifier,
    G: ExitRootManager,
    B: BridgeCtl,
    C: BatchCommitmentBinding,
{
    /// Sequences an ordered list of batches on the trusted path, charging
    /// the batch fee for every non-forced batch.  Returns the new chain
    /// tip batch number.
    pub fn sequence_batches(
        &mut self,
        ctx: &CallContext,
        batches: &[BatchData],
        l2_coinbase: Buf20,
    ) -> Result<u64, SequencingError> {
        if self.is_emergency_state() {
            return Err(SequencingError::OnlyNotEmergencyState);
        }
        if ctx.caller() != self.state.trusted_sequencer() {
            return Err(SequencingError::OnlyTrustedSequencer);
        }

        let batches_num = batches.len() as u64;
        if batches_num == 0 {
            return Err(SequencingError::SequenceZeroBatches);
        }
        if batches_num > MAX_VERIFY_BATCHES {
            return Err(SequencingError::ExceedMaxVerifyBatches(
                batches_num,
                MAX_VERIFY_BATCHES,
            ));
        }

        let mut current_timestamp = self.state.last_timestamp();
        let mut current_batch_sequenced = self.state.last_batch_sequenced();
        let init_force_batch_sequenced = self.state.last_force_batch_sequenced();
        let mut current_force_batch_sequenced = init_force_batch_sequenced;
        let mut current_acc_input_hash = self.state.tip_acc_input_hash();

        for batch in batches {
            let txs_hash = hash::keccak(&batch.transactions);

            if batch.min_forced_timestamp > 0 {
                // This batch claims to satisfy the next queued forced batch.
                current_force_batch_sequenced += 1;
                if current_force_batch_sequenced > self.state.last_force_batch() {
                    return Err(SequencingError::ForceBatchesOverflow(
                        current_force_batch_sequenced,
                        self.state.last_force_batch(),
                    ));
                }

                let commitment = compute_forced_batch_commitment(
                    &txs_hash,
                    &batch.global_exit_root,
                    batch.min_forced_timestamp,
                );
                let expected = self
                    .state
                    .forced_batch_commitment(current_force_batch_sequenced);
                if expected != Some(&commitment) {
                    return Err(SequencingError::ForcedDataDoesNotMatch(
                        current_force_batch_sequenced,
                    ));
                }

                if batch.timestamp < batch.min_forced_timestamp {
                    return Err(SequencingError::SequencedTimestampBelowForcedTimestamp(
                        batch.timestamp,
                        batch.min_forced_timestamp,
                    ));
                }
            }

            if batch.transactions.len() > MAX_TRANSACTIONS_BYTE_LENGTH {
                return Err(SequencingError::TransactionsLengthAboveMax(
                    batch.transactions.len(),
                    MAX_TRANSACTIONS_BYTE_LENGTH,
                ));
            }

            // Timestamps must never decrease and never run ahead of the host.
            if batch.timestamp < current_timestamp || batch.timestamp > ctx.timestamp() {
                return Err(SequencingError::SequencedTimestampInvalid(
                    batch.timestamp,
                    current_timestamp,
                    ctx.timestamp(),
                ));
            }

            current_acc_input_hash = extend_acc_input_hash(
                &current_acc_input_hash,
                &txs_hash,
                &batch.global_exit_root,
                batch.timestamp,
                &l2_coinbase,
            );
            current_timestamp = batch.timestamp;
            current_batch_sequenced += 1;
        }

        if !self
            .binding
            .check_commitment(current_batch_sequenced, &current_acc_input_hash)
        {
            return Err(SequencingError::CommitmentBindingRejected(
                current_batch_sequenced,
            ));
        }

        // Forced batches already paid their collateral when queued.
        let non_forced = batches_num - (current_force_batch_sequenced - init_force_batch_sequenced);
        self.token
            .transfer_from(ctx.caller(), self.state.batch_fee() * U256::from(non_forced))?;

        let entry = SequencedBatch::new(
            current_acc_input_hash,
            ctx.timestamp(),
            self.state.last_batch_sequenced(),
        );
        self.state
            .append_sequencing_event(current_batch_sequenced, entry, current_timestamp);
        if current_force_batch_sequenced != init_force_batch_sequenced {
            self.state
                .set_last_force_batch_sequenced(current_force_batch_sequenced);
        }

        info!(
            tip = %current_batch_sequenced,
            batches = %batches_num,
            "sequenced batches"
        );
        Ok(current_batch_sequenced)
    }

    /// Queues a batch for forced inclusion, collecting the current batch
    /// fee as collateral.  Returns the queue position.
    pub fn force_batch(
        &mut self,
        ctx: &CallContext,
        transactions: Vec<u8>,
        token_amount: U256,
    ) -> Result<u64, SequencingError> {
        if self.is_emergency_state() {
            return Err(SequencingError::OnlyNotEmergencyState);
        }

        let fee = self.state.batch_fee();
        if fee > token_amount {
            return Err(SequencingError::NotEnoughTokenAmount(token_amount, fee));
        }
        if transactions.len() > MAX_FORCE_BATCH_BYTE_LENGTH {
            return Err(SequencingError::TransactionsLengthAboveMax(
                transactions.len(),
                MAX_FORCE_BATCH_BYTE_LENGTH,
            ));
        }

        self.token.transfer_from(ctx.caller(), fee)?;

        let global_exit_root = self.exit_roots.last_global_exit_root();
        let commitment = compute_forced_batch_commitment(
            &hash::keccak(&transactions),
            &global_exit_root,
            ctx.timestamp(),
        );
        let queue_pos = self.state.push_forced_batch(commitment);

        debug!(%queue_pos, "queued forced batch");
        Ok(queue_pos)
    }

    /// Sequences queued forced batches directly, callable by anyone once
    /// the force-batch timeout has expired for the newest batch supplied.
    /// Returns the new chain tip batch number.
    pub fn sequence_force_batches(
        &mut self,
        ctx: &CallContext,
        batches: &[ForcedBatchData],
    ) -> Result<u64, SequencingError> {
        if self.is_emergency_state() {
            return Err(SequencingError::OnlyNotEmergencyState);
        }

        let batches_num = batches.len() as u64;
        if batches_num == 0 {
            return Err(SequencingError::SequenceZeroBatches);
        }
        if batches_num > MAX_VERIFY_BATCHES {
            return Err(SequencingError::ExceedMaxVerifyBatches(
                batches_num,
                MAX_VERIFY_BATCHES,
            ));
        }
        if self.state.last_force_batch_sequenced() + batches_num > self.state.last_force_batch() {
            return Err(SequencingError::ForceBatchesOverflow(
                self.state.last_force_batch_sequenced() + batches_num,
                self.state.last_force_batch(),
            ));
        }

        let mut current_batch_sequenced = self.state.last_batch_sequenced();
        let mut current_force_batch_sequenced = self.state.last_force_batch_sequenced();
        let mut current_acc_input_hash = self.state.tip_acc_input_hash();

        for (i, batch) in batches.iter().enumerate() {
            current_force_batch_sequenced += 1;

            let txs_hash = hash::keccak(&batch.transactions);
            let commitment = compute_forced_batch_commitment(
                &txs_hash,
                &batch.global_exit_root,
                batch.min_forced_timestamp,
            );
            let expected = self
                .state
                .forced_batch_commitment(current_force_batch_sequenced);
            if expected != Some(&commitment) {
                return Err(SequencingError::ForcedDataDoesNotMatch(
                    current_force_batch_sequenced,
                ));
            }

            // The newest batch has the most restrictive timeout; checking
            // it covers the whole span.
            if i == batches.len() - 1
                && batch.min_forced_timestamp + self.state.force_batch_timeout() > ctx.timestamp()
            {
                return Err(SequencingError::ForceBatchTimeoutNotExpired(
                    current_force_batch_sequenced,
                ));
            }

            current_acc_input_hash = extend_acc_input_hash(
                &current_acc_input_hash,
                &txs_hash,
                &batch.global_exit_root,
                ctx.timestamp(),
                ctx.caller(),
            );
            current_batch_sequenced += 1;
        }

        let entry = SequencedBatch::new(
            current_acc_input_hash,
            ctx.timestamp(),
            self.state.last_batch_sequenced(),
        );
        self.state
            .append_sequencing_event(current_batch_sequenced, entry, ctx.timestamp());
        self.state
            .set_last_force_batch_sequenced(current_force_batch_sequenced);

        info!(
            tip = %current_batch_sequenced,
            batches = %batches_num,
            "sequenced forced batches"
        );
        Ok(current_batch_sequenced)
    }
}

#[cfg(test)]
mod tests {
    use zkrollup_primitives::buf::Buf32;
    use zkrollup_primitives::constants::INITIAL_BATCH_FEE;
    use zkrollup_test_utils::{admin_addr, other_addr, sequencer_addr};

    use super::*;
    use crate::testing::*;

    #[test]
    fn test_sequence_batches_chains_acc_hash() {
        let mut core = test_core();
        let b1 = batch(1_000, 1);
        let b2 = batch(1_001, 2);

        let tip = core
            .sequence_batches(&ctx(sequencer_addr(), 1_005), &[b1.clone(), b2.clone()], coinbase())
            .expect("sequence");
        assert_eq!(tip, 2);
        assert_eq!(core.state().last_timestamp(), 1_001);

        let mut acc = Buf32::zero();
        for b in [&b1, &b2] {
            acc = extend_acc_input_hash(
                &acc,
                &hash::keccak(&b.transactions),
                &b.global_exit_root,
                b.timestamp,
                &coinbase(),
            );
        }
        assert_eq!(core.state().tip_acc_input_hash(), acc);

        let entry = core.state().sequenced_batch(2).expect("ledger entry");
        assert_eq!(entry.sequenced_at(), 1_005);
        assert_eq!(entry.prev_batch_sequenced(), 0);
        // Single ledger entry at the tip, none per inner batch.
        assert!(core.state().sequenced_batch(1).is_none());
    }

    #[test]
    fn test_sequence_batches_charges_fee_per_batch() {
        let mut core = test_core();
        sequence(&mut core, 1_000, 3);

        assert_eq!(
            core.token.balance_of(&sequencer_addr()),
            funds() - INITIAL_BATCH_FEE * U256::from(3)
        );
        assert_eq!(core.token.pool_balance(), INITIAL_BATCH_FEE * U256::from(3));
    }

    #[test]
    fn test_sequence_batches_access_control() {
        let mut core = test_core();
        let err = core
            .sequence_batches(&ctx(other_addr(), 1_000), &[batch(1_000, 1)], coinbase())
            .unwrap_err();
        assert_eq!(err, SequencingError::OnlyTrustedSequencer);

        core.activate_emergency_state(&ctx(admin_addr(), 1_000), 0)
            .expect("halt");
        let err = core
            .sequence_batches(&ctx(sequencer_addr(), 1_000), &[batch(1_000, 1)], coinbase())
            .unwrap_err();
        assert_eq!(err, SequencingError::OnlyNotEmergencyState);
    }

    #[test]
    fn test_sequence_batches_rejects_bad_counts() {
        let mut core = test_core();
        let err = core
            .sequence_batches(&ctx(sequencer_addr(), 1_000), &[], coinbase())
            .unwrap_err();
        assert_eq!(err, SequencingError::SequenceZeroBatches);

        let too_many: Vec<_> = (0..=MAX_VERIFY_BATCHES).map(|_| batch(1_000, 1)).collect();
        let err = core
            .sequence_batches(&ctx(sequencer_addr(), 1_000), &too_many, coinbase())
            .unwrap_err();
        assert_eq!(
            err,
            SequencingError::ExceedMaxVerifyBatches(MAX_VERIFY_BATCHES + 1, MAX_VERIFY_BATCHES)
        );
    }

    #[test]
    fn test_sequence_batches_timestamp_window() {
        let mut core = test_core();
        sequence(&mut core, 1_000, 1);

        // Below the previous batch timestamp.
        let err = core
            .sequence_batches(&ctx(sequencer_addr(), 2_000), &[batch(999, 1)], coinbase())
            .unwrap_err();
        assert_eq!(err, SequencingError::SequencedTimestampInvalid(999, 1_000, 2_000));

        // Ahead of host time.
        let err = core
            .sequence_batches(&ctx(sequencer_addr(), 2_000), &[batch(2_001, 1)], coinbase())
            .unwrap_err();
        assert_eq!(
            err,
            SequencingError::SequencedTimestampInvalid(2_001, 1_000, 2_000)
        );
    }

    #[test]
    fn test_sequence_batches_payload_size_boundary() {
        let mut core = test_core();
        let mut b = batch(1_000, 1);
        b.transactions = vec![0; MAX_TRANSACTIONS_BYTE_LENGTH];
        core.sequence_batches(&ctx(sequencer_addr(), 1_000), &[b.clone()], coinbase())
            .expect("at the limit");

        b.transactions = vec![0; MAX_TRANSACTIONS_BYTE_LENGTH + 1];
        b.timestamp = 1_001;
        let err = core
            .sequence_batches(&ctx(sequencer_addr(), 1_001), &[b], coinbase())
            .unwrap_err();
        assert_eq!(
            err,
            SequencingError::TransactionsLengthAboveMax(
                MAX_TRANSACTIONS_BYTE_LENGTH + 1,
                MAX_TRANSACTIONS_BYTE_LENGTH
            )
        );
    }

    #[test]
    fn test_force_batch_queues_commitment_and_charges_fee() {
        let mut core = test_core();
        let pos = core
            .force_batch(&ctx(other_addr(), 1_000), vec![0xaa; 16], INITIAL_BATCH_FEE)
            .expect("force");
        assert_eq!(pos, 1);
        assert_eq!(core.state().last_force_batch(), 1);
        assert_eq!(core.token.balance_of(&other_addr()), funds() - INITIAL_BATCH_FEE);

        let expected = compute_forced_batch_commitment(
            &hash::keccak(&[0xaa; 16]),
            &Buf32::zero(),
            1_000,
        );
        assert_eq!(core.state().forced_batch_commitment(1), Some(&expected));

        let err = core
            .force_batch(&ctx(other_addr(), 1_000), vec![0xaa; 16], U256::ZERO)
            .unwrap_err();
        assert_eq!(
            err,
            SequencingError::NotEnoughTokenAmount(U256::ZERO, INITIAL_BATCH_FEE)
        );
    }

    #[test]
    fn test_trusted_sequencer_includes_forced_batch() {
        let mut core = test_core();
        core.force_batch(&ctx(other_addr(), 1_000), vec![0xaa; 16], INITIAL_BATCH_FEE)
            .expect("force");

        let include = BatchData {
            transactions: vec![0xaa; 16],
            global_exit_root: Buf32::zero(),
            timestamp: 2_000,
            min_forced_timestamp: 1_000,
        };
        let fee_before = core.token.balance_of(&sequencer_addr());
        let tip = core
            .sequence_batches(&ctx(sequencer_addr(), 2_000), &[include], coinbase())
            .expect("include forced");
        assert_eq!(tip, 1);
        assert_eq!(core.state().last_force_batch_sequenced(), 1);
        // The forced batch already paid; the sequencer owes nothing.
        assert_eq!(core.token.balance_of(&sequencer_addr()), fee_before);
    }

    #[test]
    fn test_forced_inclusion_rejects_mismatched_data() {
        let mut core = test_core();
        core.force_batch(&ctx(other_addr(), 1_000), vec![0xaa; 16], INITIAL_BATCH_FEE)
            .expect("force");

        let include = BatchData {
            transactions: vec![0xbb; 16],
            global_exit_root: Buf32::zero(),
            timestamp: 2_000,
            min_forced_timestamp: 1_000,
        };
        let err = core
            .sequence_batches(&ctx(sequencer_addr(), 2_000), &[include], coinbase())
            .unwrap_err();
        assert_eq!(err, SequencingError::ForcedDataDoesNotMatch(1));

        // Claiming a forced slot with an empty queue overflows it.
        let include = BatchData {
            transactions: vec![0xaa; 16],
            global_exit_root: Buf32::zero(),
            timestamp: 2_000,
            min_forced_timestamp: 1_000,
        };
        core.sequence_batches(&ctx(sequencer_addr(), 2_000), &[include.clone()], coinbase())
            .expect("include forced");
        let err = core
            .sequence_batches(&ctx(sequencer_addr(), 2_001), &[include], coinbase())
            .unwrap_err();
        assert_eq!(err, SequencingError::ForceBatchesOverflow(2, 1));
    }

    #[test]
    fn test_sequence_force_batches_after_timeout() {
        let mut core = test_core();
        core.force_batch(&ctx(other_addr(), 1_000), vec![0xaa; 16], INITIAL_BATCH_FEE)
            .expect("force");

        let forced = ForcedBatchData {
            transactions: vec![0xaa; 16],
            global_exit_root: Buf32::zero(),
            min_forced_timestamp: 1_000,
        };
        let timeout = core.state().force_batch_timeout();

        let err = core
            .sequence_force_batches(&ctx(other_addr(), 1_000 + timeout - 1), &[forced.clone()])
            .unwrap_err();
        assert_eq!(err, SequencingError::ForceBatchTimeoutNotExpired(1));

        let tip = core
            .sequence_force_batches(&ctx(other_addr(), 1_000 + timeout), &[forced])
            .expect("forced sequencing");
        assert_eq!(tip, 1);
        assert_eq!(core.state().last_force_batch_sequenced(), 1);

        let entry = core.state().sequenced_batch(1).expect("ledger entry");
        assert_eq!(entry.sequenced_at(), 1_000 + timeout);
    }

    #[test]
    fn test_sequence_force_batches_rejects_unqueued() {
        let mut core = test_core();
        let forced = ForcedBatchData {
            transactions: vec![0xaa; 16],
            global_exit_root: Buf32::zero(),
            min_forced_timestamp: 1_000,
        };
        let err = core
            .sequence_force_batches(&ctx(other_addr(), 10_000), &[forced])
            .unwrap_err();
        assert_eq!(err, SequencingError::ForceBatchesOverflow(1, 0));
    }
}
