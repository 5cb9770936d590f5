//! Proof verification and the two-tier finality state machine.
//!
//! A proof covers a batch range starting either from the consolidated
//! state-root table or from a chosen pending state.  Trusted-aggregator
//! proofs consolidate immediately and wipe the pending queue; anyone else
//! goes through the pending detour (unless the pending-state timeout is
//! disabled) plus a lazy single-probe consolidation of whatever already
//! timed out.

use alloy_primitives::U256;
use tracing::*;
use zkrollup_primitives::buf::{Buf20, Buf32};
use zkrollup_primitives::constants::{MAX_VERIFY_BATCHES, SNARK_INPUT_BYTES_LEN, SNARK_SCALAR_FIELD};
use zkrollup_primitives::hash;
use zkrollup_primitives::proof::Groth16Proof;
use zkrollup_state::pending::PendingState;

use crate::context::CallContext;
use crate::errors::VerificationError;
use crate::traits::{BatchCommitmentBinding, BridgeCtl, ExitRootManager, ProofVerifier, StakeToken};
use crate::RollupCore;

/// Serializes the SNARK public-input preimage.  This byte layout is a wire
/// contract with the prover circuit and must not be altered.
#[allow(clippy::too_many_arguments)]
pub fn build_input_snark_bytes(
    aggregator: &Buf20,
    old_state_root: &Buf32,
    old_acc_input_hash: &Buf32,
    init_num_batch: u64,
    chain_id: u64,
    fork_id: u64,
    new_state_root: &Buf32,
    new_acc_input_hash: &Buf32,
    new_local_exit_root: &Buf32,
    final_new_batch: u64,
) -> Vec<u8> {
    let mut buf = Vec::with_capacity(SNARK_INPUT_BYTES_LEN);
    buf.extend_from_slice(aggregator.as_slice());
    buf.extend_from_slice(old_state_root.as_slice());
    buf.extend_from_slice(old_acc_input_hash.as_slice());
    buf.extend_from_slice(&init_num_batch.to_be_bytes());
    buf.extend_from_slice(&chain_id.to_be_bytes());
    buf.extend_from_slice(&fork_id.to_be_bytes());
    buf.extend_from_slice(new_state_root.as_slice());
    buf.extend_from_slice(new_acc_input_hash.as_slice());
    buf.extend_from_slice(new_local_exit_root.as_slice());
    buf.extend_from_slice(&final_new_batch.to_be_bytes());
    debug_assert_eq!(buf.len(), SNARK_INPUT_BYTES_LEN);
    buf
}

/// Digests the preimage and reduces it into the SNARK scalar field.
pub fn derive_snark_input(snark_bytes: &[u8]) -> U256 {
    let digest = hash::sha256(snark_bytes);
    U256::from_be_bytes::<32>(digest.into()) % SNARK_SCALAR_FIELD
}

impl<T, V, G, B, C> RollupCore<T, V, G, B, C>
where
    T: StakeToken,
    V: ProofVerifier,
    G: ExitRootManager,
    B: BridgeCtl,
    C: BatchCommitmentBinding,
{
    /// Permissionless proof submission, gated by the trusted-aggregator
    /// timeout since the final batch was sequenced.
    pub fn verify_batches(
        &mut self,
        ctx: &CallContext,
        pending_state_num: u64,
        init_num_batch: u64,
        final_new_batch: u64,
        new_local_exit_root: Buf32,
        new_state_root: Buf32,
        proof: &Groth16Proof,
    ) -> Result<(), VerificationError> {
        if self.is_emergency_state() {
            return Err(VerificationError::OnlyNotEmergencyState);
        }

        let final_entry = self
            .state
            .sequenced_batch(final_new_batch)
            .ok_or(VerificationError::NewAccInputHashDoesNotExist(final_new_batch))?;
        if final_entry.sequenced_at() + self.state.trusted_aggregator_timeout() > ctx.timestamp() {
            return Err(VerificationError::TrustedAggregatorTimeoutNotExpired(
                final_new_batch,
            ));
        }

        let range = final_new_batch.saturating_sub(init_num_batch);
        if range > MAX_VERIFY_BATCHES {
            return Err(VerificationError::ExceedMaxVerifyBatches(
                range,
                MAX_VERIFY_BATCHES,
            ));
        }

        self.verify_and_reward(
            ctx,
            pending_state_num,
            init_num_batch,
            final_new_batch,
            &new_local_exit_root,
            &new_state_root,
            proof,
        )?;

        // Fee reacts at proof time, before the result settles either way.
        self.update_batch_fee(ctx.timestamp(), final_new_batch);

        if self.state.pending_state_timeout() == 0 {
            self.state.finalize_state_root(final_new_batch, new_state_root);
            if self.state.last_pending_state() > 0 {
                self.state.reset_pending_states();
            }
            self.exit_roots.update_exit_root(new_local_exit_root);
        } else {
            self.try_consolidate_pending_state(ctx.timestamp());
            let idx = self.state.push_pending_state(PendingState::new(
                ctx.timestamp(),
                final_new_batch,
                new_local_exit_root,
                new_state_root,
            ));
            debug!(pending_state = %idx, "queued pending state");
        }

        info!(
            caller = ?ctx.caller(),
            batch = %final_new_batch,
            "verified batches"
        );
        Ok(())
    }

    /// Trusted-aggregator proof submission: no timeout gate, immediate
    /// consolidation, wipes any outstanding pending state, no fee update.
    pub fn verify_batches_trusted_aggregator(
        &mut self,
        ctx: &CallContext,
        pending_state_num: u64,
        init_num_batch: u64,
        final_new_batch: u64,
        new_local_exit_root: Buf32,
        new_state_root: Buf32,
        proof: &Groth16Proof,
    ) -> Result<(), VerificationError> {
        if ctx.caller() != self.state.trusted_aggregator() {
            return Err(VerificationError::OnlyTrustedAggregator);
        }

        let range = final_new_batch.saturating_sub(init_num_batch);
        if range > MAX_VERIFY_BATCHES {
            return Err(VerificationError::ExceedMaxVerifyBatches(
                range,
                MAX_VERIFY_BATCHES,
            ));
        }

        self.verify_and_reward(
            ctx,
            pending_state_num,
            init_num_batch,
            final_new_batch,
            &new_local_exit_root,
            &new_state_root,
            proof,
        )?;

        self.state.finalize_state_root(final_new_batch, new_state_root);
        self.state.reset_pending_states();
        self.exit_roots.update_exit_root(new_local_exit_root);

        info!(batch = %final_new_batch, "trusted aggregator verified batches");
        Ok(())
    }

    /// Consolidates a specific pending state.  The trusted aggregator may
    /// consolidate ahead of the timeout even under emergency; everyone else
    /// only outside emergency and once the entry is consolidable.
    pub fn consolidate_pending_state(
        &mut self,
        ctx: &CallContext,
        pending_state_num: u64,
    ) -> Result<(), VerificationError> {
        if ctx.caller() != self.state.trusted_aggregator() {
            if self.is_emergency_state() {
                return Err(VerificationError::OnlyNotEmergencyState);
            }
            if !self.is_pending_state_consolidable(ctx.timestamp(), pending_state_num) {
                return Err(VerificationError::PendingStateNotConsolidable(
                    pending_state_num,
                ));
            }
        }
        self.consolidate_pending_state_internal(pending_state_num)
    }

    /// Resolves the starting root, derives the public input, verifies the
    /// proof and pays the caller's reward.  Writes nothing to the ledger.
    #[allow(clippy::too_many_arguments)]
    fn verify_and_reward(
        &mut self,
        ctx: &CallContext,
        pending_state_num: u64,
        init_num_batch: u64,
        final_new_batch: u64,
        new_local_exit_root: &Buf32,
        new_state_root: &Buf32,
        proof: &Groth16Proof,
    ) -> Result<(), VerificationError> {
        let current_last_verified = self.get_last_verified_batch();

        let old_state_root = if pending_state_num != 0 {
            let ps = self
                .state
                .pending_state(pending_state_num)
                .ok_or(VerificationError::PendingStateDoesNotExist(pending_state_num))?;
            if init_num_batch != ps.last_verified_batch() {
                return Err(VerificationError::InitNumBatchDoesNotMatchPendingState(
                    init_num_batch,
                    ps.last_verified_batch(),
                ));
            }
            *ps.state_root()
        } else {
            let root = self
                .state
                .state_root_of(init_num_batch)
                .ok_or(VerificationError::OldStateRootDoesNotExist(init_num_batch))?;
            if init_num_batch > self.state.last_verified_batch() {
                return Err(VerificationError::InitNumBatchAboveLastVerifiedBatch(
                    init_num_batch,
                    self.state.last_verified_batch(),
                ));
            }
            *root
        };

        if final_new_batch <= current_last_verified {
            return Err(VerificationError::FinalNumBatchBelowLastVerifiedBatch(
                final_new_batch,
                current_last_verified,
            ));
        }

        let old_acc_input_hash = self
            .state
            .acc_input_hash(init_num_batch)
            .ok_or(VerificationError::OldAccInputHashDoesNotExist(init_num_batch))?;
        let new_acc_input_hash = self
            .state
            .acc_input_hash(final_new_batch)
            .ok_or(VerificationError::NewAccInputHashDoesNotExist(final_new_batch))?;

        let snark_bytes = build_input_snark_bytes(
            ctx.caller(),
            &old_state_root,
            &old_acc_input_hash,
            init_num_batch,
            self.params.rollup().chain_id,
            self.params.rollup().fork_id,
            new_state_root,
            &new_acc_input_hash,
            new_local_exit_root,
            final_new_batch,
        );
        let input_snark = derive_snark_input(&snark_bytes);

        if !self.verifier.verify_proof(proof, &[input_snark]) {
            return Err(VerificationError::InvalidProof);
        }

        let reward = self.calculate_reward_per_batch()
            * U256::from(final_new_batch - current_last_verified);
        self.token.transfer(ctx.caller(), reward)?;
        Ok(())
    }

    /// Lazy consolidation: if the oldest unconsolidated pending state has
    /// timed out, consolidate either the midpoint between it and the
    /// newest (when that one also timed out) or just the oldest.  At most
    /// one consolidation per invocation.
    pub(crate) fn try_consolidate_pending_state(&mut self, now: u64) {
        if !self.state.has_unconsolidated_pending_state() {
            return;
        }

        let next = self.state.last_pending_state_consolidated() + 1;
        if !self.is_pending_state_consolidable(now, next) {
            return;
        }

        let newest = self.state.last_pending_state();
        let middle = next + (newest - next) / 2;
        let target = if self.is_pending_state_consolidable(now, middle) {
            middle
        } else {
            next
        };

        if let Err(err) = self.consolidate_pending_state_internal(target) {
            // Unreachable given the eligibility checks above.
            warn!(%target, ?err, "lazy pending-state consolidation failed");
        }
    }

    fn consolidate_pending_state_internal(
        &mut self,
        pending_state_num: u64,
    ) -> Result<(), VerificationError> {
        if pending_state_num <= self.state.last_pending_state_consolidated()
            || pending_state_num > self.state.last_pending_state()
        {
            return Err(VerificationError::PendingStateInvalid(
                pending_state_num,
                self.state.last_pending_state_consolidated(),
                self.state.last_pending_state(),
            ));
        }

        let ps = self
            .state
            .pending_state(pending_state_num)
            .ok_or(VerificationError::PendingStateDoesNotExist(pending_state_num))?
            .clone();

        self.state
            .finalize_state_root(ps.last_verified_batch(), *ps.state_root());
        self.state
            .set_last_pending_state_consolidated(pending_state_num);
        self.exit_roots.update_exit_root(*ps.exit_root());

        info!(
            pending_state = %pending_state_num,
            batch = %ps.last_verified_batch(),
            "consolidated pending state"
        );
        Ok(())
    }

    /// Public-input preimage for a batch range, as the prover consumes it.
    pub fn get_input_snark_bytes(
        &self,
        aggregator: &Buf20,
        init_num_batch: u64,
        final_new_batch: u64,
        new_local_exit_root: &Buf32,
        old_state_root: &Buf32,
        new_state_root: &Buf32,
    ) -> Result<Vec<u8>, VerificationError> {
        let old_acc_input_hash = self
            .state
            .acc_input_hash(init_num_batch)
            .ok_or(VerificationError::OldAccInputHashDoesNotExist(init_num_batch))?;
        let new_acc_input_hash = self
            .state
            .acc_input_hash(final_new_batch)
            .ok_or(VerificationError::NewAccInputHashDoesNotExist(final_new_batch))?;

        Ok(build_input_snark_bytes(
            aggregator,
            old_state_root,
            &old_acc_input_hash,
            init_num_batch,
            self.params.rollup().chain_id,
            self.params.rollup().fork_id,
            new_state_root,
            &new_acc_input_hash,
            new_local_exit_root,
            final_new_batch,
        ))
    }
}
