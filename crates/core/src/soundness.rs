//! Soundness controller: disputing pending states and halting the system.
//!
//! A pending state can be contested by proving the same batch range to a
//! different state root.  The trusted aggregator resolves the dispute by
//! overriding; anyone else escalates it into an emergency halt.  The halt
//! also triggers permissionlessly when a sequenced batch goes unverified
//! past the aggregation halt timeout.

use tracing::*;
use zkrollup_primitives::buf::Buf32;
use zkrollup_primitives::constants::HALT_AGGREGATION_TIMEOUT;
use zkrollup_primitives::proof::Groth16Proof;

use crate::context::CallContext;
use crate::errors::SoundnessError;
use crate::traits::{BatchCommitmentBinding, BridgeCtl, ExitRootManager, ProofVerifier, StakeToken};
use crate::verification::{build_input_snark_bytes, derive_snark_input};
use crate::RollupCore;

impl<T, V, G, B, C> RollupCore<T, V, G, B, C>
where
    T: StakeToken,
    V: ProofVerifier,
    G: ExitRootManager,
    B: BridgeCtl,
    C: BatchCommitmentBinding,
{
    /// Trusted-aggregator resolution of a contested pending state: proves
    /// the range to a different root, replaces the pending queue with the
    /// proven root and ramps the aggregator timeout to the halt bound so
    /// the network degrades safely if the aggregator then goes silent.
    #[allow(clippy::too_many_arguments)]
    pub fn override_pending_state(
        &mut self,
        ctx: &CallContext,
        init_pending_state_num: u64,
        final_pending_state_num: u64,
        init_num_batch: u64,
        final_new_batch: u64,
        new_local_exit_root: Buf32,
        new_state_root: Buf32,
        proof: &Groth16Proof,
    ) -> Result<(), SoundnessError> {
        if ctx.caller() != self.state.trusted_aggregator() {
            return Err(SoundnessError::OnlyTrustedAggregator);
        }

        self.prove_distinct_pending_state(
            ctx,
            init_pending_state_num,
            final_pending_state_num,
            init_num_batch,
            final_new_batch,
            &new_local_exit_root,
            &new_state_root,
            proof,
        )?;

        self.state.finalize_state_root(final_new_batch, new_state_root);
        self.state.reset_pending_states();
        self.state
            .set_trusted_aggregator_timeout(HALT_AGGREGATION_TIMEOUT);
        self.exit_roots.update_exit_root(new_local_exit_root);

        warn!(batch = %final_new_batch, "pending state overridden");
        Ok(())
    }

    /// Permissionless escalation: a valid proof of the same range to a
    /// different root demonstrates the proving system accepted two
    /// contradictory statements, so halt everything.  The consolidated
    /// root table is left untouched for the recovery procedure.
    pub fn prove_non_deterministic_pending_state(
        &mut self,
        ctx: &CallContext,
        init_pending_state_num: u64,
        final_pending_state_num: u64,
        init_num_batch: u64,
        final_new_batch: u64,
        new_local_exit_root: Buf32,
        new_state_root: Buf32,
        proof: &Groth16Proof,
    ) -> Result<(), SoundnessError> {
        if self.is_emergency_state() {
            return Err(SoundnessError::OnlyNotEmergencyState);
        }

        self.prove_distinct_pending_state(
            ctx,
            init_pending_state_num,
            final_pending_state_num,
            init_num_batch,
            final_new_batch,
            &new_local_exit_root,
            &new_state_root,
            proof,
        )?;

        error!(
            pending_state = %final_pending_state_num,
            batch = %final_new_batch,
            "non-deterministic pending state proven, halting"
        );
        self.activate_emergency_state_internal()?;
        Ok(())
    }

    /// Halts sequencing and verification.  The admin may halt at will;
    /// anyone else must point at a sequence end that has sat unverified
    /// past the aggregation halt timeout.
    pub fn activate_emergency_state(
        &mut self,
        ctx: &CallContext,
        sequenced_batch_num: u64,
    ) -> Result<(), SoundnessError> {
        if ctx.caller() != self.state.admin() {
            if sequenced_batch_num <= self.get_last_verified_batch()
                || sequenced_batch_num > self.state.last_batch_sequenced()
            {
                return Err(SoundnessError::BatchNotSequencedOrNotSequenceEnd(
                    sequenced_batch_num,
                ));
            }
            let entry = self
                .state
                .sequenced_batch(sequenced_batch_num)
                .ok_or(SoundnessError::BatchNotSequencedOrNotSequenceEnd(
                    sequenced_batch_num,
                ))?;
            if entry.sequenced_at() + HALT_AGGREGATION_TIMEOUT > ctx.timestamp() {
                return Err(SoundnessError::HaltTimeoutNotExpired(sequenced_batch_num));
            }
        }

        self.activate_emergency_state_internal()?;
        Ok(())
    }

    /// Lifts the halt.  Admin only.
    pub fn deactivate_emergency_state(&mut self, ctx: &CallContext) -> Result<(), SoundnessError> {
        if ctx.caller() != self.state.admin() {
            return Err(SoundnessError::OnlyAdmin);
        }
        self.bridge.deactivate_emergency_state();
        self.emergency.deactivate()?;
        Ok(())
    }

    fn activate_emergency_state_internal(&mut self) -> Result<(), SoundnessError> {
        // The bridge halts with us so withdrawals freeze in the same step.
        self.bridge.activate_emergency_state();
        self.emergency.activate()?;
        Ok(())
    }

    /// Checks that a valid proof exists for the batch range covered by
    /// pending state `final_pending_state_num` landing on a root different
    /// from the one that pending state recorded.  Read-only.
    #[allow(clippy::too_many_arguments)]
    fn prove_distinct_pending_state(
        &self,
        ctx: &CallContext,
        init_pending_state_num: u64,
        final_pending_state_num: u64,
        init_num_batch: u64,
        final_new_batch: u64,
        new_local_exit_root: &Buf32,
        new_state_root: &Buf32,
        proof: &Groth16Proof,
    ) -> Result<(), SoundnessError> {
        let old_state_root = if init_pending_state_num != 0 {
            let ps = self
                .state
                .pending_state(init_pending_state_num)
                .ok_or(SoundnessError::PendingStateDoesNotExist(
                    init_pending_state_num,
                ))?;
            if init_num_batch != ps.last_verified_batch() {
                return Err(SoundnessError::InitNumBatchDoesNotMatchPendingState(
                    init_num_batch,
                    ps.last_verified_batch(),
                ));
            }
            *ps.state_root()
        } else {
            if init_num_batch > self.state.last_verified_batch() {
                return Err(SoundnessError::InitNumBatchAboveLastVerifiedBatch(
                    init_num_batch,
                    self.state.last_verified_batch(),
                ));
            }
            *self
                .state
                .state_root_of(init_num_batch)
                .ok_or(SoundnessError::OldStateRootDoesNotExist(init_num_batch))?
        };

        if final_pending_state_num <= init_pending_state_num
            || final_pending_state_num > self.state.last_pending_state()
        {
            return Err(SoundnessError::FinalPendingStateNumInvalid(
                final_pending_state_num,
                init_pending_state_num,
                self.state.last_pending_state(),
            ));
        }
        let contested = self
            .state
            .pending_state(final_pending_state_num)
            .ok_or(SoundnessError::PendingStateDoesNotExist(
                final_pending_state_num,
            ))?;
        if final_new_batch != contested.last_verified_batch() {
            return Err(SoundnessError::FinalNumBatchDoesNotMatchPendingState(
                final_new_batch,
                contested.last_verified_batch(),
            ));
        }

        let old_acc_input_hash = self
            .state
            .acc_input_hash(init_num_batch)
            .ok_or(SoundnessError::OldAccInputHashDoesNotExist(init_num_batch))?;
        let new_acc_input_hash = self
            .state
            .acc_input_hash(final_new_batch)
            .ok_or(SoundnessError::NewAccInputHashDoesNotExist(final_new_batch))?;

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
            return Err(SoundnessError::InvalidProof);
        }

        if contested.state_root() == new_state_root {
            return Err(SoundnessError::StoredRootMustBeDifferentThanNewRoot);
        }
        Ok(())
    }
}
