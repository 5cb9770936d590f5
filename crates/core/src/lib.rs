//! Batch sequencing and zk-proof verification state machine for the
//! rollup settlement core.
//!
//! The core tracks an append-only ledger of sequenced batches and their
//! chained input hash, verifies SNARK proofs over batch ranges, and moves
//! verified state through a two-tier finality model: proofs from the
//! trusted aggregator consolidate immediately, permissionless proofs sit
//! in a pending queue until a timeout elapses.  An adaptive fee reacts to
//! verification latency, and a soundness controller can halt everything
//! when two valid proofs disagree.
//!
//! External collaborators (staking token, SNARK verifier, exit-root
//! manager, bridge) are consumed through the capability traits in
//! [`traits`]; all state is owned here and handed around explicitly.

pub mod admin;
pub mod context;
pub mod emergency;
pub mod errors;
pub mod fee;
pub mod sequencer;
pub mod soundness;
pub mod traits;
pub mod verification;

#[cfg(test)]
pub(crate) mod testing;

use alloy_primitives::U256;
use zkrollup_primitives::params::Params;
use zkrollup_state::rollup_state::RollupState;

use crate::emergency::EmergencyState;
use crate::traits::{
    AcceptAllBindings, BatchCommitmentBinding, BridgeCtl, ExitRootManager, ProofVerifier,
    StakeToken,
};

/// The rollup settlement state machine.  Owns the whole protocol state and
/// the handles to the external collaborators; every public operation takes
/// a [`context::CallContext`] with the caller identity and host time.
#[derive(Debug)]
pub struct RollupCore<T, V, G, B, C = AcceptAllBindings> {
    params: Params,
    state: RollupState,
    emergency: EmergencyState,
    token: T,
    verifier: V,
    exit_roots: G,
    bridge: B,
    binding: C,
}

impl<T, V, G, B> RollupCore<T, V, G, B>
where
    T: StakeToken,
    V: ProofVerifier,
    G: ExitRootManager,
    B: BridgeCtl,
{
    /// Creates the core at genesis with the default accept-all commitment
    /// binding.
    pub fn new(params: Params, token: T, verifier: V, exit_roots: G, bridge: B) -> Self {
        Self::with_commitment_binding(params, token, verifier, exit_roots, bridge, AcceptAllBindings)
    }
}

impl<T, V, G, B, C> RollupCore<T, V, G, B, C>
where
    T: StakeToken,
    V: ProofVerifier,
    G: ExitRootManager,
    B: BridgeCtl,
    C: BatchCommitmentBinding,
{
    pub fn with_commitment_binding(
        params: Params,
        token: T,
        verifier: V,
        exit_roots: G,
        bridge: B,
        binding: C,
    ) -> Self {
        let state = RollupState::from_genesis_params(&params);
        Self {
            params,
            state,
            emergency: EmergencyState::new(),
            token,
            verifier,
            exit_roots,
            bridge,
            binding,
        }
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn state(&self) -> &RollupState {
        &self.state
    }

    pub fn is_emergency_state(&self) -> bool {
        self.emergency.is_active()
    }

    /// The last verified batch as external callers see it: if an
    /// unconsolidated pending state exists, its batch number wins over the
    /// consolidated tip.
    pub fn get_last_verified_batch(&self) -> u64 {
        let lps = self.state.last_pending_state();
        if lps > 0 {
            self.state
                .pending_state(lps)
                .map(|ps| ps.last_verified_batch())
                .unwrap_or_else(|| self.state.last_verified_batch())
        } else {
            self.state.last_verified_batch()
        }
    }

    /// Current per-batch sequencing fee.
    pub fn get_current_batch_fee(&self) -> U256 {
        self.state.batch_fee()
    }

    /// Reward paid per newly verified batch: the fee pool divided by every
    /// batch still awaiting verification (sequenced or force-queued).
    /// Zero when nothing is outstanding, so rewards can never
    /// over-distribute the pool.
    pub fn calculate_reward_per_batch(&self) -> U256 {
        let outstanding = (self.state.last_force_batch() - self.state.last_force_batch_sequenced())
            + self.state.last_batch_sequenced()
            - self.get_last_verified_batch();
        if outstanding == 0 {
            return U256::ZERO;
        }
        self.token.pool_balance() / U256::from(outstanding)
    }

    /// Whether pending state `pending_state_num` has outlived the pending
    /// state timeout as of `now`.  False for nonexistent entries.
    pub fn is_pending_state_consolidable(&self, now: u64, pending_state_num: u64) -> bool {
        self.state
            .pending_state(pending_state_num)
            .map(|ps| ps.is_consolidable(now, self.state.pending_state_timeout()))
            .unwrap_or(false)
    }
}
