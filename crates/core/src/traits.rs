//! Capability traits for the external collaborators the core consumes.
//!
//! The bridge, the exit-root manager, the SNARK verifier and the staking
//! token are separate deployments; the core only sees these narrow
//! surfaces.  Mock implementations live in the crate's test fixtures.

use alloy_primitives::U256;
use zkrollup_primitives::buf::{Buf20, Buf32};
use zkrollup_primitives::proof::Groth16Proof;

use crate::errors::TokenError;

/// The staking token, seen from the core's fee pool.  Collected sequencing
/// fees accumulate in the pool and aggregator rewards are paid out of it.
pub trait StakeToken {
    /// Pays `amount` out of the pool to `to`.  Failure aborts the
    /// enclosing call.
    fn transfer(&mut self, to: &Buf20, amount: U256) -> Result<(), TokenError>;

    /// Pulls `amount` from `from` into the pool.  The real token requires
    /// a prior approval; failure aborts the enclosing call.
    fn transfer_from(&mut self, from: &Buf20, amount: U256) -> Result<(), TokenError>;

    /// Pool balance available for rewards.
    fn pool_balance(&self) -> U256;
}

/// The zk-SNARK verifier.  Pure, no state mutation.
pub trait ProofVerifier {
    fn verify_proof(&self, proof: &Groth16Proof, public_inputs: &[U256; 1]) -> bool;
}

/// The global exit root manager.  `update_exit_root` is a one-way
/// notification that must be synchronous whenever state consolidates.
pub trait ExitRootManager {
    fn last_global_exit_root(&self) -> Buf32;

    fn update_exit_root(&mut self, new_root: Buf32);
}

/// The bridge's emergency toggle, driven in lockstep with the core's own
/// emergency flag.
pub trait BridgeCtl {
    fn activate_emergency_state(&mut self);

    fn deactivate_emergency_state(&mut self);
}

/// Binding of the accumulator chain against an external batch-data
/// commitment.  The binding rule is not settled yet, so it's pluggable;
/// the sequencing path consults it after extending the chain.
pub trait BatchCommitmentBinding {
    fn check_commitment(&self, batch_num: u64, acc_input_hash: &Buf32) -> bool;
}

/// Default binding that accepts everything.
#[derive(Clone, Debug, Default)]
pub struct AcceptAllBindings;

impl BatchCommitmentBinding for AcceptAllBindings {
    fn check_commitment(&self, _batch_num: u64, _acc_input_hash: &Buf32) -> bool {
        true
    }
}
