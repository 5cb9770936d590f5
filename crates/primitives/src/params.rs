//! Global protocol parameters for the rollup settlement core.

use crate::buf::{Buf20, Buf32};

/// Consensus parameters that don't change for the lifetime of the network
/// (unless there's some weird hard fork).  These are baked into the SNARK
/// public input, so changing them invalidates every outstanding proof.
#[derive(Clone, Debug)]
pub struct RollupParams {
    /// Chain id of the L2 network.
    pub chain_id: u64,

    /// Fork id the prover circuit was built for.
    pub fork_id: u64,

    /// State root the chain starts from, installed for batch 0.
    pub genesis_state_root: Buf32,
}

/// Operator roles and tunables that seed the state store at genesis and can
/// be retuned by the admin afterwards.  These don't have to be pre-agreed
/// across the network.
#[derive(Clone, Debug)]
pub struct OperatorConfig {
    /// Identity allowed to sequence batches on the fast path.
    pub trusted_sequencer: Buf20,

    /// Identity allowed to verify without the timeout gate.
    pub trusted_aggregator: Buf20,

    /// Identity allowed to retune roles and timeouts.
    pub admin: Buf20,

    /// Seconds the permissionless verification path must wait after
    /// sequencing before it may prove a batch.
    pub trusted_aggregator_timeout: u64,

    /// Seconds an optimistically accepted state sits pending before it can
    /// consolidate.  Zero disables the pending detour entirely.
    pub pending_state_timeout: u64,

    /// Seconds after which a queued forced batch can be sequenced by anyone.
    pub force_batch_timeout: u64,

    /// Verification latency the fee controller steers toward, in seconds.
    pub verify_batch_time_target: u64,

    /// Fee multiplier in 3-decimal fixed point, `1000` meaning 1.0x.
    pub multiplier_batch_fee: u16,
}

/// Combined set of parameters across the whole settlement core.
#[derive(Clone, Debug)]
pub struct Params {
    pub rollup: RollupParams,
    pub operator: OperatorConfig,
}

impl Params {
    pub fn rollup(&self) -> &RollupParams {
        &self.rollup
    }

    pub fn operator(&self) -> &OperatorConfig {
        &self.operator
    }
}
