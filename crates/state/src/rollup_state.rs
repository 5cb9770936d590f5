//! The settlement core's whole mutable state: the sequenced-batch ledger,
//! the forced-batch queue, the pending-state queue, the finalized state
//! root table and every protocol scalar.  Operations in the core crate
//! receive this by handle; there are no hidden globals.

use std::collections::BTreeMap;

use alloy_primitives::U256;
use serde::{Deserialize, Serialize};
use zkrollup_primitives::buf::{Buf20, Buf32};
use zkrollup_primitives::constants::INITIAL_BATCH_FEE;
use zkrollup_primitives::params::Params;

use crate::batch::SequencedBatch;
use crate::pending::PendingState;

/// Process-wide protocol state.  Ordering invariants maintained by the
/// mutators here:
///
/// * `last_verified_batch <= last_batch_sequenced`
/// * `last_pending_state_consolidated <= last_pending_state`
/// * `last_force_batch_sequenced <= last_force_batch`
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct RollupState {
    /// One entry per sequencing event, keyed by the new tip batch number.
    sequenced_batches: BTreeMap<u64, SequencedBatch>,

    /// Queued forced-batch commitments, keyed from 1.
    forced_batches: BTreeMap<u64, Buf32>,

    /// Optimistic transitions awaiting their timeout, keyed from 1.
    /// Entries below `last_pending_state_consolidated` are spent but kept;
    /// the whole map resets whenever a trusted verification consolidates
    /// directly.
    pending_states: BTreeMap<u64, PendingState>,

    /// Finalized state roots by verified batch number.  Append-only except
    /// for the override/non-determinism recovery paths.
    batch_num_to_state_root: BTreeMap<u64, Buf32>,

    last_batch_sequenced: u64,
    last_timestamp: u64,
    last_verified_batch: u64,
    last_pending_state: u64,
    last_pending_state_consolidated: u64,
    last_force_batch: u64,
    last_force_batch_sequenced: u64,

    /// Current per-batch sequencing fee in wei of the staking token.
    batch_fee: U256,

    // Operator roles and tunables, admin-settable after genesis.
    trusted_sequencer: Buf20,
    trusted_aggregator: Buf20,
    admin: Buf20,
    trusted_aggregator_timeout: u64,
    pending_state_timeout: u64,
    force_batch_timeout: u64,
    verify_batch_time_target: u64,
    multiplier_batch_fee: u16,
}

impl RollupState {
    /// Creates the genesis state from the network parameters, installing
    /// the genesis state root for batch 0.
    pub fn from_genesis_params(params: &Params) -> Self {
        let op = params.operator();
        let mut batch_num_to_state_root = BTreeMap::new();
        batch_num_to_state_root.insert(0, params.rollup().genesis_state_root);

        Self {
            sequenced_batches: BTreeMap::new(),
            forced_batches: BTreeMap::new(),
            pending_states: BTreeMap::new(),
            batch_num_to_state_root,
            last_batch_sequenced: 0,
            last_timestamp: 0,
            last_verified_batch: 0,
            last_pending_state: 0,
            last_pending_state_consolidated: 0,
            last_force_batch: 0,
            last_force_batch_sequenced: 0,
            batch_fee: INITIAL_BATCH_FEE,
            trusted_sequencer: op.trusted_sequencer,
            trusted_aggregator: op.trusted_aggregator,
            admin: op.admin,
            trusted_aggregator_timeout: op.trusted_aggregator_timeout,
            pending_state_timeout: op.pending_state_timeout,
            force_batch_timeout: op.force_batch_timeout,
            verify_batch_time_target: op.verify_batch_time_target,
            multiplier_batch_fee: op.multiplier_batch_fee,
        }
    }

    // Ledger accessors.

    pub fn last_batch_sequenced(&self) -> u64 {
        self.last_batch_sequenced
    }

    pub fn last_timestamp(&self) -> u64 {
        self.last_timestamp
    }

    pub fn last_verified_batch(&self) -> u64 {
        self.last_verified_batch
    }

    pub fn last_pending_state(&self) -> u64 {
        self.last_pending_state
    }

    pub fn last_pending_state_consolidated(&self) -> u64 {
        self.last_pending_state_consolidated
    }

    pub fn last_force_batch(&self) -> u64 {
        self.last_force_batch
    }

    pub fn last_force_batch_sequenced(&self) -> u64 {
        self.last_force_batch_sequenced
    }

    pub fn batch_fee(&self) -> U256 {
        self.batch_fee
    }

    pub fn sequenced_batch(&self, batch_num: u64) -> Option<&SequencedBatch> {
        self.sequenced_batches.get(&batch_num)
    }

    /// Accumulator hash for a batch number.  Batch 0 is the empty chain
    /// and always resolves to the zero hash.
    pub fn acc_input_hash(&self, batch_num: u64) -> Option<Buf32> {
        if batch_num == 0 {
            return Some(Buf32::zero());
        }
        self.sequenced_batches
            .get(&batch_num)
            .map(|sb| *sb.acc_input_hash())
    }

    /// Accumulator hash at the current chain tip.
    pub fn tip_acc_input_hash(&self) -> Buf32 {
        self.acc_input_hash(self.last_batch_sequenced)
            .expect("state: missing ledger entry for tip")
    }

    pub fn forced_batch_commitment(&self, force_batch_num: u64) -> Option<&Buf32> {
        self.forced_batches.get(&force_batch_num)
    }

    pub fn pending_state(&self, pending_state_num: u64) -> Option<&PendingState> {
        self.pending_states.get(&pending_state_num)
    }

    pub fn state_root_of(&self, batch_num: u64) -> Option<&Buf32> {
        self.batch_num_to_state_root.get(&batch_num)
    }

    /// Whether any pending state exists that hasn't consolidated yet.
    pub fn has_unconsolidated_pending_state(&self) -> bool {
        self.last_pending_state > 0
            && self.last_pending_state_consolidated < self.last_pending_state
    }

    // Operator config accessors.

    pub fn trusted_sequencer(&self) -> &Buf20 {
        &self.trusted_sequencer
    }

    pub fn trusted_aggregator(&self) -> &Buf20 {
        &self.trusted_aggregator
    }

    pub fn admin(&self) -> &Buf20 {
        &self.admin
    }

    pub fn trusted_aggregator_timeout(&self) -> u64 {
        self.trusted_aggregator_timeout
    }

    pub fn pending_state_timeout(&self) -> u64 {
        self.pending_state_timeout
    }

    pub fn force_batch_timeout(&self) -> u64 {
        self.force_batch_timeout
    }

    pub fn verify_batch_time_target(&self) -> u64 {
        self.verify_batch_time_target
    }

    pub fn multiplier_batch_fee(&self) -> u16 {
        self.multiplier_batch_fee
    }

    // Semantic mutators.  These keep the ordering invariants; callers in
    // the core crate do all protocol validation first.

    /// Records a sequencing event that advanced the tip to `new_tip`.
    pub fn append_sequencing_event(&mut self, new_tip: u64, entry: SequencedBatch, timestamp: u64) {
        debug_assert!(new_tip > self.last_batch_sequenced);
        debug_assert_eq!(entry.prev_batch_sequenced(), self.last_batch_sequenced);

        self.sequenced_batches.insert(new_tip, entry);
        self.last_batch_sequenced = new_tip;
        self.last_timestamp = timestamp;
    }

    /// Queues a forced-batch commitment, returning its queue position.
    pub fn push_forced_batch(&mut self, commitment: Buf32) -> u64 {
        self.last_force_batch += 1;
        self.forced_batches.insert(self.last_force_batch, commitment);
        self.last_force_batch
    }

    /// Marks forced batches up to `new_last` as sequenced.
    pub fn set_last_force_batch_sequenced(&mut self, new_last: u64) {
        debug_assert!(new_last >= self.last_force_batch_sequenced);
        debug_assert!(new_last <= self.last_force_batch);
        self.last_force_batch_sequenced = new_last;
    }

    /// Appends an optimistic transition, returning its pending-state index.
    pub fn push_pending_state(&mut self, ps: PendingState) -> u64 {
        self.last_pending_state += 1;
        self.pending_states.insert(self.last_pending_state, ps);
        self.last_pending_state
    }

    /// Marks pending states up to `pending_state_num` as consolidated.
    pub fn set_last_pending_state_consolidated(&mut self, pending_state_num: u64) {
        debug_assert!(pending_state_num <= self.last_pending_state);
        self.last_pending_state_consolidated = pending_state_num;
    }

    /// Wipes the pending queue entirely.  Used when a trusted verification
    /// or an override consolidates state directly.
    pub fn reset_pending_states(&mut self) {
        self.pending_states.clear();
        self.last_pending_state = 0;
        self.last_pending_state_consolidated = 0;
    }

    /// Finalizes a state root for a batch number and advances the verified
    /// tip.  The verified tip never moves backwards.
    pub fn finalize_state_root(&mut self, batch_num: u64, state_root: Buf32) {
        debug_assert!(batch_num >= self.last_verified_batch);
        debug_assert!(batch_num <= self.last_batch_sequenced);

        self.last_verified_batch = batch_num;
        self.batch_num_to_state_root.insert(batch_num, state_root);
    }

    pub fn set_batch_fee(&mut self, fee: U256) {
        self.batch_fee = fee;
    }

    pub fn set_trusted_sequencer(&mut self, who: Buf20) {
        self.trusted_sequencer = who;
    }

    pub fn set_trusted_aggregator(&mut self, who: Buf20) {
        self.trusted_aggregator = who;
    }

    pub fn set_admin(&mut self, who: Buf20) {
        self.admin = who;
    }

    pub fn set_trusted_aggregator_timeout(&mut self, secs: u64) {
        self.trusted_aggregator_timeout = secs;
    }

    pub fn set_pending_state_timeout(&mut self, secs: u64) {
        self.pending_state_timeout = secs;
    }

    pub fn set_force_batch_timeout(&mut self, secs: u64) {
        self.force_batch_timeout = secs;
    }

    pub fn set_verify_batch_time_target(&mut self, secs: u64) {
        self.verify_batch_time_target = secs;
    }

    pub fn set_multiplier_batch_fee(&mut self, multiplier: u16) {
        self.multiplier_batch_fee = multiplier;
    }
}
