//! Adaptive batch-fee controller.
//!
//! After every permissionless verification the fee reacts to how long the
//! just-verified batches sat unverified: batches proven later than the
//! latency target push the fee up by the configured multiplier per batch,
//! batches proven on time pull it down by the inverse factor.  Movement is
//! capped per update and the result is clamped to the protocol bounds.

use alloy_primitives::U256;
use tracing::*;
use zkrollup_primitives::constants::{
    BATCH_FEE_BASE, MAX_BATCH_FEE, MAX_BATCH_MULTIPLIER, MIN_BATCH_FEE,
};

use crate::traits::{BatchCommitmentBinding, BridgeCtl, ExitRootManager, ProofVerifier, StakeToken};
use crate::RollupCore;

/// Fixed-point scale for the downward fee division, 18 decimals.
const FEE_SCALE: U256 = U256::from_limbs([0x0de0b6b3a7640000, 0, 0, 0]);

impl<T, V, G, B, C> RollupCore<T, V, G, B, C>
where
    T: StakeToken,
    V: ProofVerifier,
    G: ExitRootManager,
    B: BridgeCtl,
    C: BatchCommitmentBinding,
{
    /// Reprices the batch fee after a verification that advanced the
    /// verified tip to `new_last_verified_batch`.
    ///
    /// Walks the sequencing-event ledger backwards through the newly
    /// verified span, splitting it into batches sequenced before and after
    /// the latency cutoff.  The back-links let the walk jump one sequencing
    /// event at a time instead of one batch at a time.
    pub(crate) fn update_batch_fee(&mut self, now: u64, new_last_verified_batch: u64) {
        let baseline = self.get_last_verified_batch();
        let new_batches_verified = new_last_verified_batch - baseline;

        // Entries sequenced at or before this cutoff waited longer than the
        // target for their proof.
        let target_timestamp = now.saturating_sub(self.state.verify_batch_time_target());

        let mut total_batches_above_target: u64 = 0;
        let mut current_batch = new_last_verified_batch;
        while current_batch > baseline {
            let Some(entry) = self.state.sequenced_batch(current_batch) else {
                break;
            };
            if target_timestamp < entry.sequenced_at() {
                // Sequenced inside the target window: verified on time,
                // keep walking back.
                current_batch = entry.prev_batch_sequenced();
            } else {
                // This event and everything older waited past the target.
                total_batches_above_target = current_batch - baseline;
                break;
            }
        }
        let total_batches_below_target = new_batches_verified - total_batches_above_target;

        let multiplier = U256::from(self.state.multiplier_batch_fee());
        let base = U256::from(BATCH_FEE_BASE);

        let new_fee = if total_batches_below_target < total_batches_above_target {
            let diff = (total_batches_above_target - total_batches_below_target)
                .min(MAX_BATCH_MULTIPLIER as u64) as usize;
            self.state.batch_fee() * multiplier.pow(U256::from(diff))
                / base.pow(U256::from(diff))
        } else {
            let diff = (total_batches_below_target - total_batches_above_target)
                .min(MAX_BATCH_MULTIPLIER as u64) as usize;
            // Divide by multiplier^diff / base^diff at fixed-point scale so
            // the intermediate division keeps its precision.
            let accumulated_divisor =
                FEE_SCALE * multiplier.pow(U256::from(diff)) / base.pow(U256::from(diff));
            FEE_SCALE * self.state.batch_fee() / accumulated_divisor
        };

        let clamped = new_fee.clamp(MIN_BATCH_FEE, MAX_BATCH_FEE);
        if clamped != self.state.batch_fee() {
            debug!(fee = %clamped, above = %total_batches_above_target, below = %total_batches_below_target, "updated batch fee");
        }
        self.state.set_batch_fee(clamped);
    }
}
