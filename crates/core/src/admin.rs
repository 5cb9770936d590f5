//! Admin surface: role rotation and protocol tunables.
//!
//! Timeouts may only ratchet downwards while the system is live; raising
//! them is reserved for emergency recovery.  All setters are gated on the
//! admin role.

use tracing::*;
use zkrollup_primitives::buf::Buf20;
use zkrollup_primitives::constants::{HALT_AGGREGATION_TIMEOUT, MAX_VERIFY_BATCH_TIME_TARGET};

use crate::context::CallContext;
use crate::errors::AdminError;
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
    fn ensure_admin(&self, ctx: &CallContext) -> Result<(), AdminError> {
        if ctx.caller() != self.state.admin() {
            return Err(AdminError::OnlyAdmin);
        }
        Ok(())
    }

    pub fn set_trusted_sequencer(
        &mut self,
        ctx: &CallContext,
        who: Buf20,
    ) -> Result<(), AdminError> {
        self.ensure_admin(ctx)?;
        info!(?who, "rotated trusted sequencer");
        self.state.set_trusted_sequencer(who);
        Ok(())
    }

    pub fn set_trusted_aggregator(
        &mut self,
        ctx: &CallContext,
        who: Buf20,
    ) -> Result<(), AdminError> {
        self.ensure_admin(ctx)?;
        info!(?who, "rotated trusted aggregator");
        self.state.set_trusted_aggregator(who);
        Ok(())
    }

    pub fn set_admin(&mut self, ctx: &CallContext, who: Buf20) -> Result<(), AdminError> {
        self.ensure_admin(ctx)?;
        info!(?who, "rotated admin");
        self.state.set_admin(who);
        Ok(())
    }

    pub fn set_trusted_aggregator_timeout(
        &mut self,
        ctx: &CallContext,
        secs: u64,
    ) -> Result<(), AdminError> {
        self.ensure_admin(ctx)?;
        if secs > HALT_AGGREGATION_TIMEOUT {
            return Err(AdminError::TrustedAggregatorTimeoutAboveMax(
                secs,
                HALT_AGGREGATION_TIMEOUT,
            ));
        }
        if !self.is_emergency_state() && secs >= self.state.trusted_aggregator_timeout() {
            return Err(AdminError::NewTrustedAggregatorTimeoutMustBeLower(
                secs,
                self.state.trusted_aggregator_timeout(),
            ));
        }
        self.state.set_trusted_aggregator_timeout(secs);
        Ok(())
    }

    pub fn set_pending_state_timeout(
        &mut self,
        ctx: &CallContext,
        secs: u64,
    ) -> Result<(), AdminError> {
        self.ensure_admin(ctx)?;
        if secs > HALT_AGGREGATION_TIMEOUT {
            return Err(AdminError::PendingStateTimeoutAboveMax(
                secs,
                HALT_AGGREGATION_TIMEOUT,
            ));
        }
        if !self.is_emergency_state() && secs >= self.state.pending_state_timeout() {
            return Err(AdminError::NewPendingStateTimeoutMustBeLower(
                secs,
                self.state.pending_state_timeout(),
            ));
        }
        self.state.set_pending_state_timeout(secs);
        Ok(())
    }

    pub fn set_force_batch_timeout(
        &mut self,
        ctx: &CallContext,
        secs: u64,
    ) -> Result<(), AdminError> {
        self.ensure_admin(ctx)?;
        if secs > HALT_AGGREGATION_TIMEOUT {
            return Err(AdminError::ForceBatchTimeoutAboveMax(
                secs,
                HALT_AGGREGATION_TIMEOUT,
            ));
        }
        if !self.is_emergency_state() && secs >= self.state.force_batch_timeout() {
            return Err(AdminError::NewForceBatchTimeoutMustBeLower(
                secs,
                self.state.force_batch_timeout(),
            ));
        }
        self.state.set_force_batch_timeout(secs);
        Ok(())
    }

    /// Fee multiplier in thousandths, bounded to at most 2.3% growth per
    /// late batch.
    pub fn set_multiplier_batch_fee(
        &mut self,
        ctx: &CallContext,
        multiplier: u16,
    ) -> Result<(), AdminError> {
        self.ensure_admin(ctx)?;
        if !(1000..=1023).contains(&multiplier) {
            return Err(AdminError::InvalidRangeMultiplierBatchFee(multiplier));
        }
        self.state.set_multiplier_batch_fee(multiplier);
        Ok(())
    }

    pub fn set_verify_batch_time_target(
        &mut self,
        ctx: &CallContext,
        secs: u64,
    ) -> Result<(), AdminError> {
        self.ensure_admin(ctx)?;
        if secs > MAX_VERIFY_BATCH_TIME_TARGET {
            return Err(AdminError::InvalidRangeBatchTimeTarget(
                secs,
                MAX_VERIFY_BATCH_TIME_TARGET,
            ));
        }
        self.state.set_verify_batch_time_target(secs);
        Ok(())
    }
}
