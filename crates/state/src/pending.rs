//! Optimistically accepted state transitions awaiting their timeout.

use arbitrary::Arbitrary;
use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use zkrollup_primitives::buf::Buf32;

/// A state transition that has a valid proof but has not finalized yet.
/// Sits in the pending queue until its timeout elapses, unless a trusted
/// aggregator consolidates directly and wipes the queue.
#[derive(
    Clone, Debug, Eq, PartialEq, Arbitrary, BorshDeserialize, BorshSerialize, Deserialize, Serialize,
)]
pub struct PendingState {
    /// Host-ledger time the proof was accepted at.
    timestamp: u64,

    /// Batch this transition verifies up to.
    last_verified_batch: u64,

    /// Local exit root the transition commits to.
    exit_root: Buf32,

    /// State root the transition commits to.
    state_root: Buf32,
}

impl PendingState {
    pub fn new(timestamp: u64, last_verified_batch: u64, exit_root: Buf32, state_root: Buf32) -> Self {
        Self {
            timestamp,
            last_verified_batch,
            exit_root,
            state_root,
        }
    }

    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    pub fn last_verified_batch(&self) -> u64 {
        self.last_verified_batch
    }

    pub fn exit_root(&self) -> &Buf32 {
        &self.exit_root
    }

    pub fn state_root(&self) -> &Buf32 {
        &self.state_root
    }

    /// Whether the timeout has elapsed as of `now`.  Exactly at the
    /// threshold counts as consolidable.
    pub fn is_consolidable(&self, now: u64, pending_state_timeout: u64) -> bool {
        self.timestamp + pending_state_timeout <= now
    }
}
