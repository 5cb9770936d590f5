//! Batch wire types and the sequenced-batch ledger entry.

use arbitrary::Arbitrary;
use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use zkrollup_primitives::buf::{Buf20, Buf32};
use zkrollup_primitives::hash;

/// Ledger record written once per sequencing event, keyed by the batch
/// number of the new chain tip.  Immutable once written.
#[derive(
    Clone, Debug, Eq, PartialEq, Arbitrary, BorshDeserialize, BorshSerialize, Deserialize, Serialize,
)]
pub struct SequencedBatch {
    /// Running accumulator over every batch up to and including this one.
    acc_input_hash: Buf32,

    /// Host-ledger time the sequencing event landed at.
    sequenced_at: u64,

    /// Chain tip before this event.  Back-link the fee controller walks,
    /// which is what bounds its loop to sequencing events rather than
    /// individual batches.
    prev_batch_sequenced: u64,
}

impl SequencedBatch {
    pub fn new(acc_input_hash: Buf32, sequenced_at: u64, prev_batch_sequenced: u64) -> Self {
        Self {
            acc_input_hash,
            sequenced_at,
            prev_batch_sequenced,
        }
    }

    pub fn acc_input_hash(&self) -> &Buf32 {
        &self.acc_input_hash
    }

    pub fn sequenced_at(&self) -> u64 {
        self.sequenced_at
    }

    pub fn prev_batch_sequenced(&self) -> u64 {
        self.prev_batch_sequenced
    }
}

/// A batch as the trusted sequencer submits it.
#[derive(
    Clone, Debug, Eq, PartialEq, Arbitrary, BorshDeserialize, BorshSerialize, Deserialize, Serialize,
)]
pub struct BatchData {
    /// Raw L2 transaction payload.
    pub transactions: Vec<u8>,

    /// Global exit root the batch was built against.
    pub global_exit_root: Buf32,

    /// Timestamp the sequencer assigns the batch.
    pub timestamp: u64,

    /// Nonzero iff this batch satisfies a queued forced batch, in which
    /// case it is the minimum timestamp that forced batch demanded.
    pub min_forced_timestamp: u64,
}

/// A forced batch as resubmitted to `sequence_force_batches`, which must
/// re-derive the commitment stored when it was queued.
#[derive(
    Clone, Debug, Eq, PartialEq, Arbitrary, BorshDeserialize, BorshSerialize, Deserialize, Serialize,
)]
pub struct ForcedBatchData {
    pub transactions: Vec<u8>,
    pub global_exit_root: Buf32,
    pub min_forced_timestamp: u64,
}

/// Commitment a forced batch is stored under while it waits in the queue:
/// `keccak(keccak(transactions) || global_exit_root || min_forced_timestamp)`.
pub fn compute_forced_batch_commitment(
    transactions_hash: &Buf32,
    global_exit_root: &Buf32,
    min_forced_timestamp: u64,
) -> Buf32 {
    let mut buf = Vec::with_capacity(32 + 32 + 8);
    buf.extend_from_slice(transactions_hash.as_slice());
    buf.extend_from_slice(global_exit_root.as_slice());
    buf.extend_from_slice(&min_forced_timestamp.to_be_bytes());
    hash::keccak(&buf)
}

/// Extends the accumulator chain by one batch:
/// `keccak(prev || keccak(transactions) || global_exit_root || timestamp || sequencer)`.
///
/// This layout is a wire contract with the prover circuit and must not be
/// altered.
pub fn extend_acc_input_hash(
    prev: &Buf32,
    transactions_hash: &Buf32,
    global_exit_root: &Buf32,
    timestamp: u64,
    sequencer: &Buf20,
) -> Buf32 {
    let mut buf = Vec::with_capacity(32 + 32 + 32 + 8 + 20);
    buf.extend_from_slice(prev.as_slice());
    buf.extend_from_slice(transactions_hash.as_slice());
    buf.extend_from_slice(global_exit_root.as_slice());
    buf.extend_from_slice(&timestamp.to_be_bytes());
    buf.extend_from_slice(sequencer.as_slice());
    hash::keccak(&buf)
}

#[cfg(test)]
mod tests {
    use zkrollup_test_utils::ArbitraryGenerator;

    use super::*;

    #[test]
    fn test_acc_input_hash_deterministic() {
        let gen = ArbitraryGenerator::new();
        let prev: Buf32 = gen.generate();
        let txs_hash: Buf32 = gen.generate();
        let ger: Buf32 = gen.generate();
        let seq: Buf20 = gen.generate();

        let a = extend_acc_input_hash(&prev, &txs_hash, &ger, 42, &seq);
        let b = extend_acc_input_hash(&prev, &txs_hash, &ger, 42, &seq);
        assert_eq!(a, b);

        // Any field changing must change the accumulator.
        let c = extend_acc_input_hash(&prev, &txs_hash, &ger, 43, &seq);
        assert_ne!(a, c);
    }

    #[test]
    fn test_forced_commitment_binds_all_fields() {
        let gen = ArbitraryGenerator::new();
        let txs_hash: Buf32 = gen.generate();
        let ger: Buf32 = gen.generate();

        let a = compute_forced_batch_commitment(&txs_hash, &ger, 100);
        let b = compute_forced_batch_commitment(&txs_hash, &ger, 101);
        assert_ne!(a, b);

        let other: Buf32 = gen.generate();
        let c = compute_forced_batch_commitment(&txs_hash, &other, 100);
        assert_ne!(a, c);
    }
}
