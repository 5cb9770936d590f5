//! Protocol constants shared with the prover circuit and the host ledger.

use alloy_primitives::U256;

/// Maximum byte length of the transactions payload in a sequenced batch.
/// Bounded by the prover circuit's keccak capacity.
pub const MAX_TRANSACTIONS_BYTE_LENGTH: usize = 120_000;

/// Maximum byte length of the transactions payload in a forced batch.
/// Tighter than the sequenced limit since forced payloads are committed in
/// full on the host ledger.
pub const MAX_FORCE_BATCH_BYTE_LENGTH: usize = 5_000;

/// Maximum number of batches a single sequence or verification may cover.
pub const MAX_VERIFY_BATCHES: u64 = 1_000;

/// Maximum number of fee multiplier applications in one fee update.
pub const MAX_BATCH_MULTIPLIER: u32 = 12;

/// Seconds after which an unverified sequenced batch lets anyone halt the
/// system.  Also the upper bound for the admin-settable timeouts.
pub const HALT_AGGREGATION_TIMEOUT: u64 = 7 * 24 * 60 * 60;

/// Upper bound for the verification latency target.
pub const MAX_VERIFY_BATCH_TIME_TARGET: u64 = 24 * 60 * 60;

/// Fee multiplier fixed-point base, 3 decimals.
pub const BATCH_FEE_BASE: u64 = 1_000;

/// Lower clamp for the per-batch fee, in wei of the staking token.
pub const MIN_BATCH_FEE: U256 = U256::from_limbs([1_000_000_000, 0, 0, 0]);

/// Upper clamp for the per-batch fee, 1000 tokens.
pub const MAX_BATCH_FEE: U256 = U256::from_limbs([0x35c9adc5dea00000, 0x36, 0, 0]);

/// Fee a batch starts the network at, 0.1 token.
pub const INITIAL_BATCH_FEE: U256 = U256::from_limbs([0x016345785d8a0000, 0, 0, 0]);

/// Order of the BN254 scalar field the SNARK public input lives in.
pub const SNARK_SCALAR_FIELD: U256 = U256::from_limbs([
    0x43e1f593f0000001,
    0x2833e84879b97091,
    0xb85045b68181585d,
    0x30644e72e131a029,
]);

/// Byte length of the serialized SNARK public input preimage.
pub const SNARK_INPUT_BYTES_LEN: usize = 20 + 32 + 32 + 8 + 8 + 8 + 32 + 32 + 32 + 8;
