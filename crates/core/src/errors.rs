//! Error taxonomy for the settlement core.
//!
//! Every named failure condition is its own variant so that calling
//! infrastructure can branch on the failure kind.  All of these are fatal
//! for the enclosing call; recovery is caller- or admin-driven.

use alloy_primitives::U256;
use thiserror::Error;

/// Failures of the staking-token capability.  Always fatal for the
/// enclosing operation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("insufficient balance (needed {0}, available {1})")]
    InsufficientBalance(U256, U256),

    #[error("token transfer rejected")]
    TransferRejected,
}

/// Failures of the sequencing entry points.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SequencingError {
    #[error("caller is not the trusted sequencer")]
    OnlyTrustedSequencer,

    #[error("system is in emergency state")]
    OnlyNotEmergencyState,

    #[error("tried to sequence zero batches")]
    SequenceZeroBatches,

    #[error("tried to sequence {0} batches (cap {1})")]
    ExceedMaxVerifyBatches(u64, u64),

    #[error("transactions payload is {0} bytes (limit {1})")]
    TransactionsLengthAboveMax(usize, usize),

    #[error("batch timestamp {0} invalid (last {1}, now {2})")]
    SequencedTimestampInvalid(u64, u64, u64),

    #[error("batch timestamp {0} below forced minimum {1}")]
    SequencedTimestampBelowForcedTimestamp(u64, u64),

    #[error("forced batch data does not match commitment at queue slot {0}")]
    ForcedDataDoesNotMatch(u64),

    #[error("forced batches consumed past the queue (slot {0}, queued {1})")]
    ForceBatchesOverflow(u64, u64),

    #[error("force batch timeout not expired for queue slot {0}")]
    ForceBatchTimeoutNotExpired(u64),

    #[error("supplied {0} tokens, current batch fee is {1}")]
    NotEnoughTokenAmount(U256, U256),

    #[error("commitment binding rejected batch {0}")]
    CommitmentBindingRejected(u64),

    #[error("token: {0}")]
    Token(#[from] TokenError),
}

/// Failures of the verification and consolidation entry points.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum VerificationError {
    #[error("caller is not the trusted aggregator")]
    OnlyTrustedAggregator,

    #[error("system is in emergency state")]
    OnlyNotEmergencyState,

    #[error("trusted aggregator timeout not expired for batch {0}")]
    TrustedAggregatorTimeoutNotExpired(u64),

    #[error("tried to verify {0} batches (cap {1})")]
    ExceedMaxVerifyBatches(u64, u64),

    #[error("pending state {0} does not exist")]
    PendingStateDoesNotExist(u64),

    #[error("init batch {0} does not match pending state batch {1}")]
    InitNumBatchDoesNotMatchPendingState(u64, u64),

    #[error("no consolidated state root for batch {0}")]
    OldStateRootDoesNotExist(u64),

    #[error("init batch {0} above last verified batch {1}")]
    InitNumBatchAboveLastVerifiedBatch(u64, u64),

    #[error("final batch {0} not above last verified batch {1}")]
    FinalNumBatchBelowLastVerifiedBatch(u64, u64),

    #[error("no accumulated input hash for init batch {0}")]
    OldAccInputHashDoesNotExist(u64),

    #[error("no accumulated input hash for final batch {0}")]
    NewAccInputHashDoesNotExist(u64),

    #[error("proof did not verify")]
    InvalidProof,

    #[error("pending state {0} is not consolidable yet")]
    PendingStateNotConsolidable(u64),

    #[error("pending state {0} outside consolidable range ({1}, {2}]")]
    PendingStateInvalid(u64, u64, u64),

    #[error("token: {0}")]
    Token(#[from] TokenError),
}

/// Failures of the soundness/emergency entry points.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SoundnessError {
    #[error("caller is not the trusted aggregator")]
    OnlyTrustedAggregator,

    #[error("caller is not the admin")]
    OnlyAdmin,

    #[error("system is in emergency state")]
    OnlyNotEmergencyState,

    #[error("pending state {0} does not exist")]
    PendingStateDoesNotExist(u64),

    #[error("init batch {0} does not match pending state batch {1}")]
    InitNumBatchDoesNotMatchPendingState(u64, u64),

    #[error("no consolidated state root for batch {0}")]
    OldStateRootDoesNotExist(u64),

    #[error("init batch {0} above last verified batch {1}")]
    InitNumBatchAboveLastVerifiedBatch(u64, u64),

    #[error("final pending state {0} outside range ({1}, {2}]")]
    FinalPendingStateNumInvalid(u64, u64, u64),

    #[error("final batch {0} does not match pending state batch {1}")]
    FinalNumBatchDoesNotMatchPendingState(u64, u64),

    #[error("no accumulated input hash for init batch {0}")]
    OldAccInputHashDoesNotExist(u64),

    #[error("no accumulated input hash for final batch {0}")]
    NewAccInputHashDoesNotExist(u64),

    #[error("proof did not verify")]
    InvalidProof,

    #[error("proven root equals the stored root, nothing to dispute")]
    StoredRootMustBeDifferentThanNewRoot,

    #[error("batch {0} is not an unverified sequence end")]
    BatchNotSequencedOrNotSequenceEnd(u64),

    #[error("halt timeout not expired for batch {0}")]
    HaltTimeoutNotExpired(u64),

    #[error("emergency: {0}")]
    Emergency(#[from] EmergencyError),
}

/// Failures of the admin surface.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AdminError {
    #[error("caller is not the admin")]
    OnlyAdmin,

    #[error("multiplier {0} outside [1000, 1023]")]
    InvalidRangeMultiplierBatchFee(u16),

    #[error("batch time target {0} above maximum {1}")]
    InvalidRangeBatchTimeTarget(u64, u64),

    #[error("trusted aggregator timeout {0} above maximum {1}")]
    TrustedAggregatorTimeoutAboveMax(u64, u64),

    #[error("new trusted aggregator timeout {0} must be lower than {1}")]
    NewTrustedAggregatorTimeoutMustBeLower(u64, u64),

    #[error("pending state timeout {0} above maximum {1}")]
    PendingStateTimeoutAboveMax(u64, u64),

    #[error("new pending state timeout {0} must be lower than {1}")]
    NewPendingStateTimeoutMustBeLower(u64, u64),

    #[error("force batch timeout {0} above maximum {1}")]
    ForceBatchTimeoutAboveMax(u64, u64),

    #[error("new force batch timeout {0} must be lower than {1}")]
    NewForceBatchTimeoutMustBeLower(u64, u64),

    #[error("emergency: {0}")]
    Emergency(#[from] EmergencyError),
}

/// Emergency flag toggled the wrong way.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EmergencyError {
    #[error("emergency state already active")]
    AlreadyActive,

    #[error("emergency state not active")]
    NotActive,
}
