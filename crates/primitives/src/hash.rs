//! Wrappers around the hash functions the protocol commits to.
//!
//! The accumulator chain and forced-batch commitments use keccak256, the
//! SNARK public input digest uses sha256.  Both byte layouts are wire
//! contracts with the prover circuit, so everything routes through here.

use digest::Digest;
use sha2::Sha256;

use crate::buf::Buf32;

/// Direct untagged keccak256 hash.
pub fn keccak(buf: &[u8]) -> Buf32 {
    Buf32::from(alloy_primitives::keccak256(buf).0)
}

/// Direct untagged sha256 hash.
pub fn sha256(buf: &[u8]) -> Buf32 {
    Buf32::from(<[u8; 32]>::from(Sha256::digest(buf)))
}
