//! Groth16 proof container handed through to the verifier capability.

use arbitrary::Arbitrary;
use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::buf::Buf32;

/// The three curve points of a Groth16 proof, in the affine coordinate
/// encoding the external verifier expects.  The core never looks inside,
/// it only forwards this to the verifier capability.
#[derive(
    Clone, Debug, Eq, PartialEq, Arbitrary, BorshDeserialize, BorshSerialize, Deserialize, Serialize,
)]
pub struct Groth16Proof {
    a: [Buf32; 2],
    b: [[Buf32; 2]; 2],
    c: [Buf32; 2],
}

impl Groth16Proof {
    pub fn new(a: [Buf32; 2], b: [[Buf32; 2]; 2], c: [Buf32; 2]) -> Self {
        Self { a, b, c }
    }

    pub fn a(&self) -> &[Buf32; 2] {
        &self.a
    }

    pub fn b(&self) -> &[[Buf32; 2]; 2] {
        &self.b
    }

    pub fn c(&self) -> &[Buf32; 2] {
        &self.c
    }
}
