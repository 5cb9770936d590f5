//! Shared fixtures for the unit tests in this crate: mock collaborators
//! implementing the capability traits, a canned core and scenario helpers.

use std::collections::BTreeMap;

use alloy_primitives::U256;
use zkrollup_primitives::buf::{Buf20, Buf32};
use zkrollup_primitives::proof::Groth16Proof;
use zkrollup_state::batch::BatchData;
use zkrollup_test_utils::{other_addr, sequencer_addr, test_params};

use crate::context::CallContext;
use crate::errors::TokenError;
use crate::traits::{BridgeCtl, ExitRootManager, ProofVerifier, StakeToken};
use crate::RollupCore;

/// In-memory staking token with per-account balances and a fee pool.
#[derive(Clone, Debug, Default)]
pub(crate) struct MockToken {
    balances: BTreeMap<Buf20, U256>,
    pool: U256,
}

impl MockToken {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Seeds an account balance, consuming self for chained setup.
    pub(crate) fn with_balance(mut self, who: Buf20, amount: U256) -> Self {
        self.balances.insert(who, amount);
        self
    }

    pub(crate) fn balance_of(&self, who: &Buf20) -> U256 {
        self.balances.get(who).copied().unwrap_or(U256::ZERO)
    }
}

impl StakeToken for MockToken {
    fn transfer(&mut self, to: &Buf20, amount: U256) -> Result<(), TokenError> {
        if amount > self.pool {
            return Err(TokenError::InsufficientBalance(amount, self.pool));
        }
        self.pool -= amount;
        *self.balances.entry(*to).or_insert(U256::ZERO) += amount;
        Ok(())
    }

    fn transfer_from(&mut self, from: &Buf20, amount: U256) -> Result<(), TokenError> {
        let balance = self.balance_of(from);
        if amount > balance {
            return Err(TokenError::InsufficientBalance(amount, balance));
        }
        self.balances.insert(*from, balance - amount);
        self.pool += amount;
        Ok(())
    }

    fn pool_balance(&self) -> U256 {
        self.pool
    }
}

/// Verifier that accepts or rejects everything, or only a pinned input.
#[derive(Clone, Debug)]
pub(crate) enum MockVerifier {
    AcceptAll,
    RejectAll,
    AcceptOnly(U256),
}

impl ProofVerifier for MockVerifier {
    fn verify_proof(&self, _proof: &Groth16Proof, public_inputs: &[U256; 1]) -> bool {
        match self {
            MockVerifier::AcceptAll => true,
            MockVerifier::RejectAll => false,
            MockVerifier::AcceptOnly(input) => public_inputs[0] == *input,
        }
    }
}

/// Exit-root manager that records every update it receives.
#[derive(Clone, Debug, Default)]
pub(crate) struct MockExitRoots {
    global_exit_root: Buf32,
    pub(crate) updates: Vec<Buf32>,
}

impl MockExitRoots {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn last_update(&self) -> Option<&Buf32> {
        self.updates.last()
    }
}

impl ExitRootManager for MockExitRoots {
    fn last_global_exit_root(&self) -> Buf32 {
        self.global_exit_root
    }

    fn update_exit_root(&mut self, new_root: Buf32) {
        self.updates.push(new_root);
    }
}

/// Bridge stub that tracks its emergency flag.
#[derive(Clone, Debug, Default)]
pub(crate) struct MockBridge {
    pub(crate) emergency_active: bool,
}

impl MockBridge {
    pub(crate) fn new() -> Self {
        Self::default()
    }
}

impl BridgeCtl for MockBridge {
    fn activate_emergency_state(&mut self) {
        self.emergency_active = true;
    }

    fn deactivate_emergency_state(&mut self) {
        self.emergency_active = false;
    }
}

pub(crate) type TestCore = RollupCore<MockToken, MockVerifier, MockExitRoots, MockBridge>;

/// 1000 tokens, enough for any test to sequence and force freely.
pub(crate) fn funds() -> U256 {
    U256::from(1_000_000_000_000_000_000_000u128)
}

pub(crate) fn coinbase() -> Buf20 {
    Buf20::from([0x05; 20])
}

pub(crate) fn test_core() -> TestCore {
    test_core_with_verifier(MockVerifier::AcceptAll)
}

pub(crate) fn test_core_with_verifier(verifier: MockVerifier) -> TestCore {
    let token = MockToken::new()
        .with_balance(sequencer_addr(), funds())
        .with_balance(other_addr(), funds());
    RollupCore::new(
        test_params(),
        token,
        verifier,
        MockExitRoots::new(),
        MockBridge::new(),
    )
}

pub(crate) fn ctx(caller: Buf20, timestamp: u64) -> CallContext {
    CallContext::new(caller, timestamp)
}

pub(crate) fn batch(timestamp: u64, tag: u8) -> BatchData {
    BatchData {
        transactions: vec![tag; 8],
        global_exit_root: Buf32::from([tag; 32]),
        timestamp,
        min_forced_timestamp: 0,
    }
}

pub(crate) fn dummy_proof() -> Groth16Proof {
    Groth16Proof::new(
        [Buf32::zero(); 2],
        [[Buf32::zero(); 2]; 2],
        [Buf32::zero(); 2],
    )
}

/// Sequences one event of `n` fresh batches at `timestamp` on the trusted
/// path, returning the new tip.
pub(crate) fn sequence(core: &mut TestCore, timestamp: u64, n: usize) -> u64 {
    let batches: Vec<_> = (0..n).map(|i| batch(timestamp, i as u8 + 1)).collect();
    core.sequence_batches(&ctx(sequencer_addr(), timestamp), &batches, coinbase())
        .expect("testing: sequence batches")
}
