//! Test helpers shared across the workspace: an arbitrary-instance
//! generator, canned network parameters and well-known role addresses.

use std::sync::atomic::{AtomicUsize, Ordering};

use arbitrary::{Arbitrary, Unstructured};
use rand::{rngs::OsRng, RngCore};
use zkrollup_primitives::buf::{Buf20, Buf32};
use zkrollup_primitives::params::{OperatorConfig, Params, RollupParams};

const ARB_GEN_LEN: usize = 1 << 24; // 16 MiB

pub struct ArbitraryGenerator {
    buf: Vec<u8>,
    off: AtomicUsize,
}

impl Default for ArbitraryGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl ArbitraryGenerator {
    pub fn new() -> Self {
        Self::new_with_size(ARB_GEN_LEN)
    }

    pub fn new_with_size(n: usize) -> Self {
        let mut buf = vec![0; n];
        OsRng.fill_bytes(&mut buf);
        let off = AtomicUsize::new(0);
        ArbitraryGenerator { buf, off }
    }

    pub fn generate<'a, T: Arbitrary<'a> + Clone>(&'a self) -> T {
        // Bump a shared offset so one generator can hand out many values.
        let off = self.off.load(Ordering::Relaxed);
        let mut u = Unstructured::new(&self.buf[off..]);
        let prev_off = u.len();
        let inst = T::arbitrary(&mut u).expect("failed to generate arbitrary instance");
        let additional_off = prev_off - u.len();
        self.off.store(off + additional_off, Ordering::Relaxed);
        inst
    }
}

// Well-known role addresses used by the canned parameters.

pub fn sequencer_addr() -> Buf20 {
    Buf20::from([0x01; 20])
}

pub fn aggregator_addr() -> Buf20 {
    Buf20::from([0x02; 20])
}

pub fn admin_addr() -> Buf20 {
    Buf20::from([0x03; 20])
}

/// An unprivileged address for permissionless-path tests.
pub fn other_addr() -> Buf20 {
    Buf20::from([0x04; 20])
}

pub fn genesis_root() -> Buf32 {
    Buf32::from([0xab; 32])
}

/// Canned network parameters with short, distinct timeouts so tests can
/// cross each threshold independently.
pub fn test_params() -> Params {
    Params {
        rollup: RollupParams {
            chain_id: 1001,
            fork_id: 1,
            genesis_state_root: genesis_root(),
        },
        operator: OperatorConfig {
            trusted_sequencer: sequencer_addr(),
            trusted_aggregator: aggregator_addr(),
            admin: admin_addr(),
            trusted_aggregator_timeout: 3_600,
            pending_state_timeout: 100,
            force_batch_timeout: 3_600,
            verify_batch_time_target: 1_800,
            multiplier_batch_fee: 1_002,
        },
    }
}
