//! Data model for the rollup settlement core: the sequenced-batch ledger,
//! forced-batch queue, pending-state queue and the global protocol state
//! that owns them.  All protocol logic lives in `zkrollup-core`; this crate
//! is pure state.

pub mod batch;
pub mod pending;
pub mod rollup_state;
