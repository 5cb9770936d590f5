//! Per-call environment supplied by the host ledger.

use zkrollup_primitives::buf::Buf20;

/// Identity and time for one operation.  There is no internal clock; every
/// timeout in the protocol is a stored timestamp compared against the
/// `timestamp` the host hands us here.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct CallContext {
    caller: Buf20,
    timestamp: u64,
}

impl CallContext {
    pub fn new(caller: Buf20, timestamp: u64) -> Self {
        Self { caller, timestamp }
    }

    pub fn caller(&self) -> &Buf20 {
        &self.caller
    }

    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }
}
