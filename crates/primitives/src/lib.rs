//! Shared primitive types for the rollup settlement core.

pub mod buf;
pub mod constants;
pub mod hash;
pub mod params;
pub mod proof;
