//! Balance and resource quantity mutations.
//!
//! Both ledgers follow the same two-phase shape:
//!
//! 1. Read the current value and its version, compute the new value, and
//!    compare-and-swap it in. A lost race re-reads and retries.
//! 2. Snapshot the new value under today's date. A failure here is logged and
//!    queued for reconciliation; the committed value is never rolled back.

pub mod balance;
pub mod error;
pub mod mode;
pub mod resource;

#[cfg(test)]
mod mode_props;
#[cfg(test)]
mod tests;

pub use balance::{BalanceLedger, BalanceUpdate};
pub use error::LedgerError;
pub use mode::{Rejection, apply_balance, apply_quantity};
pub use resource::{QuantityUpdate, ResourceLedger};

/// Default number of compare-and-swap attempts per update.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
