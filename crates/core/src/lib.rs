//! Core business logic for StarLedger.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! Storage is reached through the traits in [`store`]; the SeaORM implementation
//! lives in `starledger-db` and an in-memory arena implementation lives here.
//!
//! # Modules
//!
//! - `ledger` - Balance and resource quantity mutations
//! - `history` - Daily watermark snapshots and reconciliation
//! - `organization` - Membership transitions and organization rollups
//! - `auth` - Claim/role policy evaluation and role bootstrap
//! - `catalog` - Global resource catalog upserts
//! - `users` - User profile directory

pub mod auth;
pub mod catalog;
pub mod clock;
pub mod history;
pub mod ledger;
pub mod organization;
pub mod records;
pub mod store;
pub mod users;

#[cfg(test)]
mod testing;

pub use clock::{Clock, ManualClock, SystemClock};
pub use store::{MemoryStore, StoreError, StoreResult};
