//! Organizations: membership transitions and read-only rollups.

pub mod aggregator;
pub mod error;
pub mod service;
pub mod types;

#[cfg(test)]
mod tests;

pub use aggregator::OrganizationAggregator;
pub use error::OrganizationError;
pub use service::OrganizationService;
pub use types::{
    DailyBalance, DailyResourceTotal, MemberBalance, MemberResource, OrganizationBalance,
    OrganizationDetails, ResourceTotal,
};

/// Shortest accepted organization name, in characters.
pub const MIN_NAME_LEN: usize = 3;
/// Longest accepted organization name, in characters.
pub const MAX_NAME_LEN: usize = 100;
