//! Repository layer for database operations.
//!
//! Repositories provide a clean abstraction over database operations.
//! [`crate::SeaOrmStore`] composes them into the core store traits.

pub mod history;
pub mod holding;
pub mod identity;
pub mod organization;
pub mod resource;
pub mod user;

pub use history::HistoryRepository;
pub use holding::HoldingRepository;
pub use identity::IdentityRepository;
pub use organization::OrganizationRepository;
pub use resource::ResourceRepository;
pub use user::UserRepository;
