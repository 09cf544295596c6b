//! `SeaORM` entity definitions.

pub mod balance_history;
pub mod organizations;
pub mod resource_quantity_history;
pub mod resources;
pub mod roles;
pub mod user_claims;
pub mod user_resources;
pub mod user_roles;
pub mod users;

pub mod prelude {
    //! Entity re-exports.

    pub use super::balance_history::Entity as BalanceHistory;
    pub use super::organizations::Entity as Organizations;
    pub use super::resource_quantity_history::Entity as ResourceQuantityHistory;
    pub use super::resources::Entity as Resources;
    pub use super::roles::Entity as Roles;
    pub use super::user_claims::Entity as UserClaims;
    pub use super::user_resources::Entity as UserResources;
    pub use super::user_roles::Entity as UserRoles;
    pub use super::users::Entity as Users;
}
