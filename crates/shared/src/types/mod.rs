//! Common types used across the application.

pub mod id;
pub mod mode;


pub use id::*;
pub use mode::UpdateMode;
