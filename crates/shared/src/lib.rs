//! Shared types, errors, and configuration for StarLedger.
//!
//! This crate provides common types used across all other crates:
//! - Typed IDs for type-safe entity references
//! - Access token claims and JWT validation
//! - Request payloads shared by the API and its tests
//! - Application-wide error types
//! - Configuration management

pub mod auth;
pub mod config;
pub mod error;
pub mod jwt;
pub mod requests;
pub mod types;


pub use auth::TokenClaims;
pub use config::AppConfig;
pub use error::{AppError, AppResult, FieldErrors};
pub use jwt::{JwtConfig, JwtError, JwtService};
