//! # Auth Module
//!
//! This module handles all authentication-related functionality including:
//! - Registration and password login
//! - Personal access tokens (issue, resolve, revoke), also carried in a session cookie
//! - Profile read/update and password change
//! - AuthedUser extractor and role checks for protected routes

pub mod cookies;
pub mod extractors;
pub mod handlers;
pub mod models;
pub mod password;
pub mod policy;
pub mod routes;
pub mod tokens;
pub mod validators;

#[cfg(test)]
mod tests;

pub use extractors::AuthedUser;
pub use models::User;
pub use routes::auth_routes;
