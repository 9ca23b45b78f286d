//! Role checks
//!
//! Kept as plain functions over the authenticated user so handlers and
//! tests can call them without a request.

use super::extractors::AuthedUser;
use crate::common::ApiError;

pub fn can_manage_products(user: &AuthedUser) -> bool {
    user.is_admin
}

pub fn can_manage_users(user: &AuthedUser) -> bool {
    user.is_admin
}

/// Turns a failed check into the 403 envelope
pub fn authorize(allowed: bool) -> Result<(), ApiError> {
    if allowed {
        Ok(())
    } else {
        Err(ApiError::forbidden())
    }
}
