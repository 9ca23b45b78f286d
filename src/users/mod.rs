//! # Users Module
//!
//! Administrator management of user accounts.

pub mod handlers;
pub mod routes;
pub mod services;
pub mod validators;


pub use routes::user_routes;
pub use services::{UserError, UsersService};
