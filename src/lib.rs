//! Product catalogue service: bearer-token accounts, admin user management,
//! product CRUD over JSON and HTML, and background notification jobs.

pub mod app;
pub mod auth;
pub mod common;
pub mod logging_middleware;
pub mod notifications;
pub mod products;
pub mod queue;
pub mod services;
pub mod users;
