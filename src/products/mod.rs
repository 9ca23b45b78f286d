//! # Products Module
//!
//! Product catalogue: persistence, validation, the JSON API, the server
//! rendered pages and the photo/specification file endpoints.

pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
pub mod validators;
pub mod views;


pub use models::{Product, ProductResource};
pub use routes::product_routes;
pub use services::{ProductsService, PublishError};
