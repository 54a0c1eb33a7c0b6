//! Farmers Place marketplace library.
//!
//! Catalog, cart, checkout, and social feed for a farmers-market storefront,
//! served as a JSON API. The binary in `main.rs` wires these modules into an
//! Axum server; the CLI reuses the services for seeding.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
