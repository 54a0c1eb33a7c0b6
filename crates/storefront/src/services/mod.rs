//! Business logic services for storefront.
//!
//! # Services
//!
//! - `auth` - Password sign-up and sign-in
//! - `cart` - Per-user cart backed by live stock
//! - `checkout` - Transactional order placement
//! - `catalog` - Item browsing, farmer directory, farmer inventory
//! - `profile` - Profile editing and order history
//! - `feed` - Social posts
//! - `storage` - Uploaded image storage

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod feed;
pub mod profile;
pub mod storage;
