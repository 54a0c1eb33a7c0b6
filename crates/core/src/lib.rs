//! Farmers Place Core - Shared domain library.
//!
//! This crate provides the types and pure business rules shared by the
//! Farmers Place components:
//! - `storefront` - The marketplace HTTP service
//! - `cli` - Command-line tools for migrations and seeding
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP clients. Stock levels are always passed in by the caller,
//! which keeps the cart and checkout rules testable without a database.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, emails, money, and order statuses
//! - [`cart`] - The shopping cart model and its stock checks
//! - [`checkout`] - Planning of inventory adjustments for an order

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod checkout;
pub mod types;

pub use cart::{Cart, CartEntry, CartError, CartItem};
pub use checkout::{
    CheckoutError, OrderLine, StockAdjustment, lock_order, order_total, plan_stock_adjustments,
};
pub use types::*;
