//! Domain models for storefront.
//!
//! These are validated domain objects, separate from the database row types
//! in [`crate::db`]. Everything here serializes to the JSON the API returns.

pub mod item;
pub mod order;
pub mod post;
pub mod session;
pub mod user;

pub use item::{Item, ItemFilter, ItemInput, ItemWithFarmer};
pub use order::Order;
pub use post::{FeedAuthor, FeedPost};
pub use session::CurrentUser;
pub use user::{FarmerName, NewUser, ProfileUpdate, User};
