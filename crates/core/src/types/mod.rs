//! Core types for Foodcourt.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod cart_item;
pub mod id;
pub mod price;
pub mod status;

pub use cart_item::{CartItem, DishSelection};
pub use id::*;
pub use price::Price;
pub use status::*;
