//! Foodcourt Core - Shared types library.
//!
//! This crate provides common types used across all Foodcourt components:
//! - `cart` - Cart store, local persistence and server synchronization
//! - `cli` - Command-line driver for a persistent cart
//!
//! # Architecture
//!
//! The core crate contains only types and traits - no I/O, no storage access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere,
//! including WASM front ends.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, prices, cart item records and order statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
