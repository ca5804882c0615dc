//! Foodcourt cart library.
//!
//! Holds the customer's cart, persists it across restarts and keeps it in
//! step with the backend cart once the customer logs in.
//!
//! # Modules
//!
//! - [`cart`] - In-memory cart and the restaurant policy
//! - [`store`] - [`CartStore`], mutation strategies and server sync
//! - [`storage`] - Key-value persistence (`MemoryStore`, `FileStore`)
//! - [`remote`] - Backend cart/order API and its `reqwest` client
//! - [`checkout`] - Order summary and placement
//! - [`session`] - Authenticated session passed into the store
//! - [`config`] - Environment-driven configuration

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod checkout;
pub mod config;
pub mod remote;
pub mod session;
pub mod storage;
pub mod store;

#[cfg(test)]
mod testing;

pub use cart::{Cart, PolicyDecision, RestaurantPolicy};
pub use checkout::{CartSummary, CheckoutError, DeliveryOption};
pub use config::{ApiConfig, CartConfig, ConfigError, StoreOptions};
pub use remote::{CartApi, CartApiError, HttpCartClient, OrderApi};
pub use session::Session;
pub use storage::{FileStore, KeyValueStore, MemoryStore, StorageError};
pub use store::{AddOutcome, CartStore, MutationPath, SyncError, SyncOutcome, watch_sessions};
