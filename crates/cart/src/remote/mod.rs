//! Backend cart and order API.
//!
//! # Architecture
//!
//! - [`CartApi`] and [`OrderApi`] are the contracts the cart store consumes
//! - [`HttpCartClient`] implements both over `reqwest`
//! - Request and response bodies are owned by the backend; [`types`] holds
//!   the client's view of them
//!
//! # Endpoints
//!
//! | Operation        | Request                                   |
//! |------------------|-------------------------------------------|
//! | get cart         | `GET    {base}/cart`                      |
//! | add item         | `POST   {base}/cart/add`                  |
//! | remove item      | `DELETE {base}/cart/remove/{dishId}`      |
//! | update quantity  | `PUT    {base}/cart/update/{dishId}?quantity=n` |
//! | clear cart       | `DELETE {base}/cart/clear`                |
//! | place order      | `POST   {base}/orders/place`              |

mod client;
pub mod types;

pub use client::HttpCartClient;
pub use types::*;

use std::future::Future;

use foodcourt_core::{CartItem, DishId};
use thiserror::Error;

use crate::session::Session;

/// Errors that can occur when talking to the backend.
#[derive(Debug, Error)]
pub enum CartApiError {
    /// HTTP request failed (connection, timeout, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend rejected the session token.
    #[error("Unauthorized: session rejected by backend")]
    Unauthorized,

    /// The backend answered with a non-success status.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Endpoint URL could not be built.
    #[error("Invalid endpoint: {0}")]
    Endpoint(#[from] url::ParseError),
}

impl CartApiError {
    /// Whether the backend rejected the session.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }
}

/// Server-side cart operations.
pub trait CartApi: Send + Sync {
    /// Fetch the authoritative server cart.
    fn get_cart(
        &self,
        session: &Session,
    ) -> impl Future<Output = Result<Vec<RemoteCartItem>, CartApiError>> + Send;

    /// Add `item.quantity` units of a dish. The backend accumulates quantities
    /// for dishes it already holds.
    fn add_item(
        &self,
        session: &Session,
        item: &CartItem,
    ) -> impl Future<Output = Result<(), CartApiError>> + Send;

    fn remove_item(
        &self,
        session: &Session,
        dish_id: DishId,
    ) -> impl Future<Output = Result<(), CartApiError>> + Send;

    /// Set the quantity of a dish the server already holds.
    fn update_quantity(
        &self,
        session: &Session,
        dish_id: DishId,
        quantity: u32,
    ) -> impl Future<Output = Result<(), CartApiError>> + Send;

    fn clear_cart(&self, session: &Session) -> impl Future<Output = Result<(), CartApiError>> + Send;

    /// Make the server cart equal to `merged`, given the `server` cart it was
    /// merged from.
    ///
    /// Dishes the server already holds get an absolute `update_quantity`;
    /// new dishes go through `add_item`. This is not atomic: an error stops
    /// the loop and leaves earlier writes in place. Backends with a batch
    /// endpoint should override it.
    fn reconcile(
        &self,
        session: &Session,
        server: &[RemoteCartItem],
        merged: &[CartItem],
    ) -> impl Future<Output = Result<(), CartApiError>> + Send {
        async move {
            for item in merged {
                match server.iter().find(|s| s.dish_id == item.dish_id) {
                    Some(existing) if existing.quantity == item.quantity => {}
                    Some(_) => {
                        self.update_quantity(session, item.dish_id, item.quantity)
                            .await?;
                    }
                    None => self.add_item(session, item).await?,
                }
            }
            Ok(())
        }
    }
}

/// Order placement.
pub trait OrderApi: Send + Sync {
    fn place_order(
        &self,
        session: &Session,
        request: &PlaceOrderRequest,
    ) -> impl Future<Output = Result<PlacedOrder, CartApiError>> + Send;
}
