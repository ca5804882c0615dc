//! Wire types for the cart and order endpoints.
//!
//! The backend keeps a minimal cart record (`dishId`, `quantity`,
//! `restaurantId`). Price and display fields are accepted when present but
//! are usually missing, so adopting a server cart fills them in from what the
//! client already knows.

use foodcourt_core::{CartItem, DishId, OrderId, OrderStatus, PaymentMethod, Price, RestaurantId};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A cart entry as returned by `GET /cart`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteCartItem {
    pub dish_id: DishId,
    pub quantity: u32,
    pub restaurant_id: RestaurantId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<Price>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dish_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dish_description: Option<String>,
}

impl RemoteCartItem {
    /// Convert to a local entry, taking missing fields from `known`.
    ///
    /// The server's quantity always wins. Fields the server did send win over
    /// `known`.
    #[must_use]
    pub fn into_cart_item(self, known: Option<&CartItem>) -> CartItem {
        if known.is_none() && self.price.is_none() {
            debug!(dish_id = %self.dish_id, "Server cart entry has no price and no local match");
        }
        CartItem {
            dish_id: self.dish_id,
            quantity: self.quantity,
            price: self
                .price
                .or_else(|| known.map(|k| k.price))
                .unwrap_or(Price::ZERO),
            dish_name: self
                .dish_name
                .or_else(|| known.map(|k| k.dish_name.clone()))
                .unwrap_or_default(),
            dish_description: self
                .dish_description
                .or_else(|| known.map(|k| k.dish_description.clone()))
                .unwrap_or_default(),
            restaurant_id: self.restaurant_id,
        }
    }
}

impl From<&CartItem> for RemoteCartItem {
    fn from(item: &CartItem) -> Self {
        Self {
            dish_id: item.dish_id,
            quantity: item.quantity,
            restaurant_id: item.restaurant_id,
            price: Some(item.price),
            dish_name: Some(item.dish_name.clone()),
            dish_description: Some(item.dish_description.clone()),
        }
    }
}

/// One line of an order, as `POST /orders/place` expects it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub dish_id: DishId,
    pub quantity: u32,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: rust_decimal::Decimal,
    pub dish_name: String,
    pub dish_description: String,
}

impl From<&CartItem> for OrderLine {
    fn from(item: &CartItem) -> Self {
        Self {
            dish_id: item.dish_id,
            quantity: item.quantity,
            price: item.price.amount(),
            dish_name: item.dish_name.clone(),
            dish_description: item.dish_description.clone(),
        }
    }
}

/// Body of `POST /orders/place`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderRequest {
    pub restaurant_id: RestaurantId,
    pub items: Vec<OrderLine>,
    pub payment_method: PaymentMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_address: Option<String>,
}

/// The order the backend created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacedOrder {
    pub id: OrderId,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default)]
    pub restaurant_id: Option<RestaurantId>,
    #[serde(default)]
    pub total_price: Option<Price>,
}
