//! Checkout: order summary and placement.

use foodcourt_core::{PaymentMethod, Price};
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::cart::Cart;
use crate::remote::{CartApi, CartApiError, OrderApi, OrderLine, PlaceOrderRequest, PlacedOrder};
use crate::storage::KeyValueStore;
use crate::store::CartStore;

const STANDARD_DELIVERY_FEE: i64 = 150;
const EXPRESS_DELIVERY_FEE: i64 = 300;
const FREE_DELIVERY_THRESHOLD: i64 = 1000;

/// Errors that prevent an order from being placed.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("Checkout requires a logged-in user")]
    NotAuthenticated,

    #[error("Cart is empty")]
    EmptyCart,

    #[error("Cart holds dishes from more than one restaurant")]
    MixedRestaurants,

    #[error("Order API error: {0}")]
    Api(#[from] CartApiError),
}

/// Delivery speed chosen at checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeliveryOption {
    #[default]
    Standard,
    Express,
}

impl DeliveryOption {
    /// Fee for this option given the cart subtotal.
    #[must_use]
    pub fn fee(self, subtotal: Price) -> Price {
        match self {
            Self::Standard if subtotal.amount() >= Decimal::from(FREE_DELIVERY_THRESHOLD) => {
                Price::ZERO
            }
            Self::Standard => Price::from_units(STANDARD_DELIVERY_FEE),
            Self::Express => Price::from_units(EXPRESS_DELIVERY_FEE),
        }
    }
}

impl std::str::FromStr for DeliveryOption {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "standard" => Ok(Self::Standard),
            "express" => Ok(Self::Express),
            other => Err(format!("unknown delivery option: {other}")),
        }
    }
}

/// Totals shown on the checkout page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartSummary {
    pub subtotal: Price,
    pub delivery_fee: Price,
    pub total: Price,
    pub item_count: u64,
}

impl CartSummary {
    #[must_use]
    pub fn for_cart(cart: &Cart, delivery: DeliveryOption) -> Self {
        let subtotal = cart.total_price();
        let delivery_fee = if cart.is_empty() {
            Price::ZERO
        } else {
            delivery.fee(subtotal)
        };
        Self {
            subtotal,
            delivery_fee,
            total: subtotal + delivery_fee,
            item_count: cart.item_count(),
        }
    }
}

/// Build the order body for a cart.
///
/// # Errors
///
/// Returns `EmptyCart` or `MixedRestaurants` if the cart cannot become a
/// single order.
pub fn order_request(
    cart: &Cart,
    payment_method: PaymentMethod,
    delivery_address: Option<String>,
) -> Result<PlaceOrderRequest, CheckoutError> {
    let restaurant_id = cart.restaurant_id().ok_or(CheckoutError::EmptyCart)?;
    if !cart.is_single_restaurant() {
        return Err(CheckoutError::MixedRestaurants);
    }

    Ok(PlaceOrderRequest {
        restaurant_id,
        items: cart.items().iter().map(OrderLine::from).collect(),
        payment_method,
        delivery_address,
    })
}

impl<S: KeyValueStore, A: CartApi + OrderApi> CartStore<S, A> {
    /// Place an order for the whole cart.
    ///
    /// On success the cart is cleared. On failure the cart is left as it was.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError` if there is no session, the cart cannot form a
    /// single order, or the backend refuses it.
    #[instrument(skip(self, delivery_address), fields(entries = self.cart().len()))]
    pub async fn place_order(
        &mut self,
        payment_method: PaymentMethod,
        delivery_address: Option<String>,
    ) -> Result<PlacedOrder, CheckoutError> {
        let session = self.session().ok_or(CheckoutError::NotAuthenticated)?;
        let request = order_request(self.cart(), payment_method, delivery_address)?;

        let placed = match self.api().place_order(session, &request).await {
            Ok(placed) => placed,
            Err(e) => {
                warn!(error = %e, "Order placement failed");
                if e.is_unauthorized() {
                    self.drop_session();
                }
                return Err(e.into());
            }
        };

        info!(order_id = %placed.id, status = ?placed.status, "Order placed");
        self.clear().await;
        Ok(placed)
    }
}
