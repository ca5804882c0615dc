//! Order placement.

use foodcourt_cart::DeliveryOption;
use foodcourt_core::PaymentMethod;

use super::cart::print_cart;
use super::{CommandError, open_resumed};

/// Place an order for the whole cart.
pub async fn place(payment: &str, address: Option<String>) -> Result<(), CommandError> {
    let payment: PaymentMethod = payment.parse().map_err(CommandError::InvalidArgument)?;
    let mut store = open_resumed()?;
    if !store.is_authenticated() {
        return Err(CommandError::NotLoggedIn);
    }

    print_cart(&store, DeliveryOption::Standard);
    let order = store.place_order(payment, address).await?;

    tracing::info!(
        "Order {} placed ({}, status {:?}, total {})",
        order.id,
        payment.as_str(),
        order.status,
        order
            .total_price
            .map_or_else(|| "unknown".to_string(), |total| total.display())
    );
    Ok(())
}
