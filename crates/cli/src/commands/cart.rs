//! Cart editing commands.

use foodcourt_cart::{AddOutcome, CartSummary, DeliveryOption, MutationPath, SyncOutcome};
use foodcourt_core::{DishId, DishSelection, Price, RestaurantId};
use rust_decimal::Decimal;

use super::{CommandError, Store, open_resumed, open_store};

/// Print the cart and its totals.
pub fn show(delivery: &str) -> Result<(), CommandError> {
    let delivery: DeliveryOption = delivery.parse().map_err(CommandError::InvalidArgument)?;
    let store = open_resumed()?;
    print_cart(&store, delivery);
    Ok(())
}

/// Add one unit of a dish.
pub async fn add(
    dish: i64,
    restaurant: i64,
    price: Decimal,
    name: String,
    description: String,
) -> Result<(), CommandError> {
    if price.is_sign_negative() {
        return Err(CommandError::InvalidArgument(format!(
            "price must not be negative: {price}"
        )));
    }

    let mut store = open_resumed()?;
    let selection = DishSelection::new(
        DishId::new(dish),
        RestaurantId::new(restaurant),
        Price::new(price),
        name,
    )
    .with_description(description);

    match store.add_item(selection).await {
        AddOutcome::Added { path } => report_path("Added", path),
        AddOutcome::Replaced { previous, path } => {
            tracing::info!("Cart held dishes from restaurant {previous}; replaced");
            report_path("Added", path);
        }
        AddOutcome::Rejected { current } => {
            return Err(CommandError::InvalidArgument(format!(
                "cart holds dishes from restaurant {current}; clear it first"
            )));
        }
    }

    print_cart(&store, DeliveryOption::Standard);
    Ok(())
}

pub async fn remove(dish: i64) -> Result<(), CommandError> {
    let mut store = open_resumed()?;
    let path = store.remove_item(DishId::new(dish)).await;
    report_path("Removed", path);
    print_cart(&store, DeliveryOption::Standard);
    Ok(())
}

pub async fn update(dish: i64, quantity: u32) -> Result<(), CommandError> {
    let mut store = open_resumed()?;
    let path = store.update_quantity(DishId::new(dish), quantity).await;
    report_path("Updated", path);
    print_cart(&store, DeliveryOption::Standard);
    Ok(())
}

pub async fn clear() -> Result<(), CommandError> {
    let mut store = open_resumed()?;
    let path = store.clear().await;
    report_path("Cleared", path);
    Ok(())
}

/// Merge the local cart into the server cart and adopt the result.
pub async fn sync() -> Result<(), CommandError> {
    let (mut store, session) = open_store()?;
    let session = session.ok_or(CommandError::NotLoggedIn)?;

    match store.set_session(Some(session)).await {
        Some(SyncOutcome::Synced { entries }) => {
            tracing::info!("Cart synchronized ({entries} entries)");
        }
        Some(SyncOutcome::Failed) => {
            tracing::warn!("Synchronization failed; local cart kept");
        }
        Some(SyncOutcome::Skipped) | None => {}
    }

    print_cart(&store, DeliveryOption::Standard);
    Ok(())
}

fn report_path(action: &str, path: MutationPath) {
    match path {
        MutationPath::Local => tracing::info!("{action} (local cart)"),
        MutationPath::Remote => tracing::info!("{action} (server cart)"),
        MutationPath::LocalFallback => {
            tracing::warn!("{action} locally; the server could not be reached");
        }
    }
}

#[allow(clippy::print_stdout)]
pub(super) fn print_cart(store: &Store, delivery: DeliveryOption) {
    if store.cart().is_empty() {
        println!("Cart is empty");
        return;
    }

    for item in store.items() {
        println!(
            "{:>6}  {:<30} {:>3} x {:>10} = {:>10}",
            item.dish_id,
            item.dish_name,
            item.quantity,
            item.price.display(),
            item.line_total().display(),
        );
    }

    let summary = CartSummary::for_cart(store.cart(), delivery);
    println!("Items:    {}", summary.item_count);
    println!("Subtotal: {}", summary.subtotal.display());
    println!("Delivery: {}", summary.delivery_fee.display());
    println!("Total:    {}", summary.total.display());
}
