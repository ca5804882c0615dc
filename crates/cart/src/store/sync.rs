//! Local/server cart reconciliation.
//!
//! Runs when a session becomes authenticated:
//!
//! 1. fetch the server cart
//! 2. apply the restaurant policy to both sides ([`resolve_restaurants`])
//! 3. merge the local cart into the server cart ([`merge_carts`])
//! 4. push the merged cart ([`CartApi::reconcile`])
//! 5. re-fetch and adopt the server cart as local state
//!
//! The sequence is not atomic. A failure in step 3 can leave the server with
//! part of the merge applied; nothing is rolled back or retried, and the local
//! cart stays as it was before the sync.

use foodcourt_core::{CartItem, DishId};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::cart::{Cart, RestaurantPolicy};
use crate::remote::{CartApi, CartApiError, RemoteCartItem};
use crate::session::Session;

/// Which step of a sync failed.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Failed to fetch server cart: {0}")]
    Fetch(#[source] CartApiError),

    #[error("Failed to push merged cart: {0}")]
    Push(#[source] CartApiError),

    #[error("Failed to re-fetch server cart: {0}")]
    Refresh(#[source] CartApiError),
}

impl SyncError {
    #[must_use]
    pub const fn api_error(&self) -> &CartApiError {
        match self {
            Self::Fetch(e) | Self::Push(e) | Self::Refresh(e) => e,
        }
    }
}

/// Both carts after the restaurant policy has been applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestaurantResolution {
    /// Server entries that take part in the merge.
    pub server: Vec<RemoteCartItem>,
    /// Local entries that take part in the merge.
    pub local: Cart,
    /// Server dishes to delete before the push.
    pub dropped_server: Vec<DishId>,
    /// Local dishes left out of the merge.
    pub dropped_local: Vec<DishId>,
}

/// Keep the merged cart within one restaurant, as `policy` requires.
///
/// `Replace` keeps the local cart's restaurant and drops server entries from
/// any other. `Reject` keeps the server cart's restaurant and drops local
/// entries from any other. `Mixed` keeps everything. Nothing is dropped when
/// the side that wins is empty.
#[must_use]
pub fn resolve_restaurants(
    policy: RestaurantPolicy,
    server: Vec<RemoteCartItem>,
    local: &Cart,
) -> RestaurantResolution {
    let mut resolution = RestaurantResolution {
        server,
        local: local.clone(),
        dropped_server: Vec::new(),
        dropped_local: Vec::new(),
    };

    match policy {
        RestaurantPolicy::Mixed => {}
        RestaurantPolicy::Replace => {
            if let Some(current) = local.restaurant_id() {
                let (kept, dropped): (Vec<_>, Vec<_>) = resolution
                    .server
                    .into_iter()
                    .partition(|item| item.restaurant_id == current);
                resolution.server = kept;
                resolution.dropped_server = dropped.iter().map(|item| item.dish_id).collect();
            }
        }
        RestaurantPolicy::Reject => {
            if let Some(current) = resolution.server.first().map(|item| item.restaurant_id) {
                let (kept, dropped): (Vec<_>, Vec<_>) = local
                    .items()
                    .iter()
                    .cloned()
                    .partition(|item| item.restaurant_id == current);
                resolution.local = Cart::from_items(kept);
                resolution.dropped_local = dropped.iter().map(|item| item.dish_id).collect();
            }
        }
    }

    resolution
}

/// Merge the local cart into the server cart.
///
/// Server entries keep their position. A local entry for a dish the server
/// also holds adds its quantity to the server's and supplies the price and
/// display fields. Local-only entries are appended in local order.
#[must_use]
pub fn merge_carts(server: &[RemoteCartItem], local: &Cart) -> Vec<CartItem> {
    let mut merged: Vec<CartItem> = server
        .iter()
        .map(|remote| {
            let known = local.get(remote.dish_id);
            let mut item = remote.clone().into_cart_item(known);
            if let Some(local_item) = known {
                item.quantity = remote.quantity.saturating_add(local_item.quantity);
                item.price = local_item.price;
                item.dish_name.clone_from(&local_item.dish_name);
                item.dish_description.clone_from(&local_item.dish_description);
            }
            item
        })
        .collect();

    for local_item in local.items() {
        if !server.iter().any(|remote| remote.dish_id == local_item.dish_id) {
            merged.push(local_item.clone());
        }
    }

    merged
}

/// Turn a fetched server cart into local state.
///
/// Price and display fields the server omits are taken from `known`.
#[must_use]
pub fn adopt_server_cart(server: Vec<RemoteCartItem>, known: &[CartItem]) -> Cart {
    Cart::from_items(server.into_iter().map(|remote| {
        let local = known.iter().find(|item| item.dish_id == remote.dish_id);
        remote.into_cart_item(local)
    }))
}

/// Run the full fetch / resolve / merge / push / re-fetch sequence.
///
/// # Errors
///
/// Returns the step that failed. Earlier server writes are not undone.
pub async fn synchronize<A: CartApi>(
    api: &A,
    session: &Session,
    local: &Cart,
    policy: RestaurantPolicy,
) -> Result<Cart, SyncError> {
    let server = api.get_cart(session).await.map_err(SyncError::Fetch)?;
    let resolved = resolve_restaurants(policy, server, local);

    if !resolved.dropped_local.is_empty() {
        warn!(
            dropped = ?resolved.dropped_local,
            "Local dishes from another restaurant left out of the server cart"
        );
    }
    for dish_id in &resolved.dropped_server {
        api.remove_item(session, *dish_id)
            .await
            .map_err(SyncError::Push)?;
    }
    if !resolved.dropped_server.is_empty() {
        info!(
            removed = ?resolved.dropped_server,
            "Removed server dishes from another restaurant"
        );
    }

    let merged = merge_carts(&resolved.server, &resolved.local);
    debug!(
        server_entries = resolved.server.len(),
        local_entries = resolved.local.len(),
        merged_entries = merged.len(),
        "Merged local cart into server cart"
    );

    api.reconcile(session, &resolved.server, &merged)
        .await
        .map_err(SyncError::Push)?;

    let refreshed = api.get_cart(session).await.map_err(SyncError::Refresh)?;
    Ok(adopt_server_cart(refreshed, &merged))
}
