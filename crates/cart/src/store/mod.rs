//! The cart store.
//!
//! [`CartStore`] is the sole writer of cart state. It restores the cart from
//! local storage on load, persists it after every mutation, and reconciles it
//! with the server cart when a session becomes authenticated.
//!
//! # Example
//!
//! ```rust,ignore
//! use foodcourt_cart::{CartStore, HttpCartClient, MemoryStore, Session, StoreOptions};
//!
//! let api = HttpCartClient::new(&config.api)?;
//! let mut store = CartStore::load(MemoryStore::new(), api, StoreOptions::default());
//!
//! store.add_item(selection).await;
//! store.set_session(Some(Session::new(user_id, token))).await; // merges with the server cart
//! println!("{} items, {}", store.item_count(), store.total_price());
//! ```

mod strategy;
pub mod sync;

pub use strategy::{CartOp, CartStrategy, LocalOnly, MutationPath, RemoteBacked};
pub use sync::{SyncError, merge_carts};

use foodcourt_core::{CartItem, DishId, DishSelection, Price, RestaurantId};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::cart::{Cart, PolicyDecision};
use crate::config::StoreOptions;
use crate::remote::CartApi;
use crate::session::Session;
use crate::storage::{KeyValueStore, StorageError};

/// Result of [`CartStore::add_item`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    /// The dish was added or its quantity incremented.
    Added { path: MutationPath },
    /// The cart held another restaurant's dishes; it was emptied first.
    Replaced {
        previous: RestaurantId,
        path: MutationPath,
    },
    /// The cart holds another restaurant's dishes and the policy refuses mixing.
    Rejected { current: RestaurantId },
}

/// Result of a server synchronization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The server cart was merged and adopted.
    Synced { entries: usize },
    /// No session; nothing to do.
    Skipped,
    /// A step failed; the local cart is unchanged.
    Failed,
}

/// Cart state with local persistence and server reconciliation.
pub struct CartStore<S, A> {
    storage: S,
    api: A,
    options: StoreOptions,
    session: Option<Session>,
    cart: Cart,
}

impl<S: KeyValueStore, A: CartApi> CartStore<S, A> {
    /// Restore the persisted cart, or start empty.
    ///
    /// A stored value that cannot be read or parsed is discarded and the key
    /// is removed; loading itself never fails.
    pub fn load(storage: S, api: A, options: StoreOptions) -> Self {
        let cart = restore(&storage, &options.cart_key);
        debug!(entries = cart.len(), key = %options.cart_key, "Cart store loaded");
        Self {
            storage,
            api,
            options,
            session: None,
            cart,
        }
    }

    #[must_use]
    pub const fn cart(&self) -> &Cart {
        &self.cart
    }

    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        self.cart.items()
    }

    /// Sum of `price * quantity`.
    #[must_use]
    pub fn total_price(&self) -> Price {
        self.cart.total_price()
    }

    /// Sum of quantities.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.cart.item_count()
    }

    #[must_use]
    pub const fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }

    #[must_use]
    pub const fn storage(&self) -> &S {
        &self.storage
    }

    #[must_use]
    pub const fn api(&self) -> &A {
        &self.api
    }

    #[must_use]
    pub const fn options(&self) -> &StoreOptions {
        &self.options
    }

    /// Update the authentication state.
    ///
    /// Going from no session to a session, or switching users, runs
    /// [`Self::synchronize`] and returns its outcome. A new token for the
    /// same user and logging out do not touch the cart.
    pub async fn set_session(&mut self, session: Option<Session>) -> Option<SyncOutcome> {
        let previous_user = self.session.as_ref().map(Session::user_id);

        let Some(session) = session else {
            if previous_user.is_some() {
                info!("Session ended, cart is now local-only");
            }
            self.session = None;
            return None;
        };

        let user_id = session.user_id();
        self.session = Some(session);
        if previous_user == Some(user_id) {
            return None;
        }

        info!(%user_id, "Session authenticated, synchronizing cart");
        Some(self.synchronize().await)
    }

    /// Attach a session whose cart was already synchronized, without merging.
    ///
    /// For processes that restart with a persisted cart and a still-valid
    /// token. Merging again would add the local quantities to the server's
    /// a second time.
    pub fn resume_session(&mut self, session: Session) {
        debug!(user_id = %session.user_id(), "Resuming session without sync");
        self.session = Some(session);
    }

    /// Add one unit of a dish, subject to the restaurant policy.
    pub async fn add_item(&mut self, selection: DishSelection) -> AddOutcome {
        match self
            .options
            .restaurant_policy
            .decide(&self.cart, selection.restaurant_id)
        {
            PolicyDecision::Proceed => AddOutcome::Added {
                path: self.apply(CartOp::Add(&selection)).await,
            },
            PolicyDecision::ReplaceFirst { previous } => {
                info!(
                    %previous,
                    incoming = %selection.restaurant_id,
                    "Dish from another restaurant, replacing cart"
                );
                self.apply(CartOp::Clear).await;
                AddOutcome::Replaced {
                    previous,
                    path: self.apply(CartOp::Add(&selection)).await,
                }
            }
            PolicyDecision::Reject { current } => {
                info!(
                    %current,
                    incoming = %selection.restaurant_id,
                    "Dish from another restaurant rejected"
                );
                AddOutcome::Rejected { current }
            }
        }
    }

    /// Remove a dish.
    pub async fn remove_item(&mut self, dish_id: DishId) -> MutationPath {
        self.apply(CartOp::Remove(dish_id)).await
    }

    /// Set a dish's quantity. Zero removes the dish.
    pub async fn update_quantity(&mut self, dish_id: DishId, quantity: u32) -> MutationPath {
        if quantity == 0 {
            return self.remove_item(dish_id).await;
        }
        self.apply(CartOp::UpdateQuantity(dish_id, quantity)).await
    }

    /// Empty the cart, locally and (when authenticated) on the server.
    pub async fn clear(&mut self) -> MutationPath {
        self.apply(CartOp::Clear).await
    }

    /// Merge the local cart with the server cart and adopt the result.
    ///
    /// Failures are logged. A 401 also drops the session.
    pub async fn synchronize(&mut self) -> SyncOutcome {
        let Some(session) = self.session.as_ref() else {
            return SyncOutcome::Skipped;
        };

        let policy = self.options.restaurant_policy;
        match sync::synchronize(&self.api, session, &self.cart, policy).await {
            Ok(cart) => {
                self.cart = cart;
                self.persist();
                info!(entries = self.cart.len(), "Cart synchronized with server");
                SyncOutcome::Synced {
                    entries: self.cart.len(),
                }
            }
            Err(e) => {
                warn!(error = %e, "Cart synchronization failed");
                if e.api_error().is_unauthorized() {
                    self.drop_session();
                }
                SyncOutcome::Failed
            }
        }
    }

    async fn apply(&mut self, op: CartOp<'_>) -> MutationPath {
        let (path, rejected) = match self.session.as_ref() {
            Some(session) => {
                let mut remote = RemoteBacked::new(&self.api, session);
                let path = remote.apply(&mut self.cart, op).await;
                (path, remote.session_rejected())
            }
            None => (LocalOnly.apply(&mut self.cart, op).await, false),
        };

        if rejected {
            self.drop_session();
        }
        self.persist();
        path
    }

    pub(crate) fn drop_session(&mut self) {
        if self.session.take().is_some() {
            warn!("Backend rejected the session, cart is now local-only");
        }
    }

    /// Write the full cart to storage. Failures are logged, not returned.
    fn persist(&self) {
        let key = &self.options.cart_key;
        let result = serde_json::to_string(&self.cart)
            .map_err(StorageError::from)
            .and_then(|json| self.storage.set(key, &json));

        if let Err(e) = result {
            error!(error = %e, %key, "Failed to persist cart");
        }
    }
}

/// Read the persisted cart, discarding anything unreadable.
fn restore<S: KeyValueStore>(storage: &S, key: &str) -> Cart {
    let raw = match storage.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return Cart::new(),
        Err(e) => {
            warn!(error = %e, %key, "Failed to read persisted cart, starting empty");
            reset(storage, key);
            return Cart::new();
        }
    };

    match serde_json::from_str::<Cart>(&raw) {
        Ok(cart) => cart,
        Err(e) => {
            warn!(error = %e, %key, "Discarding corrupt persisted cart");
            reset(storage, key);
            Cart::new()
        }
    }
}

fn reset<S: KeyValueStore>(storage: &S, key: &str) {
    if let Err(e) = storage.remove(key) {
        error!(error = %e, %key, "Failed to reset persisted cart");
    }
}

/// Drive a store from a session channel until the sender goes away.
///
/// Applies the current value first, then every change. Front ends that also
/// feed user actions into the same store can instead call
/// [`CartStore::set_session`] from their own event loop.
pub async fn watch_sessions<S: KeyValueStore, A: CartApi>(
    store: &mut CartStore<S, A>,
    mut sessions: watch::Receiver<Option<Session>>,
) {
    loop {
        let session = sessions.borrow_and_update().clone();
        store.set_session(session).await;
        if sessions.changed().await.is_err() {
            break;
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use foodcourt_core::UserId;

    use super::*;
    use crate::cart::RestaurantPolicy;
    use crate::remote::RemoteCartItem;
    use crate::storage::MemoryStore;
    use crate::testing::{FakeBackend, dish};

    fn guest_store() -> (CartStore<MemoryStore, FakeBackend>, MemoryStore, FakeBackend) {
        let storage = MemoryStore::new();
        let backend = FakeBackend::new();
        let store = CartStore::load(storage.clone(), backend.clone(), StoreOptions::default());
        (store, storage, backend)
    }

    fn session() -> Session {
        Session::new(UserId::new(1), "token")
    }

    fn reload(storage: &MemoryStore) -> CartStore<MemoryStore, FakeBackend> {
        CartStore::load(storage.clone(), FakeBackend::new(), StoreOptions::default())
    }

    #[tokio::test]
    async fn test_guest_example_scenario() {
        let (mut store, _, backend) = guest_store();

        store.add_item(dish(1, 1, 100)).await;
        store.add_item(dish(1, 1, 100)).await;
        store.add_item(dish(2, 1, 50)).await;

        let items = store.items();
        assert_eq!(items.len(), 2);
        assert_eq!((items[0].dish_id, items[0].quantity), (DishId::new(1), 2));
        assert_eq!(items[0].line_total(), Price::from_units(200));
        assert_eq!((items[1].dish_id, items[1].quantity), (DishId::new(2), 1));
        assert_eq!(store.total_price(), Price::from_units(250));
        assert_eq!(store.item_count(), 3);
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn test_persist_then_reload_round_trip() {
        let (mut store, storage, _) = guest_store();
        store.add_item(dish(1, 1, 100)).await;
        store.add_item(dish(2, 1, 50)).await;
        store.update_quantity(DishId::new(2), 4).await;

        let reloaded = reload(&storage);
        assert_eq!(reloaded.cart(), store.cart());
        assert_eq!(reloaded.total_price(), Price::from_units(300));
    }

    #[tokio::test]
    async fn test_total_tracks_every_operation() {
        let (mut store, storage, _) = guest_store();
        store.add_item(dish(1, 1, 15)).await;
        store.add_item(dish(2, 1, 40)).await;
        store.add_item(dish(3, 1, 7)).await;
        store.update_quantity(DishId::new(1), 3).await;
        store.remove_item(DishId::new(2)).await;
        store.add_item(dish(3, 1, 7)).await;

        let expected: Price = store
            .items()
            .iter()
            .map(|item| item.price.times(item.quantity))
            .sum();
        assert_eq!(store.total_price(), expected);
        assert_eq!(store.total_price(), Price::from_units(59));
        assert_eq!(reload(&storage).total_price(), expected);
    }

    #[tokio::test]
    async fn test_update_quantity_zero_removes() {
        let (mut store, storage, _) = guest_store();
        store.add_item(dish(1, 1, 100)).await;

        store.update_quantity(DishId::new(1), 0).await;
        assert!(store.cart().is_empty());
        assert!(reload(&storage).cart().is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_storage_is_discarded() {
        let storage = MemoryStore::new();
        storage.set("cart", "{not json").unwrap();

        let store = CartStore::load(storage.clone(), FakeBackend::new(), StoreOptions::default());
        assert!(store.cart().is_empty());
        assert_eq!(storage.get("cart").unwrap(), None);
    }

    #[tokio::test]
    async fn test_clear_persists_empty_cart() {
        let (mut store, storage, _) = guest_store();
        store.add_item(dish(1, 1, 100)).await;

        assert_eq!(store.clear().await, MutationPath::Local);
        assert!(reload(&storage).cart().is_empty());
    }

    #[tokio::test]
    async fn test_authenticated_remove_with_failing_server() {
        let (mut store, storage, backend) = guest_store();
        store.add_item(dish(1, 1, 100)).await;
        store.add_item(dish(2, 1, 50)).await;
        store.set_session(Some(session())).await;
        assert!(store.is_authenticated());

        backend.set_failing(true);
        let path = store.remove_item(DishId::new(1)).await;

        assert_eq!(path, MutationPath::LocalFallback);
        assert!(store.cart().get(DishId::new(1)).is_none());
        assert!(reload(&storage).cart().get(DishId::new(1)).is_none());
        assert!(store.is_authenticated());
    }

    #[tokio::test]
    async fn test_authenticated_add_goes_through_server() {
        let (mut store, _, backend) = guest_store();
        store.set_session(Some(session())).await;

        let outcome = store.add_item(dish(1, 1, 100)).await;
        assert_eq!(
            outcome,
            AddOutcome::Added {
                path: MutationPath::Remote
            }
        );
        assert_eq!(backend.quantities().get(&1), Some(&1));
        assert_eq!(store.items()[0].price, Price::from_units(100));
    }

    #[tokio::test]
    async fn test_login_merges_local_cart_into_server() {
        let storage = MemoryStore::new();
        let backend = FakeBackend::with_items(vec![
            RemoteCartItem {
                dish_id: DishId::new(1),
                quantity: 1,
                restaurant_id: RestaurantId::new(1),
                price: None,
                dish_name: None,
                dish_description: None,
            },
            RemoteCartItem {
                dish_id: DishId::new(2),
                quantity: 3,
                restaurant_id: RestaurantId::new(1),
                price: None,
                dish_name: None,
                dish_description: None,
            },
        ]);
        let mut store = CartStore::load(storage.clone(), backend.clone(), StoreOptions::default());
        store.add_item(dish(1, 1, 100)).await;
        store.add_item(dish(1, 1, 100)).await;

        let outcome = store.set_session(Some(session())).await;

        assert_eq!(outcome, Some(SyncOutcome::Synced { entries: 2 }));
        assert_eq!(store.cart().get(DishId::new(1)).unwrap().quantity, 3);
        assert_eq!(store.cart().get(DishId::new(2)).unwrap().quantity, 3);
        assert_eq!(reload(&storage).item_count(), 6);
    }

    #[tokio::test]
    async fn test_same_user_token_refresh_does_not_resync() {
        let (mut store, _, backend) = guest_store();
        store.set_session(Some(session())).await;
        let calls_after_login = backend.calls().len();

        let outcome = store
            .set_session(Some(Session::new(UserId::new(1), "refreshed")))
            .await;
        assert_eq!(outcome, None);
        assert_eq!(backend.calls().len(), calls_after_login);

        let outcome = store
            .set_session(Some(Session::new(UserId::new(2), "other")))
            .await;
        assert!(matches!(outcome, Some(SyncOutcome::Synced { .. })));
    }

    #[tokio::test]
    async fn test_resume_session_skips_merge() {
        let (mut store, _, backend) = guest_store();
        store.add_item(dish(1, 1, 100)).await;

        store.resume_session(session());
        assert!(store.is_authenticated());
        assert!(backend.calls().is_empty());

        store.update_quantity(DishId::new(1), 2).await;
        assert_eq!(backend.calls(), vec!["update:1:2", "get"]);
    }

    fn server_record(dish_id: i64, quantity: u32, restaurant: i64) -> RemoteCartItem {
        RemoteCartItem {
            dish_id: DishId::new(dish_id),
            quantity,
            restaurant_id: RestaurantId::new(restaurant),
            price: None,
            dish_name: None,
            dish_description: None,
        }
    }

    #[tokio::test]
    async fn test_login_with_other_restaurant_on_server_keeps_one_restaurant() {
        let storage = MemoryStore::new();
        let backend = FakeBackend::with_items(vec![server_record(9, 2, 2)]);
        let mut store = CartStore::load(storage.clone(), backend.clone(), StoreOptions::default());
        store.add_item(dish(1, 1, 100)).await;

        let outcome = store.set_session(Some(session())).await;

        assert_eq!(outcome, Some(SyncOutcome::Synced { entries: 1 }));
        assert!(store.cart().is_single_restaurant());
        assert_eq!(store.cart().restaurant_id(), Some(RestaurantId::new(1)));
        assert_eq!(backend.quantities(), HashMap::from([(1, 1)]));
        assert_eq!(reload(&storage).item_count(), 1);
    }

    #[tokio::test]
    async fn test_login_under_reject_keeps_server_restaurant() {
        let options = StoreOptions {
            restaurant_policy: RestaurantPolicy::Reject,
            ..StoreOptions::default()
        };
        let backend = FakeBackend::with_items(vec![server_record(9, 2, 2)]);
        let mut store = CartStore::load(MemoryStore::new(), backend.clone(), options);
        store.add_item(dish(1, 1, 100)).await;

        store.set_session(Some(session())).await;

        assert_eq!(store.cart().restaurant_id(), Some(RestaurantId::new(2)));
        assert_eq!(store.item_count(), 2);
        assert_eq!(backend.quantities(), HashMap::from([(9, 2)]));
    }

    #[tokio::test]
    async fn test_login_under_mixed_keeps_both_restaurants() {
        let options = StoreOptions {
            restaurant_policy: RestaurantPolicy::Mixed,
            ..StoreOptions::default()
        };
        let backend = FakeBackend::with_items(vec![server_record(9, 2, 2)]);
        let mut store = CartStore::load(MemoryStore::new(), backend.clone(), options);
        store.add_item(dish(1, 1, 100)).await;

        store.set_session(Some(session())).await;

        assert!(!store.cart().is_single_restaurant());
        assert_eq!(backend.quantities(), HashMap::from([(9, 2), (1, 1)]));
    }

    #[tokio::test]
    async fn test_partial_push_failure_keeps_local_cart() {
        let storage = MemoryStore::new();
        let backend =
            FakeBackend::with_items(vec![server_record(1, 1, 1), server_record(2, 3, 1)]);
        let mut store = CartStore::load(storage.clone(), backend.clone(), StoreOptions::default());
        store.add_item(dish(1, 1, 100)).await;
        store.add_item(dish(1, 1, 100)).await;
        store.add_item(dish(3, 1, 20)).await;
        let before = store.cart().clone();

        backend.fail_on("add");
        let outcome = store.set_session(Some(session())).await;

        assert_eq!(outcome, Some(SyncOutcome::Failed));
        assert_eq!(backend.quantities(), HashMap::from([(1, 3), (2, 3)]));
        assert_eq!(store.cart(), &before);
        assert_eq!(reload(&storage).cart(), &before);
        assert!(store.is_authenticated());
    }

    #[tokio::test]
    async fn test_sync_failure_keeps_local_cart() {
        let (mut store, _, backend) = guest_store();
        store.add_item(dish(1, 1, 100)).await;
        backend.set_failing(true);

        let outcome = store.set_session(Some(session())).await;
        assert_eq!(outcome, Some(SyncOutcome::Failed));
        assert_eq!(store.item_count(), 1);
        assert!(store.is_authenticated());
    }

    #[tokio::test]
    async fn test_unauthorized_drops_session() {
        let (mut store, _, backend) = guest_store();
        store.set_session(Some(session())).await;
        backend.set_unauthorized(true);

        let outcome = store.add_item(dish(1, 1, 100)).await;
        assert_eq!(
            outcome,
            AddOutcome::Added {
                path: MutationPath::LocalFallback
            }
        );
        assert!(!store.is_authenticated());

        let calls = backend.calls().len();
        assert_eq!(store.add_item(dish(1, 1, 100)).await, AddOutcome::Added {
            path: MutationPath::Local
        });
        assert_eq!(backend.calls().len(), calls);
        assert_eq!(store.item_count(), 2);
    }

    #[tokio::test]
    async fn test_logout_keeps_cart_local() {
        let (mut store, _, _) = guest_store();
        store.set_session(Some(session())).await;
        store.add_item(dish(1, 1, 100)).await;

        assert_eq!(store.set_session(None).await, None);
        assert!(!store.is_authenticated());
        assert_eq!(store.item_count(), 1);
    }

    #[tokio::test]
    async fn test_replace_policy_clears_other_restaurant() {
        let (mut store, _, _) = guest_store();
        store.add_item(dish(1, 1, 100)).await;

        let outcome = store.add_item(dish(5, 2, 30)).await;
        assert_eq!(
            outcome,
            AddOutcome::Replaced {
                previous: RestaurantId::new(1),
                path: MutationPath::Local
            }
        );
        assert_eq!(store.items().len(), 1);
        assert_eq!(store.cart().restaurant_id(), Some(RestaurantId::new(2)));
    }

    #[tokio::test]
    async fn test_reject_and_mixed_policies() {
        let options = StoreOptions {
            restaurant_policy: RestaurantPolicy::Reject,
            ..StoreOptions::default()
        };
        let mut store = CartStore::load(MemoryStore::new(), FakeBackend::new(), options);
        store.add_item(dish(1, 1, 100)).await;
        assert_eq!(
            store.add_item(dish(5, 2, 30)).await,
            AddOutcome::Rejected {
                current: RestaurantId::new(1)
            }
        );
        assert_eq!(store.item_count(), 1);

        let options = StoreOptions {
            restaurant_policy: RestaurantPolicy::Mixed,
            ..StoreOptions::default()
        };
        let mut store = CartStore::load(MemoryStore::new(), FakeBackend::new(), options);
        store.add_item(dish(1, 1, 100)).await;
        store.add_item(dish(5, 2, 30)).await;
        assert_eq!(store.items().len(), 2);
        assert!(!store.cart().is_single_restaurant());
    }

    #[tokio::test]
    async fn test_watch_sessions_syncs_on_login() {
        let (mut store, _, backend) = guest_store();
        store.add_item(dish(1, 1, 100)).await;

        let (tx, rx) = watch::channel(None);
        tx.send_replace(Some(session()));
        drop(tx);

        watch_sessions(&mut store, rx).await;

        assert!(store.is_authenticated());
        assert_eq!(backend.quantities().get(&1), Some(&1));
    }
}
