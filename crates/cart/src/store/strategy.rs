//! Mutation strategies.
//!
//! Guests mutate the cart in memory ([`LocalOnly`]). Authenticated users go
//! through the server first ([`RemoteBacked`]): write, re-fetch, adopt the
//! server cart. Any server failure degrades to the local mutation so the
//! user-visible action still succeeds.

use std::future::Future;

use foodcourt_core::{CartItem, DishId, DishSelection};
use tracing::warn;

use super::sync::adopt_server_cart;
use crate::cart::Cart;
use crate::remote::{CartApi, CartApiError};
use crate::session::Session;

/// A single cart mutation.
#[derive(Debug, Clone, Copy)]
pub enum CartOp<'a> {
    Add(&'a DishSelection),
    Remove(DishId),
    /// Set a quantity. Zero removes the dish on both paths.
    UpdateQuantity(DishId, u32),
    Clear,
}

impl CartOp<'_> {
    const fn name(&self) -> &'static str {
        match self {
            Self::Add(_) => "add",
            Self::Remove(_) => "remove",
            Self::UpdateQuantity(..) => "update_quantity",
            Self::Clear => "clear",
        }
    }
}

/// Which path a mutation took.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationPath {
    /// Applied in memory only (no session).
    Local,
    /// Applied on the server; local state re-synced from it.
    Remote,
    /// The server call failed; applied in memory instead.
    LocalFallback,
}

/// Applies [`CartOp`]s to a cart.
pub trait CartStrategy {
    fn apply(&mut self, cart: &mut Cart, op: CartOp<'_>) -> impl Future<Output = MutationPath> + Send;
}

/// In-memory mutation.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalOnly;

impl LocalOnly {
    /// Apply `op` directly to `cart`.
    pub fn mutate(cart: &mut Cart, op: CartOp<'_>) {
        match op {
            CartOp::Add(selection) => cart.add(selection),
            CartOp::Remove(dish_id) => {
                cart.remove(dish_id);
            }
            CartOp::UpdateQuantity(dish_id, quantity) => {
                cart.set_quantity(dish_id, quantity);
            }
            CartOp::Clear => cart.clear(),
        }
    }
}

impl CartStrategy for LocalOnly {
    async fn apply(&mut self, cart: &mut Cart, op: CartOp<'_>) -> MutationPath {
        Self::mutate(cart, op);
        MutationPath::Local
    }
}

/// Server-first mutation with local fallback.
pub struct RemoteBacked<'a, A> {
    api: &'a A,
    session: &'a Session,
    session_rejected: bool,
}

impl<'a, A: CartApi> RemoteBacked<'a, A> {
    #[must_use]
    pub const fn new(api: &'a A, session: &'a Session) -> Self {
        Self {
            api,
            session,
            session_rejected: false,
        }
    }

    /// Whether the backend answered 401 during the last `apply`.
    #[must_use]
    pub const fn session_rejected(&self) -> bool {
        self.session_rejected
    }

    async fn try_remote(&self, cart: &mut Cart, op: CartOp<'_>) -> Result<(), CartApiError> {
        match op {
            CartOp::Add(selection) => {
                let item = CartItem::from_selection(selection.clone());
                self.api.add_item(self.session, &item).await?;
                self.refresh(cart, Some(item)).await
            }
            CartOp::Remove(dish_id) | CartOp::UpdateQuantity(dish_id, 0) => {
                self.api.remove_item(self.session, dish_id).await?;
                self.refresh(cart, None).await
            }
            CartOp::UpdateQuantity(dish_id, quantity) => {
                self.api
                    .update_quantity(self.session, dish_id, quantity)
                    .await?;
                self.refresh(cart, None).await
            }
            CartOp::Clear => {
                self.api.clear_cart(self.session).await?;
                cart.clear();
                Ok(())
            }
        }
    }

    /// Re-fetch the server cart and make it the local state.
    async fn refresh(&self, cart: &mut Cart, added: Option<CartItem>) -> Result<(), CartApiError> {
        let server = self.api.get_cart(self.session).await?;
        let mut known = cart.clone().into_items();
        known.extend(added);
        *cart = adopt_server_cart(server, &known);
        Ok(())
    }
}

impl<A: CartApi> CartStrategy for RemoteBacked<'_, A> {
    async fn apply(&mut self, cart: &mut Cart, op: CartOp<'_>) -> MutationPath {
        match self.try_remote(cart, op).await {
            Ok(()) => MutationPath::Remote,
            Err(e) => {
                self.session_rejected = e.is_unauthorized();
                warn!(error = %e, op = op.name(), "Server cart call failed, applying locally");
                LocalOnly::mutate(cart, op);
                MutationPath::LocalFallback
            }
        }
    }
}
