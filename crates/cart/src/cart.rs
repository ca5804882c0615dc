//! In-memory cart collection.
//!
//! [`Cart`] owns the entries and enforces the shape invariants: one entry per
//! dish, quantities of at least one, insertion order preserved. It knows
//! nothing about storage or the network.

use std::str::FromStr;

use foodcourt_core::{CartItem, DishId, DishSelection, Price, RestaurantId};
use serde::{Deserialize, Serialize};

/// The user's pending selection, keyed by dish.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<CartItem>", into = "Vec<CartItem>")]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    /// Create an empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Build a cart from raw entries.
    ///
    /// Entries with a zero quantity are dropped and duplicate dishes are
    /// folded into the first occurrence, so data from storage or the server
    /// always lands in a valid shape.
    #[must_use]
    pub fn from_items(items: impl IntoIterator<Item = CartItem>) -> Self {
        let mut cart = Self::new();
        for item in items {
            if item.quantity == 0 {
                continue;
            }
            match cart.get_mut(item.dish_id) {
                Some(existing) => existing.quantity = existing.quantity.saturating_add(item.quantity),
                None => cart.items.push(item),
            }
        }
        cart
    }

    /// Entries in insertion order.
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of distinct dishes.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.items.len()
    }

    /// Look up the entry for a dish.
    #[must_use]
    pub fn get(&self, dish_id: DishId) -> Option<&CartItem> {
        self.items.iter().find(|item| item.dish_id == dish_id)
    }

    fn get_mut(&mut self, dish_id: DishId) -> Option<&mut CartItem> {
        self.items.iter_mut().find(|item| item.dish_id == dish_id)
    }

    /// Add one unit of a dish.
    ///
    /// Increments the existing entry, or inserts a new one with quantity 1.
    pub fn add(&mut self, selection: &DishSelection) {
        match self.get_mut(selection.dish_id) {
            Some(existing) => existing.quantity = existing.quantity.saturating_add(1),
            None => self.items.push(CartItem::from_selection(selection.clone())),
        }
    }

    /// Remove a dish. Returns the removed entry, if any.
    pub fn remove(&mut self, dish_id: DishId) -> Option<CartItem> {
        let index = self.items.iter().position(|item| item.dish_id == dish_id)?;
        Some(self.items.remove(index))
    }

    /// Set the quantity of a dish.
    ///
    /// A quantity of zero removes the entry. Unknown dishes are left alone.
    /// Returns `true` if the cart changed.
    pub fn set_quantity(&mut self, dish_id: DishId, quantity: u32) -> bool {
        if quantity == 0 {
            return self.remove(dish_id).is_some();
        }
        match self.get_mut(dish_id) {
            Some(existing) if existing.quantity != quantity => {
                existing.quantity = quantity;
                true
            }
            _ => false,
        }
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Sum of `price * quantity` over all entries.
    #[must_use]
    pub fn total_price(&self) -> Price {
        self.items.iter().map(CartItem::line_total).sum()
    }

    /// Sum of quantities over all entries.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.quantity)).sum()
    }

    /// The restaurant the cart is ordering from: the first entry's.
    #[must_use]
    pub fn restaurant_id(&self) -> Option<RestaurantId> {
        self.items.first().map(|item| item.restaurant_id)
    }

    /// Whether every entry comes from the same restaurant.
    #[must_use]
    pub fn is_single_restaurant(&self) -> bool {
        self.restaurant_id()
            .is_none_or(|first| self.items.iter().all(|item| item.restaurant_id == first))
    }

    #[must_use]
    pub fn into_items(self) -> Vec<CartItem> {
        self.items
    }
}

impl From<Vec<CartItem>> for Cart {
    fn from(items: Vec<CartItem>) -> Self {
        Self::from_items(items)
    }
}

impl From<Cart> for Vec<CartItem> {
    fn from(cart: Cart) -> Self {
        cart.items
    }
}

/// What to do when a dish from another restaurant is added.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RestaurantPolicy {
    /// Empty the cart, then add the new dish.
    #[default]
    Replace,
    /// Refuse the add and keep the cart as is.
    Reject,
    /// Allow dishes from several restaurants in one cart.
    Mixed,
}

/// Result of checking an add against the [`RestaurantPolicy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyDecision {
    Proceed,
    ReplaceFirst { previous: RestaurantId },
    Reject { current: RestaurantId },
}

impl RestaurantPolicy {
    /// Decide how an add of a dish from `incoming` applies to `cart`.
    #[must_use]
    pub fn decide(self, cart: &Cart, incoming: RestaurantId) -> PolicyDecision {
        match cart.restaurant_id() {
            Some(current) if current != incoming => match self {
                Self::Replace => PolicyDecision::ReplaceFirst { previous: current },
                Self::Reject => PolicyDecision::Reject { current },
                Self::Mixed => PolicyDecision::Proceed,
            },
            _ => PolicyDecision::Proceed,
        }
    }
}

impl FromStr for RestaurantPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "replace" => Ok(Self::Replace),
            "reject" => Ok(Self::Reject),
            "mixed" => Ok(Self::Mixed),
            other => Err(format!(
                "expected one of replace, reject, mixed (got '{other}')"
            )),
        }
    }
}
