//! In-memory backend double for unit tests.
//!
//! Mirrors the backend's cart semantics: `add` accumulates quantities,
//! `update` only touches dishes it already holds, and stored records carry
//! no price or display fields.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use foodcourt_core::{CartItem, DishId, DishSelection, OrderId, OrderStatus, Price, RestaurantId};

use crate::remote::{CartApi, CartApiError, OrderApi, PlaceOrderRequest, PlacedOrder, RemoteCartItem};
use crate::session::Session;

pub fn dish(id: i64, restaurant: i64, price: i64) -> DishSelection {
    DishSelection::new(
        DishId::new(id),
        RestaurantId::new(restaurant),
        Price::from_units(price),
        format!("Dish {id}"),
    )
}

#[derive(Default)]
struct FakeState {
    items: Vec<RemoteCartItem>,
    failing: bool,
    failing_op: Option<String>,
    unauthorized: bool,
    calls: Vec<String>,
    orders: Vec<PlaceOrderRequest>,
}

#[derive(Clone, Default)]
pub struct FakeBackend {
    state: Arc<Mutex<FakeState>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_items(items: Vec<RemoteCartItem>) -> Self {
        let backend = Self::new();
        backend.state().items = items;
        backend
    }

    fn state(&self) -> std::sync::MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_failing(&self, failing: bool) {
        self.state().failing = failing;
    }

    /// Fail only calls of one kind (`"add"`, `"update"`, `"get"`, ...).
    pub fn fail_on(&self, op: &str) {
        self.state().failing_op = Some(op.to_string());
    }

    pub fn set_unauthorized(&self, unauthorized: bool) {
        self.state().unauthorized = unauthorized;
    }

    pub fn items(&self) -> Vec<RemoteCartItem> {
        self.state().items.clone()
    }

    pub fn quantities(&self) -> HashMap<i64, u32> {
        self.state()
            .items
            .iter()
            .map(|item| (item.dish_id.as_i64(), item.quantity))
            .collect()
    }

    pub fn calls(&self) -> Vec<String> {
        self.state().calls.clone()
    }

    pub fn placed_orders(&self) -> Vec<PlaceOrderRequest> {
        self.state().orders.clone()
    }

    /// Record a call and fail it if the backend is switched off.
    fn call(&self, name: String) -> Result<std::sync::MutexGuard<'_, FakeState>, CartApiError> {
        let mut state = self.state();
        let op_failing = state
            .failing_op
            .as_deref()
            .is_some_and(|op| name.split(':').next() == Some(op));
        state.calls.push(name);
        if state.unauthorized {
            return Err(CartApiError::Unauthorized);
        }
        if state.failing || op_failing {
            return Err(CartApiError::Api {
                status: 503,
                message: "backend unavailable".to_string(),
            });
        }
        Ok(state)
    }
}

impl CartApi for FakeBackend {
    async fn get_cart(&self, _session: &Session) -> Result<Vec<RemoteCartItem>, CartApiError> {
        let state = self.call("get".to_string())?;
        Ok(state.items.clone())
    }

    async fn add_item(&self, _session: &Session, item: &CartItem) -> Result<(), CartApiError> {
        let mut state = self.call(format!("add:{}:{}", item.dish_id, item.quantity))?;
        match state.items.iter_mut().find(|s| s.dish_id == item.dish_id) {
            Some(existing) => existing.quantity += item.quantity,
            None => state.items.push(RemoteCartItem {
                dish_id: item.dish_id,
                quantity: item.quantity,
                restaurant_id: item.restaurant_id,
                price: None,
                dish_name: None,
                dish_description: None,
            }),
        }
        Ok(())
    }

    async fn remove_item(&self, _session: &Session, dish_id: DishId) -> Result<(), CartApiError> {
        let mut state = self.call(format!("remove:{dish_id}"))?;
        state.items.retain(|s| s.dish_id != dish_id);
        Ok(())
    }

    async fn update_quantity(
        &self,
        _session: &Session,
        dish_id: DishId,
        quantity: u32,
    ) -> Result<(), CartApiError> {
        let mut state = self.call(format!("update:{dish_id}:{quantity}"))?;
        if let Some(existing) = state.items.iter_mut().find(|s| s.dish_id == dish_id) {
            existing.quantity = quantity;
        }
        Ok(())
    }

    async fn clear_cart(&self, _session: &Session) -> Result<(), CartApiError> {
        let mut state = self.call("clear".to_string())?;
        state.items.clear();
        Ok(())
    }
}

impl OrderApi for FakeBackend {
    async fn place_order(
        &self,
        _session: &Session,
        request: &PlaceOrderRequest,
    ) -> Result<PlacedOrder, CartApiError> {
        let mut state = self.call("place".to_string())?;
        state.orders.push(request.clone());
        let total = request
            .items
            .iter()
            .map(|line| Price::new(line.price).times(line.quantity))
            .sum();
        Ok(PlacedOrder {
            id: OrderId::new(i64::try_from(state.orders.len()).unwrap_or(i64::MAX)),
            status: OrderStatus::Pending,
            restaurant_id: Some(request.restaurant_id),
            total_price: Some(total),
        })
    }
}
