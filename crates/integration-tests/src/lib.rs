//! Integration tests for the Foodcourt cart.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p foodcourt-integration-tests
//! ```
//!
//! No external services are needed: [`MockBackend`] serves the cart and order
//! endpoints on an ephemeral local port, with the same semantics as the real
//! backend (additive `add`, absolute `update`, 401 on a bad token).
//!
//! # Test Categories
//!
//! - `client` - `HttpCartClient` wire format and error mapping
//! - `store_sync` - Store mutations and login merge over HTTP
//! - `checkout` - Order placement end to end
//! - `persistence` - File-backed cart across store restarts

use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use foodcourt_cart::ApiConfig;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Token the mock accepts.
pub const VALID_TOKEN: &str = "valid-token";

/// A cart record as the backend stores it: no price, no display fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartRecord {
    pub dish_id: i64,
    pub quantity: u32,
    pub restaurant_id: i64,
}

#[derive(Default)]
struct MockState {
    items: Vec<CartRecord>,
    orders: Vec<Value>,
    requests: Vec<String>,
    unavailable: bool,
}

#[derive(Deserialize)]
struct QuantityQuery {
    quantity: u32,
}

type Shared = Arc<Mutex<MockState>>;

/// In-process backend serving the cart and order endpoints.
pub struct MockBackend {
    addr: SocketAddr,
    state: Shared,
}

impl MockBackend {
    /// Bind to `127.0.0.1:0` and start serving in the background.
    ///
    /// # Errors
    ///
    /// Returns error if the listener cannot be bound.
    pub async fn start() -> std::io::Result<Self> {
        let state = Shared::default();
        let app = router(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        tokio::spawn(async move { axum::serve(listener, app).await });

        Ok(Self { addr, state })
    }

    /// Client configuration pointing at this backend.
    #[must_use]
    pub fn api_config(&self) -> ApiConfig {
        ApiConfig {
            base_url: format!("http://{}/api", self.addr)
                .parse()
                .unwrap_or_else(|e| panic!("mock address is a valid URL: {e}")),
            timeout: std::time::Duration::from_secs(5),
        }
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Seed the server cart.
    pub fn seed(&self, items: Vec<CartRecord>) {
        self.state().items = items;
    }

    /// Current server cart.
    #[must_use]
    pub fn items(&self) -> Vec<CartRecord> {
        self.state().items.clone()
    }

    /// Quantity held for a dish, if any.
    #[must_use]
    pub fn quantity_of(&self, dish_id: i64) -> Option<u32> {
        self.state()
            .items
            .iter()
            .find(|item| item.dish_id == dish_id)
            .map(|item| item.quantity)
    }

    /// Order bodies received, in order.
    #[must_use]
    pub fn orders(&self) -> Vec<Value> {
        self.state().orders.clone()
    }

    /// Requests received as `METHOD path`, in order.
    #[must_use]
    pub fn requests(&self) -> Vec<String> {
        self.state().requests.clone()
    }

    /// Answer every request with 503 while set.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.state().unavailable = unavailable;
    }
}

/// Shorthand for a seeded record.
#[must_use]
pub const fn record(dish_id: i64, quantity: u32, restaurant_id: i64) -> CartRecord {
    CartRecord {
        dish_id,
        quantity,
        restaurant_id,
    }
}

fn router(state: Shared) -> Router {
    Router::new()
        .route("/api/cart", get(get_cart))
        .route("/api/cart/add", post(add_item))
        .route("/api/cart/remove/{dish_id}", delete(remove_item))
        .route("/api/cart/update/{dish_id}", put(update_quantity))
        .route("/api/cart/clear", delete(clear_cart))
        .route("/api/orders/place", post(place_order))
        .with_state(state)
}

/// Log the request and check availability and credentials.
fn admit<'a>(
    state: &'a Shared,
    headers: &HeaderMap,
    request: String,
) -> Result<MutexGuard<'a, MockState>, StatusCode> {
    let mut guard = state.lock().unwrap_or_else(PoisonError::into_inner);
    guard.requests.push(request);

    if guard.unavailable {
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    }
    let authorized = headers
        .get("authorization")
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value == format!("Bearer {VALID_TOKEN}"));
    if !authorized {
        return Err(StatusCode::UNAUTHORIZED);
    }
    let ajax = headers
        .get("x-requested-with")
        .is_some_and(|value| value == "XMLHttpRequest");
    if !ajax {
        return Err(StatusCode::BAD_REQUEST);
    }
    Ok(guard)
}

async fn get_cart(
    State(state): State<Shared>,
    headers: HeaderMap,
) -> Result<Json<Vec<CartRecord>>, StatusCode> {
    let guard = admit(&state, &headers, "GET /cart".to_string())?;
    Ok(Json(guard.items.clone()))
}

async fn add_item(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<CartRecord>,
) -> Result<StatusCode, StatusCode> {
    let mut guard = admit(&state, &headers, "POST /cart/add".to_string())?;
    match guard.items.iter_mut().find(|item| item.dish_id == body.dish_id) {
        Some(existing) => existing.quantity += body.quantity,
        None => guard.items.push(body),
    }
    Ok(StatusCode::OK)
}

async fn remove_item(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(dish_id): Path<i64>,
) -> Result<StatusCode, StatusCode> {
    let mut guard = admit(&state, &headers, format!("DELETE /cart/remove/{dish_id}"))?;
    guard.items.retain(|item| item.dish_id != dish_id);
    Ok(StatusCode::OK)
}

async fn update_quantity(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(dish_id): Path<i64>,
    Query(query): Query<QuantityQuery>,
) -> Result<StatusCode, StatusCode> {
    let mut guard = admit(
        &state,
        &headers,
        format!("PUT /cart/update/{dish_id}?quantity={}", query.quantity),
    )?;
    // Unknown dishes are ignored, like the real service.
    if let Some(existing) = guard.items.iter_mut().find(|item| item.dish_id == dish_id) {
        existing.quantity = query.quantity;
    }
    Ok(StatusCode::OK)
}

async fn clear_cart(
    State(state): State<Shared>,
    headers: HeaderMap,
) -> Result<StatusCode, StatusCode> {
    let mut guard = admit(&state, &headers, "DELETE /cart/clear".to_string())?;
    guard.items.clear();
    Ok(StatusCode::OK)
}

async fn place_order(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Result<Json<Value>, StatusCode> {
    let mut guard = admit(&state, &headers, "POST /orders/place".to_string())?;

    let total: f64 = body["items"]
        .as_array()
        .ok_or(StatusCode::BAD_REQUEST)?
        .iter()
        .map(|line| line["price"].as_f64().unwrap_or(0.0) * line["quantity"].as_f64().unwrap_or(0.0))
        .sum();
    let restaurant_id = body["restaurantId"].clone();

    guard.orders.push(body);
    let id = guard.orders.len();

    Ok(Json(json!({
        "id": id,
        "status": "PENDING",
        "restaurantId": restaurant_id,
        "totalPrice": total,
    })))
}
