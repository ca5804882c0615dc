//! `reqwest` implementation of the cart and order API.

use std::sync::Arc;

use foodcourt_core::{CartItem, DishId};
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::{RequestBuilder, StatusCode};
use tracing::{debug, instrument};

use super::{CartApi, CartApiError, OrderApi, PlaceOrderRequest, PlacedOrder, RemoteCartItem};
use crate::config::ApiConfig;
use crate::session::Session;

/// Longest slice of a response body kept in error messages.
const ERROR_BODY_LIMIT: usize = 200;

/// HTTP client for the backend cart and order endpoints.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Clone)]
pub struct HttpCartClient {
    inner: Arc<HttpCartClientInner>,
}

struct HttpCartClientInner {
    client: reqwest::Client,
    base_url: String,
}

impl HttpCartClient {
    /// Create a new client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &ApiConfig) -> Result<Self, CartApiError> {
        let mut headers = HeaderMap::new();
        headers.insert("X-Requested-With", HeaderValue::from_static("XMLHttpRequest"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(HttpCartClientInner {
                client,
                base_url: config.base_url.as_str().trim_end_matches('/').to_string(),
            }),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.inner.base_url)
    }

    /// Send an authenticated request and return the response body.
    async fn execute(
        &self,
        request: RequestBuilder,
        session: &Session,
    ) -> Result<String, CartApiError> {
        let response = request
            .header(AUTHORIZATION, session.bearer())
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(CartApiError::Unauthorized);
        }

        let body = response.text().await?;

        if !status.is_success() {
            tracing::error!(
                status = %status,
                body = %body.chars().take(500).collect::<String>(),
                "Cart API returned non-success status"
            );
            return Err(CartApiError::Api {
                status: status.as_u16(),
                message: body.chars().take(ERROR_BODY_LIMIT).collect(),
            });
        }

        Ok(body)
    }
}

impl CartApi for HttpCartClient {
    #[instrument(skip_all, fields(user_id = %session.user_id()))]
    async fn get_cart(&self, session: &Session) -> Result<Vec<RemoteCartItem>, CartApiError> {
        let request = self.inner.client.get(self.endpoint("cart"));
        let body = self.execute(request, session).await?;

        let items: Vec<RemoteCartItem> = match serde_json::from_str(&body) {
            Ok(items) => items,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    body = %body.chars().take(500).collect::<String>(),
                    "Failed to parse server cart"
                );
                return Err(CartApiError::Parse(e));
            }
        };

        debug!(count = items.len(), "Fetched server cart");
        Ok(items)
    }

    #[instrument(skip_all, fields(user_id = %session.user_id(), dish_id = %item.dish_id))]
    async fn add_item(&self, session: &Session, item: &CartItem) -> Result<(), CartApiError> {
        let body = RemoteCartItem::from(item);
        let request = self.inner.client.post(self.endpoint("cart/add")).json(&body);
        self.execute(request, session).await?;
        Ok(())
    }

    #[instrument(skip(self, session), fields(user_id = %session.user_id()))]
    async fn remove_item(&self, session: &Session, dish_id: DishId) -> Result<(), CartApiError> {
        let request = self
            .inner
            .client
            .delete(self.endpoint(&format!("cart/remove/{dish_id}")));
        self.execute(request, session).await?;
        Ok(())
    }

    #[instrument(skip(self, session), fields(user_id = %session.user_id()))]
    async fn update_quantity(
        &self,
        session: &Session,
        dish_id: DishId,
        quantity: u32,
    ) -> Result<(), CartApiError> {
        let request = self.inner.client.put(
            self.endpoint(&format!("cart/update/{dish_id}?quantity={quantity}")),
        );
        self.execute(request, session).await?;
        Ok(())
    }

    #[instrument(skip_all, fields(user_id = %session.user_id()))]
    async fn clear_cart(&self, session: &Session) -> Result<(), CartApiError> {
        let request = self.inner.client.delete(self.endpoint("cart/clear"));
        self.execute(request, session).await?;
        Ok(())
    }
}

impl OrderApi for HttpCartClient {
    #[instrument(skip_all, fields(user_id = %session.user_id(), restaurant_id = %request.restaurant_id))]
    async fn place_order(
        &self,
        session: &Session,
        request: &PlaceOrderRequest,
    ) -> Result<PlacedOrder, CartApiError> {
        let http = self
            .inner
            .client
            .post(self.endpoint("orders/place"))
            .json(request);
        let body = self.execute(http, session).await?;
        Ok(serde_json::from_str(&body)?)
    }
}
