//! Cart configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All optional:
//! - `FOODCOURT_API_URL` - Backend base URL (default: `http://localhost:8080/api`)
//! - `FOODCOURT_API_TIMEOUT_SECS` - HTTP request timeout (default: 10)
//! - `FOODCOURT_STORAGE_DIR` - Directory for the file-backed cart (default: `.foodcourt`)
//! - `FOODCOURT_CART_KEY` - Storage key of the persisted cart (default: `cart`)
//! - `FOODCOURT_RESTAURANT_POLICY` - `replace`, `reject` or `mixed` (default: `replace`)

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

use crate::cart::RestaurantPolicy;

const DEFAULT_API_URL: &str = "http://localhost:8080/api";
const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_STORAGE_DIR: &str = ".foodcourt";
const DEFAULT_CART_KEY: &str = "cart";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Cart configuration.
#[derive(Debug, Clone)]
pub struct CartConfig {
    /// Backend API configuration
    pub api: ApiConfig,
    /// Directory used by the file-backed store
    pub storage_dir: PathBuf,
    /// Store options
    pub store: StoreOptions,
}

/// Backend API configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL; endpoint paths such as `cart/add` are appended to it
    pub base_url: Url,
    /// Per-request timeout
    pub timeout: Duration,
}

/// Options for [`crate::CartStore`].
#[derive(Debug, Clone)]
pub struct StoreOptions {
    /// Storage key of the persisted cart
    pub cart_key: String,
    /// Handling of dishes from a different restaurant
    pub restaurant_policy: RestaurantPolicy,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            cart_key: DEFAULT_CART_KEY.to_string(),
            restaurant_policy: RestaurantPolicy::default(),
        }
    }
}

impl CartConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but cannot be parsed.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let base_url = lookup("FOODCOURT_API_URL")
            .unwrap_or_else(|| DEFAULT_API_URL.to_string())
            .parse::<Url>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("FOODCOURT_API_URL".to_string(), e.to_string())
            })?;

        let timeout_secs = lookup("FOODCOURT_API_TIMEOUT_SECS")
            .unwrap_or_else(|| DEFAULT_TIMEOUT_SECS.to_string())
            .parse::<u64>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("FOODCOURT_API_TIMEOUT_SECS".to_string(), e.to_string())
            })?;

        let storage_dir = PathBuf::from(
            lookup("FOODCOURT_STORAGE_DIR").unwrap_or_else(|| DEFAULT_STORAGE_DIR.to_string()),
        );
        let cart_key =
            lookup("FOODCOURT_CART_KEY").unwrap_or_else(|| DEFAULT_CART_KEY.to_string());

        let restaurant_policy = match lookup("FOODCOURT_RESTAURANT_POLICY") {
            Some(raw) => raw.parse::<RestaurantPolicy>().map_err(|e| {
                ConfigError::InvalidEnvVar("FOODCOURT_RESTAURANT_POLICY".to_string(), e)
            })?,
            None => RestaurantPolicy::default(),
        };

        Ok(Self {
            api: ApiConfig {
                base_url,
                timeout: Duration::from_secs(timeout_secs),
            },
            storage_dir,
            store: StoreOptions {
                cart_key,
                restaurant_policy,
            },
        })
    }
}
