//! Command implementations.
//!
//! Every command opens the file-backed store, attaches the session from the
//! environment when one is configured, and runs a single operation.

pub mod cart;
pub mod checkout;

use foodcourt_cart::{
    CartApiError, CartConfig, CartStore, CheckoutError, ConfigError, FileStore, HttpCartClient,
    Session,
};
use foodcourt_core::UserId;
use thiserror::Error;

pub type Store = CartStore<FileStore, HttpCartClient>;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Backend client error: {0}")]
    Client(#[from] CartApiError),

    #[error("Checkout failed: {0}")]
    Checkout(#[from] CheckoutError),

    /// Session variables are incomplete or malformed.
    #[error("Invalid session: {0}")]
    Session(String),

    /// An argument could not be parsed.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The command needs a session but none is configured.
    #[error("Not logged in: set FOODCOURT_ACCESS_TOKEN and FOODCOURT_USER_ID")]
    NotLoggedIn,
}

/// Read the session from `FOODCOURT_ACCESS_TOKEN` and `FOODCOURT_USER_ID`.
///
/// Returns `None` when neither is set.
fn session_from_env() -> Result<Option<Session>, CommandError> {
    let token = std::env::var("FOODCOURT_ACCESS_TOKEN").ok();
    let user_id = std::env::var("FOODCOURT_USER_ID").ok();

    match (token, user_id) {
        (None, None) => Ok(None),
        (Some(token), Some(user_id)) => {
            let user_id: UserId = user_id
                .parse()
                .map_err(|e| CommandError::Session(format!("FOODCOURT_USER_ID: {e}")))?;
            Ok(Some(Session::new(user_id, token)))
        }
        _ => Err(CommandError::Session(
            "FOODCOURT_ACCESS_TOKEN and FOODCOURT_USER_ID must be set together".to_string(),
        )),
    }
}

/// Open the persisted store.
///
/// The session, if any, is returned separately so each command decides
/// whether attaching it should trigger a merge.
fn open_store() -> Result<(Store, Option<Session>), CommandError> {
    let config = CartConfig::from_env()?;
    let session = session_from_env()?;

    tracing::debug!(dir = %config.storage_dir.display(), "Opening cart store");
    let storage = FileStore::new(&config.storage_dir);
    let api = HttpCartClient::new(&config.api)?;

    Ok((CartStore::load(storage, api, config.store), session))
}

/// Open the store with the environment session attached, without merging.
fn open_resumed() -> Result<Store, CommandError> {
    let (mut store, session) = open_store()?;
    if let Some(session) = session {
        store.resume_session(session);
    }
    Ok(store)
}
