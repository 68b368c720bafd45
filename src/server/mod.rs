//! HTTP implementation of the remote list authority.

mod auth;
mod error;
mod lists;
mod routes;

pub use auth::TokenTable;
pub use error::ApiError;
pub use lists::{ListError, UserLists};

use crate::config::{AuthConfig, ServerConfig};
use crate::remote::API_PATH;
use crate::store::StoreError;
use axum::{routing::get, Router};
use std::collections::HashMap;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct ServerState {
    pub lists: Arc<UserLists>,
    pub tokens: Arc<TokenTable>,
    pub auth_config: Arc<AuthConfig>,
}

impl ServerState {
    /// State backed by the database file named in `config`.
    pub fn open(config: &ServerConfig) -> Result<Self, StoreError> {
        Ok(Self {
            lists: Arc::new(UserLists::open(&config.database)?),
            tokens: Arc::new(TokenTable::new(config.tokens.clone())),
            auth_config: Arc::new(config.auth.clone()),
        })
    }

    /// State that lives only as long as the process.
    pub fn in_memory(tokens: HashMap<String, String>) -> Result<Self, StoreError> {
        Ok(Self {
            lists: Arc::new(UserLists::in_memory()?),
            tokens: Arc::new(TokenTable::new(tokens)),
            auth_config: Arc::new(AuthConfig::default()),
        })
    }
}

pub fn create_router(state: ServerState) -> Router {
    Router::new()
        .route("/health", get(routes::health))
        .route("/auth_config.json", get(routes::auth_config))
        .route(
            API_PATH,
            get(routes::get_list)
                .post(routes::append_item)
                .delete(routes::remove_item)
                .put(routes::replace_list),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
