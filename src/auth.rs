//! Client side of the authentication boundary.
//!
//! Tokens are issued by an external identity provider; this crate only
//! needs something that hands out the current bearer token or says the
//! user has to log in again.

use async_trait::async_trait;
use tokio::sync::RwLock;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("login required")]
    LoginRequired,
}

#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Current bearer token for the signed-in user.
    async fn token(&self) -> Result<String, AuthError>;

    /// Forget any cached credentials.
    async fn logout(&self);
}

/// Token provider backed by a token supplied up front (config, flag or env).
pub struct StaticToken {
    token: RwLock<Option<String>>,
}

impl StaticToken {
    pub fn new(token: Option<String>) -> Self {
        Self {
            token: RwLock::new(token.filter(|t| !t.is_empty())),
        }
    }
}

#[async_trait]
impl TokenProvider for StaticToken {
    async fn token(&self) -> Result<String, AuthError> {
        self.token.read().await.clone().ok_or(AuthError::LoginRequired)
    }

    async fn logout(&self) {
        *self.token.write().await = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_token_requires_login() {
        let provider = StaticToken::new(None);
        assert_eq!(provider.token().await, Err(AuthError::LoginRequired));

        let provider = StaticToken::new(Some(String::new()));
        assert_eq!(provider.token().await, Err(AuthError::LoginRequired));
    }

    #[tokio::test]
    async fn test_logout_drops_token() {
        let provider = StaticToken::new(Some("secret".to_string()));
        assert_eq!(provider.token().await.unwrap(), "secret");

        provider.logout().await;
        assert_eq!(provider.token().await, Err(AuthError::LoginRequired));
    }
}
