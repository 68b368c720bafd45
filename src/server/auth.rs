use super::error::ApiError;
use axum::http::{header::AUTHORIZATION, HeaderMap};
use std::collections::HashMap;

/// Maps bearer tokens to user ids.
///
/// Token issuance belongs to the external identity provider; the server
/// only has to answer "does this request carry a valid token, and for
/// whom".
pub struct TokenTable {
    tokens: HashMap<String, String>,
}

impl TokenTable {
    pub fn new(tokens: HashMap<String, String>) -> Self {
        Self { tokens }
    }

    /// User id for the request's `Authorization: Bearer ...` header.
    pub fn authenticate(&self, headers: &HeaderMap) -> Result<String, ApiError> {
        let token = headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .ok_or(ApiError::Unauthorized)?;

        self.tokens
            .get(token)
            .cloned()
            .ok_or(ApiError::Unauthorized)
    }
}
