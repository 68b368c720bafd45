//! Remote list authority: the server-side store of record.
//!
//! [`RemoteList`] is the seam the sync engine talks to. [`HttpRemote`] is
//! the JSON-over-HTTP implementation against `/api/identicon`.

use crate::auth::AuthError;
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

pub const API_PATH: &str = "/api/identicon";

/// `{ "iconList": [...] }`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IconList {
    pub icon_list: Vec<String>,
}

/// `{ "iconValue": "..." }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IconValue {
    pub icon_value: String,
}

/// `{ "msg": "..." }`, the body of every error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiMessage {
    pub msg: String,
}

#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    #[error("login required")]
    AuthRequired,
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("server error ({status}): {message}")]
    Server { status: u16, message: String },
    #[error("invalid response: {0}")]
    Decode(String),
}

impl RemoteError {
    /// Whether this failure leaves the remote possibly behind the local
    /// mirror, i.e. whether it should mark the sync-needed flag.
    ///
    /// Auth failures wait for a re-login; conflicts and missing values mean
    /// the server already has the end state the client wanted.
    pub fn requires_sync(&self) -> bool {
        match self {
            RemoteError::Network(_) | RemoteError::Server { .. } | RemoteError::Decode(_) => true,
            RemoteError::AuthRequired | RemoteError::Conflict(_) | RemoteError::NotFound(_) => {
                false
            }
        }
    }
}

impl From<AuthError> for RemoteError {
    fn from(_: AuthError) -> Self {
        RemoteError::AuthRequired
    }
}

/// Operations the sync core needs from the store of record. The user is
/// identified by the bearer token; calls without a token are best-effort
/// and expected to be rejected.
#[async_trait]
pub trait RemoteList: Send + Sync {
    /// Current list. Unknown users get an empty list.
    async fn read(&self, token: &str) -> Result<Vec<String>, RemoteError>;

    /// Append `value`; `Conflict` if it is already present.
    async fn append(&self, token: Option<&str>, value: &str) -> Result<Vec<String>, RemoteError>;

    /// Remove `value`; `NotFound` if it is absent.
    async fn remove(&self, token: Option<&str>, value: &str) -> Result<Vec<String>, RemoteError>;

    /// Overwrite the whole list.
    async fn replace(&self, token: &str, items: &[String]) -> Result<(), RemoteError>;
}

/// [`RemoteList`] over HTTP using reqwest.
pub struct HttpRemote {
    client: Client,
    endpoint: String,
}

impl HttpRemote {
    pub fn new(server_url: &str, timeout: Duration) -> Result<Self, RemoteError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RemoteError::Network(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: format!("{}{}", server_url.trim_end_matches('/'), API_PATH),
        })
    }

    fn request(&self, method: Method, token: Option<&str>) -> RequestBuilder {
        let req = self.client.request(method, &self.endpoint);
        match token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    async fn send<T: DeserializeOwned>(req: RequestBuilder) -> Result<T, RemoteError> {
        let resp = req
            .send()
            .await
            .map_err(|e| RemoteError::Network(e.to_string()))?;
        let resp = check_status(resp).await?;
        resp.json::<T>()
            .await
            .map_err(|e| RemoteError::Decode(e.to_string()))
    }
}

async fn check_status(resp: Response) -> Result<Response, RemoteError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let body = resp.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ApiMessage>(&body)
        .map(|m| m.msg)
        .unwrap_or(body);
    debug!("Remote responded {}: {}", status, message);

    Err(classify(status, message))
}

/// Only the list's own rejections count as Conflict/NotFound. A 400 or 404
/// from anything else (a proxy, a wrong base path) is a server failure.
fn classify(status: StatusCode, message: String) -> RemoteError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => RemoteError::AuthRequired,
        StatusCode::BAD_REQUEST | StatusCode::CONFLICT if message.contains("already saved") => {
            RemoteError::Conflict(message)
        }
        StatusCode::NOT_FOUND if message.contains("does not exist") => {
            RemoteError::NotFound(message)
        }
        _ => RemoteError::Server {
            status: status.as_u16(),
            message,
        },
    }
}

#[async_trait]
impl RemoteList for HttpRemote {
    async fn read(&self, token: &str) -> Result<Vec<String>, RemoteError> {
        let list: IconList = Self::send(self.request(Method::GET, Some(token))).await?;
        Ok(list.icon_list)
    }

    async fn append(&self, token: Option<&str>, value: &str) -> Result<Vec<String>, RemoteError> {
        let body = IconValue {
            icon_value: value.to_string(),
        };
        let list: IconList = Self::send(self.request(Method::POST, token).json(&body)).await?;
        Ok(list.icon_list)
    }

    async fn remove(&self, token: Option<&str>, value: &str) -> Result<Vec<String>, RemoteError> {
        let body = IconValue {
            icon_value: value.to_string(),
        };
        let list: IconList = Self::send(self.request(Method::DELETE, token).json(&body)).await?;
        Ok(list.icon_list)
    }

    async fn replace(&self, token: &str, items: &[String]) -> Result<(), RemoteError> {
        let body = IconList {
            icon_list: items.to_vec(),
        };
        let resp = self
            .request(Method::PUT, Some(token))
            .json(&body)
            .send()
            .await
            .map_err(|e| RemoteError::Network(e.to_string()))?;
        check_status(resp).await?;
        Ok(())
    }
}
