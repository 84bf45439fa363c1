//! # REST Client
//!
//! Thin JSON-over-HTTP wrapper around `reqwest`, one instance per backend
//! service. The bearer token slot is shared, so a login applies to every
//! service at once.
//!
//! ## Request Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  get / post / delete                                                    │
//! │       │                                                                 │
//! │       ├── url = base_url + "/" + path                                  │
//! │       ├── Authorization: Bearer <token>   (if logged in)               │
//! │       ▼                                                                 │
//! │  reqwest::Client (timeout from ClientConfig)                           │
//! │       │                                                                 │
//! │       ├── 2xx → decode JSON body (or raw bytes for receipts),          │
//! │       │         an empty body decodes as JSON `null`                    │
//! │       ├── 401 → Unauthorized                                           │
//! │       ├── 403 → Forbidden                                              │
//! │       ├── 404 → NotFound                                               │
//! │       └── other → Api { status, message }                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! No retries: every call is a single attempt.

use reqwest::{header, Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tracing::debug;

use crate::error::{ClientError, ClientResult};

/// Bearer token shared between the REST clients of one session.
pub type TokenSlot = Arc<RwLock<Option<String>>>;

/// Error body shapes the backends use.
#[derive(Deserialize)]
struct ErrorBody {
    #[serde(alias = "error")]
    message: String,
}

#[derive(Debug, Clone)]
pub struct RestClient {
    client: Client,
    base_url: String,
    token: TokenSlot,
}

impl RestClient {
    pub fn new(base_url: &str, timeout: Duration) -> ClientResult<Self> {
        Self::with_token_slot(base_url, timeout, TokenSlot::default())
    }

    /// Builds a client that reads its bearer token from `token`.
    pub fn with_token_slot(
        base_url: &str,
        timeout: Duration,
        token: TokenSlot,
    ) -> ClientResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Replaces (or clears) the bearer token for every client sharing the slot.
    pub fn set_token(&self, token: Option<String>) {
        let mut slot = self.token.write().unwrap_or_else(|e| e.into_inner());
        *slot = token;
    }

    pub fn token(&self) -> Option<String> {
        self.token.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn auth_header(&self) -> Option<String> {
        self.token().map(|t| format!("Bearer {}", t))
    }

    async fn send(&self, req: RequestBuilder) -> ClientResult<Response> {
        let req = match self.auth_header() {
            Some(auth) => req.header(header::AUTHORIZATION, auth),
            None => req,
        };
        let response = req.send().await?;
        let status = response.status();
        debug!(url = %response.url(), status = status.as_u16(), "HTTP response");

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(status_error(status, text));
        }
        Ok(response)
    }

    async fn handle_response<T: DeserializeOwned>(&self, response: Response) -> ClientResult<T> {
        let bytes = response.bytes().await?;
        decode_body(&bytes)
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        let response = self.send(self.client.get(self.url(path))).await?;
        self.handle_response(response).await
    }

    pub async fn get_with_query<T, Q>(&self, path: &str, query: &Q) -> ClientResult<T>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        let response = self
            .send(self.client.get(self.url(path)).query(query))
            .await?;
        self.handle_response(response).await
    }

    pub async fn post<T, B>(&self, path: &str, body: &B) -> ClientResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let response = self.send(self.client.post(self.url(path)).json(body)).await?;
        self.handle_response(response).await
    }

    /// POST whose response body is ignored.
    pub async fn post_unit<B>(&self, path: &str, body: &B) -> ClientResult<()>
    where
        B: Serialize + ?Sized,
    {
        self.send(self.client.post(self.url(path)).json(body)).await?;
        Ok(())
    }

    /// POST returning the raw body and its content type (binary documents).
    pub async fn post_bytes<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> ClientResult<(String, Vec<u8>)> {
        let response = self.send(self.client.post(self.url(path)).json(body)).await?;
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = response.bytes().await?;
        Ok((content_type, bytes.to_vec()))
    }

    /// DELETE whose response body is ignored.
    pub async fn delete(&self, path: &str) -> ClientResult<()> {
        self.send(self.client.delete(self.url(path))).await?;
        Ok(())
    }
}

/// Decodes a success body. `201 Created` with no content reads as `null`.
fn decode_body<T: DeserializeOwned>(bytes: &[u8]) -> ClientResult<T> {
    let result = if bytes.iter().all(u8::is_ascii_whitespace) {
        serde_json::from_value(serde_json::Value::Null)
    } else {
        serde_json::from_slice(bytes)
    };
    result.map_err(|e| ClientError::InvalidResponse(e.to_string()))
}

/// Maps a non-success status and its body to a `ClientError`.
fn status_error(status: StatusCode, text: String) -> ClientError {
    let message = serde_json::from_str::<ErrorBody>(&text)
        .map(|b| b.message)
        .unwrap_or(text);

    match status {
        StatusCode::UNAUTHORIZED => ClientError::Unauthorized,
        StatusCode::FORBIDDEN => ClientError::Forbidden(message),
        StatusCode::NOT_FOUND => ClientError::NotFound(message),
        _ => ClientError::Api {
            status: status.as_u16(),
            message,
        },
    }
}
