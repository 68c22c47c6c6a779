//! services/app/src/adapters/http.rs
//!
//! This module contains the HTTP adapter, which is the concrete implementation
//! of the `HttpTransport` port from the `core` crate, built on `reqwest`.

use async_trait::async_trait;
use empathy_core::ports::{ApiRequest, ApiResponse, HttpMethod, HttpTransport, PortError, PortResult};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements the `HttpTransport` port against the backend base URL.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    base_url: String,
}

impl ReqwestTransport {
    /// Creates a new `ReqwestTransport` with a per-request timeout.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> PortResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url_for(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

/// Timeouts and refused connections are transport failures; anything else
/// reqwest reports is unexpected.
fn map_reqwest_error(e: reqwest::Error) -> PortError {
    if e.is_timeout() {
        PortError::Timeout
    } else if e.is_connect() || e.is_request() {
        PortError::Unavailable(e.to_string())
    } else {
        PortError::Unexpected(e.to_string())
    }
}

/// JSON bodies are decoded; a non-JSON body is kept as a string, an empty one is `Null`.
fn decode_body(bytes: &[u8]) -> Value {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Value::Null;
    }
    serde_json::from_slice(bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).trim().to_string()))
}

//=========================================================================================
// `HttpTransport` Trait Implementation
//=========================================================================================

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: ApiRequest) -> PortResult<ApiResponse> {
        let url = self.url_for(&request.path);
        let mut builder = match request.method {
            HttpMethod::Get => self.client.get(&url),
            HttpMethod::Post => self.client.post(&url),
            HttpMethod::Put => self.client.put(&url),
        };
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(token) = &request.bearer {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(map_reqwest_error)?;
        let status = response.status().as_u16();
        let bytes = response.bytes().await.map_err(map_reqwest_error)?;
        debug!(
            method = ?request.method,
            path = %request.path,
            status,
            "Backend round-trip complete"
        );

        Ok(ApiResponse::new(status, decode_body(&bytes)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn joins_base_and_path_with_one_slash() {
        let transport =
            ReqwestTransport::new("http://localhost:5246/api/", Duration::from_secs(1)).unwrap();
        assert_eq!(
            transport.url_for("/Auth/login"),
            "http://localhost:5246/api/Auth/login"
        );
        assert_eq!(
            transport.url_for("UserStory/get-user-stories"),
            "http://localhost:5246/api/UserStory/get-user-stories"
        );
    }

    #[test]
    fn bodies_decode_leniently() {
        assert_eq!(decode_body(b""), Value::Null);
        assert_eq!(decode_body(b"  \n"), Value::Null);
        assert_eq!(decode_body(br#"{"data":[]}"#), json!({"data": []}));
        assert_eq!(
            decode_body(b"user_already_exists"),
            Value::String("user_already_exists".to_string())
        );
    }
}
