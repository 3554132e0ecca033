//! HTTP Transport Seam
//!
//! Providers describe their calls as [`WireRequest`] values and hand them
//! to a [`Transport`]. Production uses [`HttpTransport`] (reqwest);
//! tests script replies and count calls without any network I/O.
//!
//! A completed HTTP exchange is always returned as a [`WireReply`], even
//! for error statuses: classifying status codes is the provider's job,
//! since hints are provider-specific. Only failures without an HTTP
//! status (connect errors, timeouts) surface as `ProviderError` here.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::types::{MarkError, ProviderError};

/// HTTP method subset used by the providers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireMethod {
    Get,
    Post,
}

/// One provider HTTP call, transport-agnostic
#[derive(Debug, Clone)]
pub struct WireRequest {
    pub method: WireMethod,
    pub url: String,
    /// Bearer token for the Authorization header
    pub bearer: Option<String>,
    /// Query string parameters
    pub query: Vec<(String, String)>,
    /// JSON request body
    pub json: Option<Value>,
}

impl WireRequest {
    pub fn post_json(url: impl Into<String>, json: Value) -> Self {
        Self {
            method: WireMethod::Post,
            url: url.into(),
            bearer: None,
            query: Vec::new(),
            json: Some(json),
        }
    }

    pub fn get(url: impl Into<String>, query: Vec<(String, String)>) -> Self {
        Self {
            method: WireMethod::Get,
            url: url.into(),
            bearer: None,
            query,
            json: None,
        }
    }

    pub fn with_bearer(mut self, token: impl Into<String>) -> Self {
        self.bearer = Some(token.into());
        self
    }
}

/// A completed HTTP exchange
#[derive(Debug, Clone)]
pub struct WireReply {
    pub status: u16,
    pub body: String,
}

impl WireReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Transport abstraction over the HTTP client
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: WireRequest) -> Result<WireReply, ProviderError>;
}

/// Shared transport handle passed to provider clients
pub type SharedTransport = Arc<dyn Transport>;

/// Production transport backed by reqwest
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(timeout_secs: u64) -> Result<Self, MarkError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| MarkError::Http(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    /// Shared transport with the given per-request timeout
    pub fn shared(timeout_secs: u64) -> Result<SharedTransport, MarkError> {
        Ok(Arc::new(Self::new(timeout_secs)?))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(&self, request: WireRequest) -> Result<WireReply, ProviderError> {
        let mut builder = match request.method {
            WireMethod::Get => self.client.get(&request.url),
            WireMethod::Post => self.client.post(&request.url),
        };

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(token) = &request.bearer {
            builder = builder.header("Authorization", format!("Bearer {}", token));
        }
        if let Some(json) = &request.json {
            builder = builder.json(json);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_connect() {
                ProviderError::transport(format!(
                    "Connection failed: check network connectivity ({})",
                    e
                ))
            } else if e.is_timeout() {
                ProviderError::transport(format!("Request timed out: {}", e))
            } else {
                ProviderError::transport(format!("Request failed: {}", e))
            }
        })?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::transport(format!("Failed to read response body: {}", e)))?;

        Ok(WireReply { status, body })
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted transport for provider tests: replies are dequeued in
    //! order and every request is recorded for assertions.

    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct ScriptedTransport {
        replies: Mutex<VecDeque<Result<WireReply, ProviderError>>>,
        requests: Mutex<Vec<WireRequest>>,
    }

    impl ScriptedTransport {
        pub fn new() -> Self {
            Self::default()
        }

        /// Queue an HTTP reply
        pub fn reply(self, status: u16, body: &str) -> Self {
            self.replies.lock().unwrap().push_back(Ok(WireReply {
                status,
                body: body.to_string(),
            }));
            self
        }

        /// Queue a transport-level failure
        pub fn fail(self, error: ProviderError) -> Self {
            self.replies.lock().unwrap().push_back(Err(error));
            self
        }

        pub fn into_shared(self) -> Arc<Self> {
            Arc::new(self)
        }

        /// Number of calls issued so far
        pub fn calls(&self) -> usize {
            self.requests.lock().unwrap().len()
        }

        /// Snapshot of recorded requests
        pub fn requests(&self) -> Vec<WireRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn execute(&self, request: WireRequest) -> Result<WireReply, ProviderError> {
            self.requests.lock().unwrap().push(request);
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(ProviderError::transport("unexpected network call")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_reply_success_range() {
        assert!(WireReply { status: 200, body: String::new() }.is_success());
        assert!(WireReply { status: 204, body: String::new() }.is_success());
        assert!(!WireReply { status: 404, body: String::new() }.is_success());
        assert!(!WireReply { status: 500, body: String::new() }.is_success());
    }

    #[test]
    fn test_request_builders() {
        let post = WireRequest::post_json("https://x/y", serde_json::json!({"a": 1}))
            .with_bearer("token");
        assert_eq!(post.method, WireMethod::Post);
        assert_eq!(post.bearer.as_deref(), Some("token"));

        let get = WireRequest::get("https://x/y", vec![("q".into(), "z".into())]);
        assert_eq!(get.method, WireMethod::Get);
        assert!(get.json.is_none());
    }
}
