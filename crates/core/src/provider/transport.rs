//! HTTP transport seam.
//!
//! Provider clients build plain [`HttpRequest`] values and hand them to an
//! [`HttpTransport`]. Production code uses [`ReqwestTransport`]; tests use
//! the scripted transport from `crate::testing`.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use super::ProviderError;

/// HTTP method used by provider calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

/// Request body variants understood by the transport.
#[derive(Debug, Clone, PartialEq)]
pub enum HttpBody {
    Json(Value),
    Form(Vec<(String, String)>),
    Bytes { data: Vec<u8>, content_type: String },
}

/// An outgoing provider request.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<HttpBody>,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Get,
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn post_json(url: impl Into<String>, body: Value) -> Self {
        Self {
            method: HttpMethod::Post,
            url: url.into(),
            headers: Vec::new(),
            body: Some(HttpBody::Json(body)),
        }
    }

    pub fn post_form(url: impl Into<String>, fields: Vec<(String, String)>) -> Self {
        Self {
            method: HttpMethod::Post,
            url: url.into(),
            headers: Vec::new(),
            body: Some(HttpBody::Form(fields)),
        }
    }

    pub fn post_bytes(url: impl Into<String>, data: Vec<u8>, content_type: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Post,
            url: url.into(),
            headers: Vec::new(),
            body: Some(HttpBody::Bytes {
                data,
                content_type: content_type.into(),
            }),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Add a bearer token header when a key is present.
    pub fn with_bearer(self, api_key: Option<&str>) -> Self {
        match api_key {
            Some(key) => self.with_header("authorization", format!("Bearer {}", key)),
            None => self,
        }
    }
}

/// A provider response, already fully read.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpReply {
    pub status: u16,
    /// Header names are lower-cased.
    pub headers: HashMap<String, String>,
    pub body: String,
}

impl HttpReply {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body: body.into(),
        }
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_rate_limited(&self) -> bool {
        self.status == 429
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(|v| v.as_str())
    }

    /// Server-supplied `retry-after` hint, in whole seconds.
    pub fn retry_after(&self) -> Option<Duration> {
        self.header("retry-after")
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(Duration::from_secs)
    }

    /// Parse the body as untyped JSON.
    pub fn json(&self) -> Result<Value, ProviderError> {
        serde_json::from_str(&self.body)
            .map_err(|e| ProviderError::Transient(format!("invalid JSON body: {}", e)))
    }

    /// Convert a non-success reply into the matching error.
    pub fn into_error(self) -> ProviderError {
        if self.is_rate_limited() {
            return ProviderError::RateLimitExceeded {
                retry_after: self.retry_after(),
            };
        }
        let mut message = self.body;
        if message.len() > 500 {
            let mut cut = 500;
            while !message.is_char_boundary(cut) {
                cut -= 1;
            }
            message.truncate(cut);
        }
        ProviderError::Api {
            status: self.status,
            message,
        }
    }
}

/// URL without its query string, for logs and error messages.
pub(crate) fn redacted_url(url: &str) -> &str {
    url.split_once('?').map_or(url, |(base, _)| base)
}

/// Sends a single HTTP request. No retries at this layer.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: &HttpRequest) -> Result<HttpReply, ProviderError>;
}

/// [`HttpTransport`] backed by `reqwest`.
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::NotConfigured(format!("HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: &HttpRequest) -> Result<HttpReply, ProviderError> {
        let url = reqwest::Url::parse(&request.url)
            .map_err(|e| {
                ProviderError::InvalidInput(format!("{}: {}", redacted_url(&request.url), e))
            })?;

        let mut builder = match request.method {
            HttpMethod::Get => self.client.get(url),
            HttpMethod::Post => self.client.post(url),
        };
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        builder = match &request.body {
            Some(HttpBody::Json(value)) => builder.json(value),
            Some(HttpBody::Form(fields)) => builder.form(fields),
            Some(HttpBody::Bytes { data, content_type }) => builder
                .header("content-type", content_type.as_str())
                .body(data.clone()),
            None => builder,
        };

        let response = builder
            .send()
            .await
            .map_err(|e| ProviderError::Transient(e.without_url().to_string()))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
            })
            .collect();
        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::Transient(e.without_url().to_string()))?;

        Ok(HttpReply {
            status,
            headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_retry_after_parsing() {
        let reply = HttpReply::new(429, "").with_header("Retry-After", "12");
        assert_eq!(reply.retry_after(), Some(Duration::from_secs(12)));

        let reply = HttpReply::new(429, "").with_header("retry-after", "soon");
        assert_eq!(reply.retry_after(), None);

        let reply = HttpReply::new(429, "");
        assert_eq!(reply.retry_after(), None);
    }

    #[test]
    fn test_into_error_maps_rate_limit() {
        let reply = HttpReply::new(429, "slow down").with_header("retry-after", "3");
        assert_eq!(
            reply.into_error(),
            ProviderError::RateLimitExceeded {
                retry_after: Some(Duration::from_secs(3))
            }
        );

        let reply = HttpReply::new(502, "bad gateway");
        assert_eq!(
            reply.into_error(),
            ProviderError::Api {
                status: 502,
                message: "bad gateway".to_string()
            }
        );
    }

    #[test]
    fn test_json_body_validation() {
        let reply = HttpReply::new(200, r#"{"ok": true}"#);
        assert_eq!(reply.json().unwrap(), json!({"ok": true}));

        let reply = HttpReply::new(200, "<html>");
        assert!(matches!(reply.json(), Err(ProviderError::Transient(_))));
    }

    #[test]
    fn test_request_builders() {
        let request = HttpRequest::post_json("http://x/v1", json!({"a": 1}))
            .with_bearer(Some("sk-1"))
            .with_header("x-extra", "1");
        assert_eq!(request.method, HttpMethod::Post);
        assert!(request
            .headers
            .contains(&("authorization".to_string(), "Bearer sk-1".to_string())));
        assert_eq!(request.headers.len(), 2);

        let request = HttpRequest::get("http://x/status").with_bearer(None);
        assert!(request.headers.is_empty());
        assert!(request.body.is_none());
    }

    #[tokio::test]
    async fn test_reqwest_transport_rejects_bad_url() {
        let transport = ReqwestTransport::new(Duration::from_secs(1)).unwrap();
        let result = transport.send(&HttpRequest::get("not a url")).await;
        assert!(matches!(result, Err(ProviderError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_connection_error_omits_query_string() {
        let transport = ReqwestTransport::new(Duration::from_secs(1)).unwrap();
        let err = transport
            .send(&HttpRequest::get("http://127.0.0.1:1/v1/images:annotate?key=SECRETKEY123"))
            .await
            .unwrap_err();

        assert!(matches!(err, ProviderError::Transient(_)));
        assert!(!err.to_string().contains("SECRETKEY123"));
    }

    #[test]
    fn test_redacted_url_drops_query() {
        assert_eq!(
            redacted_url("http://vision.local/v1/images:annotate?key=secret"),
            "http://vision.local/v1/images:annotate"
        );
        assert_eq!(redacted_url("http://provider/x"), "http://provider/x");
    }
}
