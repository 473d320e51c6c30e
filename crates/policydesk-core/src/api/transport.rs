//! The HTTP seam under the request pipeline.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode};
use serde::Serialize;
use tracing::debug;

use super::ApiError;

/// One backend call, described independently of any HTTP library.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    /// Path below the API base URL, e.g. `/appointments/3`
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<serde_json::Value>,
    /// Public calls never carry a bearer token and are never refreshed.
    pub public: bool,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            public: false,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self, ApiError> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    pub fn public(mut self) -> Self {
        self.public = true;
        self
    }
}

/// Status and body of a completed exchange, successful or not.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub body: String,
}

impl RawResponse {
    pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform the call. Non-2xx statuses are returned as responses;
    /// only failures to complete the exchange are errors.
    async fn send(&self, request: &ApiRequest, bearer: Option<&str>)
        -> Result<RawResponse, ApiError>;
}

/// reqwest-backed transport.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn url_for(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(
        &self,
        request: &ApiRequest,
        bearer: Option<&str>,
    ) -> Result<RawResponse, ApiError> {
        let url = self.url_for(&request.path);
        let mut builder = self.client.request(request.method.clone(), &url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(token) = bearer {
            builder = builder.bearer_auth(token);
        }
        if let Some(ref body) = request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;
        debug!(method = %request.method, url = %url, status = status.as_u16(), "HTTP exchange complete");
        Ok(RawResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joining() {
        let transport =
            HttpTransport::new("http://localhost:8081/api/v1/", Duration::from_secs(1)).unwrap();
        assert_eq!(
            transport.url_for("/agents/3"),
            "http://localhost:8081/api/v1/agents/3"
        );
        assert_eq!(
            transport.url_for("health"),
            "http://localhost:8081/api/v1/health"
        );
    }

    #[test]
    fn test_request_builder() {
        let request = ApiRequest::post("/auth/refresh")
            .json(&serde_json::json!({"refreshToken": "r"}))
            .unwrap()
            .public();
        assert_eq!(request.method, Method::POST);
        assert!(request.public);
        assert_eq!(request.body.unwrap()["refreshToken"], "r");

        let request = ApiRequest::get("/appointments/range")
            .query("startDate", "2025-01-01T00:00:00")
            .query("endDate", "2025-02-01T00:00:00");
        assert_eq!(request.query.len(), 2);
        assert!(!request.public);
    }
}
