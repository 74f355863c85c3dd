use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{ClientError, ClientResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
        }
    }
}

/// One outbound call. The bearer token is attached by the auth layer, never
/// by callers.
#[derive(Clone, Debug, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub url: String,
    pub bearer: Option<String>,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            url: url.into(),
            bearer: None,
            body: None,
        }
    }

    pub fn post(url: impl Into<String>, body: Value) -> Self {
        Self {
            method: Method::Post,
            url: url.into(),
            bearer: None,
            body: Some(body),
        }
    }

    pub fn with_bearer(mut self, token: Option<&str>) -> Self {
        self.bearer = token.map(str::to_string);
        self
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: String,
}

impl ApiResponse {
    pub fn new(status: u16, content_type: Option<&str>, body: impl Into<String>) -> Self {
        Self {
            status,
            content_type: content_type.map(str::to_string),
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status == 401
    }

    pub fn is_json(&self) -> bool {
        self.content_type
            .as_deref()
            .is_some_and(|ct| ct.contains("application/json"))
    }

    pub fn json<T: DeserializeOwned>(&self) -> ClientResult<T> {
        serde_json::from_str(&self.body).map_err(|err| {
            tracing::warn!(status = self.status, error = %err, "malformed response body");
            ClientError::InvalidServerResponse
        })
    }

    pub fn json_value(&self) -> Option<Value> {
        serde_json::from_str(&self.body).ok()
    }

    /// The `detail` string DRF-style backends put in error bodies.
    pub fn detail(&self) -> Option<String> {
        self.json_value()?
            .get("detail")
            .and_then(Value::as_str)
            .map(str::to_string)
    }

    /// Turn a non-success response into a `Request` error carrying the
    /// server's detail, or `fallback` when there is none.
    pub fn error_for_status(&self, fallback: &str) -> ClientResult<()> {
        if self.is_success() {
            return Ok(());
        }
        Err(ClientError::Request {
            status: self.status,
            message: self.detail().unwrap_or_else(|| fallback.to_string()),
        })
    }
}

/// The seam between the client and the network. Production uses
/// [`HttpTransport`]; tests script responses.
pub trait Transport {
    fn send(&self, request: &ApiRequest) -> ClientResult<ApiResponse>;
}

pub struct HttpTransport {
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> ClientResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("quizdesk/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ClientError::Network(e.to_string()))?;
        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    fn send(&self, request: &ApiRequest) -> ClientResult<ApiResponse> {
        let mut builder = match request.method {
            Method::Get => self.client.get(&request.url),
            Method::Post => self.client.post(&request.url),
        }
        .header(reqwest::header::ACCEPT, "application/json");

        if let Some(token) = &request.bearer {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        tracing::debug!(method = request.method.as_str(), url = %request.url, "sending request");
        let response = builder.send().map_err(|e| {
            tracing::error!(url = %request.url, error = %e, "request failed");
            ClientError::Network(e.to_string())
        })?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response
            .text()
            .map_err(|e| ClientError::Network(e.to_string()))?;

        tracing::debug!(status, url = %request.url, "received response");
        Ok(ApiResponse {
            status,
            content_type,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_range() {
        assert!(ApiResponse::new(200, None, "").is_success());
        assert!(ApiResponse::new(201, None, "").is_success());
        assert!(!ApiResponse::new(302, None, "").is_success());
        assert!(!ApiResponse::new(401, None, "").is_success());
        assert!(ApiResponse::new(401, None, "").is_unauthorized());
    }

    #[test]
    fn json_content_type_detection() {
        let resp = ApiResponse::new(200, Some("application/json; charset=utf-8"), "{}");
        assert!(resp.is_json());
        let resp = ApiResponse::new(500, Some("text/html"), "<html>");
        assert!(!resp.is_json());
        let resp = ApiResponse::new(500, None, "");
        assert!(!resp.is_json());
    }

    #[test]
    fn detail_is_extracted() {
        let resp = ApiResponse::new(
            401,
            Some("application/json"),
            r#"{"detail":"No active account found with the given credentials"}"#,
        );
        assert_eq!(
            resp.detail().as_deref(),
            Some("No active account found with the given credentials")
        );
        assert!(ApiResponse::new(400, None, "oops").detail().is_none());
    }

    #[test]
    fn error_for_status_uses_fallback() {
        let resp = ApiResponse::new(500, Some("application/json"), "{}");
        let err = resp.error_for_status("Failed to load tests").unwrap_err();
        assert_eq!(err.to_string(), "Failed to load tests");
        assert!(ApiResponse::new(200, None, "").error_for_status("x").is_ok());
    }

    #[test]
    fn malformed_json_is_invalid_server_response() {
        let resp = ApiResponse::new(200, Some("application/json"), "not json");
        let err = resp.json::<serde_json::Value>().unwrap_err();
        assert_eq!(err, ClientError::InvalidServerResponse);
    }

    #[test]
    fn with_bearer_sets_and_clears() {
        let req = ApiRequest::get("http://x/tests/").with_bearer(Some("tok"));
        assert_eq!(req.bearer.as_deref(), Some("tok"));
        let req = req.with_bearer(None);
        assert!(req.bearer.is_none());
    }
}
