//! HTTP transport abstraction for talking to a DRS server.
//!
//! The client only needs one capability: send a request with an optional
//! JSON body and get back a status code and the response body. Keeping
//! this behind a trait lets tests substitute a recording stub and lets
//! callers bring their own HTTP stack.
//!
//! # Implementations
//!
//! - [`UreqTransport`] - blocking transport built on `ureq` (feature `http`)
//!
//! # Example
//!
//! ```no_run
//! # #[cfg(feature = "http")]
//! # {
//! use drs_client::transport::{Method, Transport, UreqTransport};
//!
//! let transport = UreqTransport::new(None);
//! let response = transport.send(Method::Get, "http://localhost/ga4gh/drs/v1/objects/abc", None);
//! # }
//! ```

#[cfg(feature = "http")]
mod http;

#[cfg(feature = "http")]
pub use http::UreqTransport;

use serde_json::Value;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Response body as received
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    /// No body, or only whitespace
    Empty,
    Json(Value),
    /// A body that is not JSON, kept verbatim
    Text(String),
}

impl Body {
    /// Classify a raw response body
    pub fn decode(raw: String) -> Self {
        if raw.trim().is_empty() {
            return Body::Empty;
        }
        match serde_json::from_str(&raw) {
            Ok(value) => Body::Json(value),
            Err(_) => Body::Text(raw),
        }
    }
}

impl From<Option<Value>> for Body {
    fn from(value: Option<Value>) -> Self {
        value.map_or(Body::Empty, Body::Json)
    }
}

/// Status and body of an HTTP response
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub status: u16,
    pub body: Body,
}

impl Response {
    pub fn new(status: u16, body: Body) -> Self {
        Self { status, body }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Transport-level failure: connection refused, timeout, unreadable body
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct TransportError(pub String);

/// Blocking request/response capability used by the client
pub trait Transport: Send + Sync {
    /// Send a request and return the response, whatever its status
    fn send(
        &self,
        method: Method,
        url: &str,
        body: Option<&Value>,
    ) -> Result<Response, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_response_success_range() {
        assert!(Response::new(200, Body::Empty).is_success());
        assert!(Response::new(204, Body::Empty).is_success());
        assert!(!Response::new(301, Body::Empty).is_success());
        assert!(!Response::new(404, Body::Empty).is_success());
    }

    #[test]
    fn test_body_decode() {
        assert_eq!(Body::decode(String::new()), Body::Empty);
        assert_eq!(Body::decode("  \n".to_string()), Body::Empty);
        assert_eq!(
            Body::decode("<html>oops</html>".to_string()),
            Body::Text("<html>oops</html>".to_string())
        );
        assert_eq!(Body::decode(r#"{"id": "abc"}"#.to_string()), Body::Json(json!({"id": "abc"})));
        assert_eq!(Body::decode(r#""abc""#.to_string()), Body::Json(json!("abc")));
        assert_eq!(Body::from(None::<Value>), Body::Empty);
    }

    #[test]
    fn test_method_display() {
        assert_eq!(Method::Get.to_string(), "GET");
        assert_eq!(Method::Post.to_string(), "POST");
        assert_eq!(Method::Delete.to_string(), "DELETE");
    }
}
