//! Blocking HTTP transport built on `ureq`.
//!
//! Non-success statuses are returned as regular responses so the client can
//! decode the DRS error body; only connection-level failures become
//! [`TransportError`]s.

use super::{Body, Method, Response, Transport, TransportError};
use serde_json::Value;
use std::time::Duration;
use ureq::Agent;

/// `ureq`-backed [`Transport`]
#[derive(Clone)]
pub struct UreqTransport {
    agent: Agent,
}

impl UreqTransport {
    /// Create a transport with an optional overall per-request timeout.
    pub fn new(timeout: Option<Duration>) -> Self {
        let config = Agent::config_builder()
            .timeout_global(timeout)
            .http_status_as_error(false)
            .build();

        Self {
            agent: config.into(),
        }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new(None)
    }
}

impl Transport for UreqTransport {
    fn send(
        &self,
        method: Method,
        url: &str,
        body: Option<&Value>,
    ) -> Result<Response, TransportError> {
        let result = match (method, body) {
            (Method::Get, _) => self.agent.get(url).header("accept", "application/json").call(),
            (Method::Delete, _) => self.agent.delete(url).header("accept", "application/json").call(),
            (Method::Post, body) => {
                let payload = serde_json::to_string(body.unwrap_or(&Value::Null))
                    .map_err(|e| TransportError(format!("failed to encode request body: {}", e)))?;
                self.agent
                    .post(url)
                    .header("accept", "application/json")
                    .header("content-type", "application/json")
                    .send(payload.as_bytes())
            }
        };

        let mut response =
            result.map_err(|e| TransportError(format!("HTTP {} request failed: {}", method, e)))?;

        let status = response.status().as_u16();
        let raw = response
            .body_mut()
            .read_to_string()
            .map_err(|e| TransportError(format!("failed to read HTTP response: {}", e)))?;

        Ok(Response::new(status, Body::decode(raw)))
    }
}
