//! DRS client: the four object operations plus service discovery.
//!
//! Incoming payloads are validated after they arrive and handed back as
//! received; outgoing registration payloads are validated before anything
//! is sent.

use crate::{
    Config, Error, Result,
    error::{RemoteError, ValidationError, ValidationErrorKind},
    transport::{Body, Method, Response, Transport},
    types::{AccessUrl, DrsError, DrsObject, PostDrsObject, ServiceInfo},
    validate::{Validate, Validated, ValidationPolicy, validate, validate_document},
};
use serde_json::Value;
use url::Url;

#[cfg(feature = "http")]
use crate::transport::UreqTransport;

/// Client for a GA4GH DRS endpoint.
///
/// Holds only immutable configuration; every call is an independent
/// blocking request.
pub struct DrsClient<T: Transport> {
    base_url: String,
    endpoint: Url,
    policy: ValidationPolicy,
    transport: T,
}

#[cfg(feature = "http")]
impl DrsClient<UreqTransport> {
    /// Create a client using the blocking `ureq` transport.
    pub fn new(config: &Config) -> Result<Self> {
        Self::with_transport(config, UreqTransport::new(config.timeout()))
    }
}

impl<T: Transport> DrsClient<T> {
    pub fn with_transport(config: &Config, transport: T) -> Result<Self> {
        let base_url = config.base_url();
        let endpoint = Url::parse(&base_url)
            .map_err(|e| Error::InvalidInput(format!("invalid base URL {}: {}", base_url, e)))?;

        Ok(Self {
            base_url,
            endpoint,
            policy: config.validation_policy(),
            transport,
        })
    }

    pub fn with_policy(mut self, policy: ValidationPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// `http://{host}:{port}/{base_path}` as composed at construction
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn policy(&self) -> &ValidationPolicy {
        &self.policy
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Fetch the metadata of a blob or bundle.
    ///
    /// The response is returned as decoded; it dereferences to the validated
    /// [`DrsObject`].
    pub fn get_object(&self, object_id: &str) -> Result<Validated<DrsObject>> {
        self.fetch_object(object_id, false)
    }

    /// Fetch a bundle with nested `contents` expanded.
    pub fn get_object_expanded(&self, object_id: &str) -> Result<Validated<DrsObject>> {
        self.fetch_object(object_id, true)
    }

    /// Resolve an access method of an object into a fetchable URL.
    pub fn get_access_url(&self, object_id: &str, access_id: &str) -> Result<Validated<AccessUrl>> {
        let object_id = non_empty("object_id", object_id)?;
        let access_id = non_empty("access_id", access_id)?;
        let url = self.url(&["objects", object_id, "access", access_id])?;

        let body = self.call(Method::Get, url, None)?;
        self.validated(body)
    }

    /// Register a new object and return its server-assigned id.
    ///
    /// `object` must have the shape of a [`PostDrsObject`]; it is validated
    /// locally and sent unchanged. Invalid payloads never reach the network.
    pub fn post_object(&self, object: &Value) -> Result<String> {
        validate::<PostDrsObject>(object, &self.policy)?;

        let url = self.url(&["objects"])?;
        let body = self.call(Method::Post, url, Some(object))?;
        object_id(&json_body(body, "ObjectId")?)
    }

    /// Typed variant of [`post_object`](Self::post_object).
    pub fn post_drs_object(&self, object: &PostDrsObject) -> Result<String> {
        let value = serde_json::to_value(object)
            .map_err(|e| Error::InvalidInput(format!("failed to encode object: {}", e)))?;
        self.post_object(&value)
    }

    /// Delete an object and return the id the server reports as deleted.
    pub fn delete_object(&self, object_id: &str) -> Result<String> {
        let object_id = non_empty("object_id", object_id)?;
        let url = self.url(&["objects", object_id])?;

        match self.call(Method::Delete, url, None)? {
            // some servers answer 204 without a body
            Body::Empty => Ok(object_id.to_string()),
            body => self::object_id(&json_body(body, "ObjectId")?),
        }
    }

    /// Fetch the GA4GH service-info document of the server.
    pub fn service_info(&self) -> Result<Validated<ServiceInfo>> {
        let url = self.url(&["service-info"])?;
        let body = self.call(Method::Get, url, None)?;
        self.validated(body)
    }

    fn fetch_object(&self, object_id: &str, expand: bool) -> Result<Validated<DrsObject>> {
        let object_id = non_empty("object_id", object_id)?;
        let mut url = self.url(&["objects", object_id])?;
        if expand {
            url.query_pairs_mut().append_pair("expand", "true");
        }

        let body = self.call(Method::Get, url, None)?;
        self.validated(body)
    }

    fn validated<E: Validate>(&self, body: Body) -> Result<Validated<E>> {
        let value = json_body(body, E::ENTITY)?;
        Ok(validate_document(value, &self.policy)?)
    }

    /// Endpoint URL with percent-encoded path segments appended
    fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|_| Error::InvalidInput(format!("{} cannot be a base URL", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Send a request; non-success statuses become [`RemoteError::Status`].
    fn call(&self, method: Method, url: Url, body: Option<&Value>) -> Result<Body> {
        tracing::debug!(%method, %url, "sending DRS request");

        let response = self
            .transport
            .send(method, url.as_str(), body)
            .map_err(|e| RemoteError::Transport(e.to_string()))?;

        if !response.is_success() {
            let Response { status, body } = response;
            let error = match &body {
                Body::Json(value) => error_body(value),
                _ => None,
            };
            tracing::warn!(%method, %url, status, "DRS request failed");
            return Err(RemoteError::Status { status, error }.into());
        }

        Ok(response.body)
    }
}

/// JSON document of a successful response. An empty or non-JSON body is a
/// validation failure of the entity the caller expected.
fn json_body(body: Body, entity: &'static str) -> Result<Value> {
    match body {
        Body::Json(value) => Ok(value),
        Body::Empty | Body::Text(_) => Err(ValidationError {
            entity,
            path: String::new(),
            kind: ValidationErrorKind::WrongType {
                expected: "a JSON document",
            },
        }
        .into()),
    }
}

/// Error entity of a failed response. `msg` and `status_code` are read
/// independently so one malformed field does not hide the other.
fn error_body(body: &Value) -> Option<DrsError> {
    let map = body.as_object()?;
    let msg = map.get("msg").and_then(Value::as_str).map(str::to_string);
    let status_code = map
        .get("status_code")
        .and_then(|code| match code {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        })
        .and_then(|code| u16::try_from(code).ok());

    if msg.is_none() && status_code.is_none() {
        return None;
    }
    Some(DrsError { msg, status_code })
}

fn non_empty<'a>(name: &str, value: &'a str) -> Result<&'a str> {
    if value.is_empty() {
        return Err(Error::InvalidInput(format!("{} must not be empty", name)));
    }
    Ok(value)
}

/// Object id from a registration or deletion response: either a bare JSON
/// string or an object with an `id` field
fn object_id(body: &Value) -> Result<String> {
    let id = match body {
        Value::String(id) => Some(id),
        Value::Object(map) => match map.get("id") {
            Some(Value::String(id)) => Some(id),
            _ => None,
        },
        _ => None,
    };

    match id {
        Some(id) if !id.is_empty() => Ok(id.clone()),
        _ => Err(ValidationError {
            entity: "ObjectId",
            path: String::new(),
            kind: ValidationErrorKind::WrongType {
                expected: "an object id string or {\"id\": string}",
            },
        }
        .into()),
    }
}
