//! Structural validation of DRS payloads.
//!
//! Entities are decoded with serde through [`serde_path_to_error`], so a
//! decode failure names the exact field path inside recursive structures
//! (`contents[0].contents[3].name`). The decoded entity is then checked for
//! the invariants serde cannot express: portable names, non-empty
//! checksums, `drs://` self URIs, the blob/bundle rule and the nesting bound.
//! Validation is all-or-nothing: either a complete typed entity is produced
//! or a [`ValidationError`] is returned.
//!
//! # Policy
//!
//! Unknown fields are ignored by default so that payloads from newer servers
//! still validate. [`UnknownFields::Reject`] turns the model into a closed
//! schema. `strict` adds checks the DRS schema documents but does not make
//! mandatory (see [`ValidationPolicy`]).

use crate::error::{ValidationError, ValidationErrorKind};
use crate::types::{
    AccessMethod, AccessPostMethod, AccessUrl, Checksum, ContentsObject, DrsError, DrsObject,
    PostDrsObject, ServiceInfo,
};
use serde::{Serialize, Serializer, de::DeserializeOwned};
use serde_json::Value;
use std::ops::Deref;

/// Default bound on `ContentsObject` nesting
pub const DEFAULT_MAX_DEPTH: usize = 32;

/// What to do with fields the model does not know about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnknownFields {
    #[default]
    Ignore,
    Reject,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationPolicy {
    pub unknown_fields: UnknownFields,
    /// Maximum `ContentsObject` nesting; deeper payloads fail validation
    pub max_depth: usize,
    /// Also require an `access_id` or `access_url` on every access method and
    /// an `id` on every top-level bundle entry
    pub strict: bool,
}

impl Default for ValidationPolicy {
    fn default() -> Self {
        Self {
            unknown_fields: UnknownFields::Ignore,
            max_depth: DEFAULT_MAX_DEPTH,
            strict: false,
        }
    }
}

impl ValidationPolicy {
    pub fn strict() -> Self {
        Self {
            strict: true,
            ..Self::default()
        }
    }
}

/// An entity that can be validated from an untrusted JSON document
pub trait Validate: Serialize + DeserializeOwned {
    /// Entity name used in error reports
    const ENTITY: &'static str;

    /// Invariants beyond what decoding already guarantees
    fn check(&self, _checker: &Checker<'_>) -> Result<(), ValidationError> {
        Ok(())
    }
}

/// A validated entity together with the document it was decoded from.
///
/// Dereferences to the typed entity; serializes as the original document, so
/// fields the model does not know and timestamps in their original form
/// survive a round trip.
#[derive(Debug, Clone, PartialEq)]
pub struct Validated<T> {
    entity: T,
    raw: Value,
}

impl<T> Validated<T> {
    pub fn entity(&self) -> &T {
        &self.entity
    }

    pub fn into_entity(self) -> T {
        self.entity
    }

    /// The document exactly as decoded from the response
    pub fn raw(&self) -> &Value {
        &self.raw
    }

    pub fn into_raw(self) -> Value {
        self.raw
    }
}

impl<T> Deref for Validated<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.entity
    }
}

impl<T> Serialize for Validated<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.raw.serialize(serializer)
    }
}

/// Validate `value` as `T` with the given policy
pub fn validate<T: Validate>(value: &Value, policy: &ValidationPolicy) -> Result<T, ValidationError> {
    decode(value, policy).inspect_err(|e| {
        tracing::debug!(entity = T::ENTITY, path = %e.path, "validation failed: {}", e.kind);
    })
}

/// Validate `value` as `T`, keeping the document alongside the entity
pub fn validate_document<T: Validate>(
    value: Value,
    policy: &ValidationPolicy,
) -> Result<Validated<T>, ValidationError> {
    let entity = validate(&value, policy)?;
    Ok(Validated { entity, raw: value })
}

/// Returns true if `name` only uses the portable filename character set
pub fn is_portable_name(name: &str) -> bool {
    name.chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
}

fn decode<T: Validate>(value: &Value, policy: &ValidationPolicy) -> Result<T, ValidationError> {
    let checker = Checker {
        entity: T::ENTITY,
        policy,
    };
    if !value.is_object() {
        return Err(checker.error("", ValidationErrorKind::WrongType { expected: "a JSON object" }));
    }

    let entity: T = serde_path_to_error::deserialize(value).map_err(|e| checker.decode_error(e))?;

    if policy.unknown_fields == UnknownFields::Reject {
        // whatever the model does not serialize back is unknown to it
        let known = serde_json::to_value(&entity)
            .map_err(|e| checker.error("", ValidationErrorKind::Decode(e.to_string())))?;
        if let Some(path) = unknown_field(value, &known, "") {
            return Err(checker.error(&path, ValidationErrorKind::UnknownField));
        }
    }

    entity.check(&checker)?;
    Ok(entity)
}

/// First key of `raw` with no counterpart in `known`, shallowest first.
/// `null` values count as absent.
fn unknown_field(raw: &Value, known: &Value, path: &str) -> Option<String> {
    match (raw, known) {
        (Value::Object(raw), Value::Object(known)) => {
            let present = || raw.iter().filter(|(_, v)| !v.is_null());
            if let Some((key, _)) = present().find(|(k, _)| !known.contains_key(*k)) {
                return Some(field_path(path, key));
            }
            present().find_map(|(key, value)| {
                known
                    .get(key)
                    .and_then(|k| unknown_field(value, k, &field_path(path, key)))
            })
        }
        (Value::Array(raw), Value::Array(known)) => raw
            .iter()
            .zip(known)
            .enumerate()
            .find_map(|(i, (r, k))| unknown_field(r, k, &index_path(path, i))),
        _ => None,
    }
}

fn field_path(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", parent, name)
    }
}

fn index_path(parent: &str, index: usize) -> String {
    format!("{}[{}]", parent, index)
}

type Checked = Result<(), ValidationError>;

/// Reports failures for one entity under one policy
pub struct Checker<'p> {
    entity: &'static str,
    policy: &'p ValidationPolicy,
}

impl Checker<'_> {
    pub fn error(&self, path: &str, kind: ValidationErrorKind) -> ValidationError {
        ValidationError {
            entity: self.entity,
            path: path.to_string(),
            kind,
        }
    }

    fn decode_error(&self, err: serde_path_to_error::Error<serde_json::Error>) -> ValidationError {
        let path = match err.path().to_string() {
            root if root == "." => String::new(),
            path => path,
        };
        let message = err.into_inner().to_string();

        // serde reports a missing field against the enclosing object
        if let Some(field) = message
            .strip_prefix("missing field `")
            .and_then(|rest| rest.strip_suffix('`'))
        {
            return self.error(&field_path(&path, field), ValidationErrorKind::Missing);
        }
        if message.starts_with("invalid type: null") {
            return self.error(&path, ValidationErrorKind::Missing);
        }
        self.error(&path, ValidationErrorKind::Decode(message))
    }

    fn checksums(&self, checksums: &[Checksum], path: &str) -> Checked {
        if checksums.is_empty() {
            return Err(self.error(path, ValidationErrorKind::Empty));
        }
        checksums
            .iter()
            .enumerate()
            .try_for_each(|(i, c)| self.checksum(c, &index_path(path, i)))
    }

    fn checksum(&self, checksum: &Checksum, path: &str) -> Checked {
        if checksum.r#type.is_empty() {
            return Err(self.error(&field_path(path, "type"), ValidationErrorKind::Empty));
        }
        Ok(())
    }

    fn self_uri(&self, uri: &str) -> Checked {
        match uri.strip_prefix("drs://") {
            Some(rest) if !rest.is_empty() => Ok(()),
            _ => Err(self.error(
                "self_uri",
                ValidationErrorKind::InvalidUri {
                    value: uri.to_string(),
                    reason: "expected a drs:// URI".to_string(),
                },
            )),
        }
    }

    fn access_method(&self, method: &AccessMethod, path: &str) -> Checked {
        if self.policy.strict && method.access_id.is_none() && method.access_url.is_none() {
            return Err(self.error(path, ValidationErrorKind::MissingAccessLocation));
        }
        Ok(())
    }

    fn access_post_method(&self, method: &AccessPostMethod, path: &str) -> Checked {
        if self.policy.strict && method.access_url.is_none() {
            return Err(self.error(path, ValidationErrorKind::MissingAccessLocation));
        }
        Ok(())
    }

    /// `depth` is 1 for the direct children of an object
    fn contents(&self, entries: &[ContentsObject], path: &str, depth: usize) -> Checked {
        entries
            .iter()
            .enumerate()
            .try_for_each(|(i, entry)| self.contents_entry(entry, &index_path(path, i), depth))
    }

    fn contents_entry(&self, entry: &ContentsObject, path: &str, depth: usize) -> Checked {
        if depth > self.policy.max_depth {
            return Err(self.error(path, ValidationErrorKind::TooDeep { max: self.policy.max_depth }));
        }
        if !is_portable_name(&entry.name) {
            return Err(self.error(
                &field_path(path, "name"),
                ValidationErrorKind::InvalidName(entry.name.clone()),
            ));
        }
        if self.policy.strict && depth == 1 && entry.id.is_none() {
            return Err(self.error(&field_path(path, "id"), ValidationErrorKind::Missing));
        }

        match &entry.contents {
            Some(children) => self.contents(children, &field_path(path, "contents"), depth + 1),
            None => Ok(()),
        }
    }
}

impl Validate for DrsObject {
    const ENTITY: &'static str = "DrsObject";

    fn check(&self, checker: &Checker<'_>) -> Checked {
        checker.self_uri(&self.self_uri)?;
        checker.checksums(&self.checksums, "checksums")?;
        checker.contents(self.contents.as_deref().unwrap_or_default(), "contents", 1)?;
        for (i, method) in self.access_methods().iter().enumerate() {
            checker.access_method(method, &index_path("access_methods", i))?;
        }

        if self.is_blob() && self.access_methods().is_empty() {
            return Err(checker.error("access_methods", ValidationErrorKind::MissingAccessMethods));
        }
        Ok(())
    }
}

impl Validate for PostDrsObject {
    const ENTITY: &'static str = "PostDrsObject";

    fn check(&self, checker: &Checker<'_>) -> Checked {
        checker.checksums(&self.checksums, "checksums")?;
        checker.contents(&self.contents, "contents", 1)?;
        for (i, method) in self.access_methods.iter().enumerate() {
            checker.access_post_method(method, &index_path("access_methods", i))?;
        }

        if !self.is_bundle() && self.access_methods.is_empty() {
            return Err(checker.error("access_methods", ValidationErrorKind::MissingAccessMethods));
        }
        Ok(())
    }
}

impl Validate for AccessUrl {
    const ENTITY: &'static str = "AccessURL";
}

impl Validate for AccessMethod {
    const ENTITY: &'static str = "AccessMethod";

    fn check(&self, checker: &Checker<'_>) -> Checked {
        checker.access_method(self, "")
    }
}

impl Validate for AccessPostMethod {
    const ENTITY: &'static str = "AccessPostMethod";

    fn check(&self, checker: &Checker<'_>) -> Checked {
        checker.access_post_method(self, "")
    }
}

impl Validate for Checksum {
    const ENTITY: &'static str = "Checksum";

    fn check(&self, checker: &Checker<'_>) -> Checked {
        checker.checksum(self, "")
    }
}

impl Validate for ContentsObject {
    const ENTITY: &'static str = "ContentsObject";

    /// Checks a standalone entry as if it were a top-level bundle entry
    fn check(&self, checker: &Checker<'_>) -> Checked {
        checker.contents_entry(self, "", 1)
    }
}

impl Validate for DrsError {
    const ENTITY: &'static str = "Error";
}

impl Validate for ServiceInfo {
    const ENTITY: &'static str = "ServiceInfo";
}
