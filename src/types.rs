use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Registered access method types per DRS 1.x
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessMethodType {
    S3,
    Gs,
    Ftp,
    Gsiftp,
    Globus,
    Htsget,
    Https,
    File,
}

/// Lists on registration payloads may be omitted or sent as `null`
fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Digest of an object's bytes (or, for bundles, of its children's digests).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checksum {
    /// Hex-string encoded checksum
    pub checksum: String,
    /// Digest method, e.g. `sha-256` or `md5`. Not restricted to a closed set.
    pub r#type: String,
}

/// A fetchable location plus the headers needed to fetch it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessUrl {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<Vec<String>>,
}

/// Access method as returned by a DRS server.
///
/// At least one of `access_id` and `access_url` should be present; this is
/// only checked under strict validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessMethod {
    pub r#type: AccessMethodType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_url: Option<AccessUrl>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
}

impl AccessMethod {
    /// Cloud region, `""` when unset
    pub fn region(&self) -> &str {
        self.region.as_deref().unwrap_or_default()
    }
}

/// Access method submitted on registration. Access ids are server-assigned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessPostMethod {
    pub r#type: AccessMethodType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_url: Option<AccessUrl>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
}

impl AccessPostMethod {
    pub fn region(&self) -> &str {
        self.region.as_deref().unwrap_or_default()
    }
}

/// An entry of a bundle. Nested bundles own their children directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentsObject {
    /// Portable filename, `[A-Za-z0-9._-]`
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub drs_uri: Option<Vec<String>>,
    /// Only populated when the object was requested with `expand=true`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contents: Option<Vec<ContentsObject>>,
}

impl ContentsObject {
    pub fn is_bundle(&self) -> bool {
        self.contents.as_ref().is_some_and(|c| !c.is_empty())
    }

    /// Number of levels below this entry, 0 for a leaf
    pub fn depth(&self) -> usize {
        self.contents
            .iter()
            .flatten()
            .map(|c| c.depth() + 1)
            .max()
            .unwrap_or(0)
    }
}

/// Blob or bundle metadata as resolved by `GET /objects/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrsObject {
    pub id: String,
    /// `drs://` URI of this object
    pub self_uri: String,
    /// Blob size in bytes, or the cumulative size of a bundle's contents
    pub size: u64,
    pub created_time: DateTime<Utc>,
    pub checksums: Vec<Checksum>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aliases: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contents: Option<Vec<ContentsObject>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_methods: Option<Vec<AccessMethod>>,
}

impl DrsObject {
    /// A bundle has non-empty `contents`; everything else is a blob.
    pub fn is_bundle(&self) -> bool {
        self.contents.as_ref().is_some_and(|c| !c.is_empty())
    }

    pub fn is_blob(&self) -> bool {
        !self.is_bundle()
    }

    pub fn access_methods(&self) -> &[AccessMethod] {
        self.access_methods.as_deref().unwrap_or_default()
    }

    /// Access method with the given id, for use with `/access/{access_id}`
    pub fn access_method(&self, access_id: &str) -> Option<&AccessMethod> {
        self.access_methods()
            .iter()
            .find(|m| m.access_id.as_deref() == Some(access_id))
    }
}

/// Registration payload for `POST /objects`. Ids and `self_uri` are
/// assigned by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostDrsObject {
    pub size: u64,
    pub created_time: DateTime<Utc>,
    pub checksums: Vec<Checksum>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub aliases: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub contents: Vec<ContentsObject>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub access_methods: Vec<AccessPostMethod>,
}

impl PostDrsObject {
    pub fn is_bundle(&self) -> bool {
        !self.contents.is_empty()
    }
}

/// Error body carried by failed DRS responses
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrsError {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub msg: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
}

/// GA4GH service-info document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceInfo {
    pub id: String,
    pub name: String,
    pub r#type: ServiceType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub organization: Organization,
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceType {
    pub group: String,
    pub artifact: String,
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    pub name: String,
    pub url: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn leaf(name: &str) -> ContentsObject {
        ContentsObject {
            name: name.to_string(),
            id: None,
            drs_uri: None,
            contents: None,
        }
    }

    #[test]
    fn test_access_method_type_wire_names() {
        let types: Vec<AccessMethodType> =
            serde_json::from_value(json!(["s3", "gsiftp", "https", "file"])).unwrap();
        assert_eq!(types[1], AccessMethodType::Gsiftp);
        assert_eq!(serde_json::to_value(&types).unwrap(), json!(["s3", "gsiftp", "https", "file"]));

        assert!(serde_json::from_value::<AccessMethodType>(json!("nfs")).is_err());
        assert!(serde_json::from_value::<AccessMethodType>(json!("S3")).is_err());
    }

    #[test]
    fn test_access_method_region_default() {
        let method = AccessMethod {
            r#type: AccessMethodType::Https,
            access_id: Some("a1".to_string()),
            access_url: None,
            region: None,
        };
        assert_eq!(method.region(), "");

        let value = serde_json::to_value(&method).unwrap();
        assert_eq!(value, json!({"type": "https", "access_id": "a1"}));
    }

    #[test]
    fn test_contents_depth() {
        let mut inner = leaf("c");
        inner.contents = Some(vec![leaf("d")]);
        let mut outer = leaf("b");
        outer.contents = Some(vec![leaf("x"), inner]);

        assert_eq!(leaf("a").depth(), 0);
        assert_eq!(outer.depth(), 2);
        assert!(outer.is_bundle());
        assert!(!leaf("a").is_bundle());
    }

    #[test]
    fn test_post_object_serializes_empty_lists() {
        let post = PostDrsObject {
            size: 1,
            created_time: "2024-01-01T00:00:00Z".parse().unwrap(),
            checksums: vec![Checksum {
                checksum: "ab".to_string(),
                r#type: "md5".to_string(),
            }],
            updated_time: None,
            version: None,
            name: None,
            mime_type: None,
            description: None,
            aliases: vec![],
            contents: vec![],
            access_methods: vec![],
        };

        let value = serde_json::to_value(&post).unwrap();
        assert_eq!(value["aliases"], json!([]));
        assert_eq!(value["contents"], json!([]));
        assert_eq!(value["access_methods"], json!([]));
        assert_eq!(value["created_time"], json!("2024-01-01T00:00:00Z"));
        assert!(value.get("updated_time").is_none());
    }

    #[test]
    fn test_stored_payload_decodes_with_serde() {
        let object: DrsObject = serde_json::from_str(
            r#"{
                "id": "abc123",
                "self_uri": "drs://h/abc123",
                "size": 100,
                "created_time": "2024-01-01T02:00:00+02:00",
                "checksums": [{"checksum": "deadbeef", "type": "md5"}],
                "access_methods": [{"type": "s3", "access_id": "s3-1", "region": null}]
            }"#,
        )
        .unwrap();
        assert_eq!(object.created_time, "2024-01-01T00:00:00Z".parse::<DateTime<Utc>>().unwrap());
        assert_eq!(object.access_methods()[0].region(), "");

        let post: PostDrsObject = serde_json::from_value(json!({
            "size": 0,
            "created_time": "2024-01-01T00:00:00Z",
            "checksums": [],
            "aliases": null
        }))
        .unwrap();
        assert!(post.aliases.is_empty() && post.contents.is_empty() && post.access_methods.is_empty());
    }
}
