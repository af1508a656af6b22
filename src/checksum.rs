//! Bundle checksum aggregation.
//!
//! A bundle's checksum is the digest of the sorted concatenation of the
//! hex checksums of its top-level children (not recursive, names excluded):
//!
//! ```text
//! md5(concat(sort(72794b6d, 5e089d29))) = md5("5e089d2972794b6d")
//! ```
//!
//! Servers are expected to produce bundle checksums this way. The validator
//! never recomputes them; producers registering a bundle can use
//! [`bundle_checksum`] to fill in the `checksums` field.

use crate::types::Checksum;
use sha2::{Digest, Sha256, Sha512};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported checksum algorithm: {0}")]
pub struct UnsupportedAlgorithm(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    Md5,
    Sha256,
    Sha512,
}

impl Algorithm {
    /// Accepts IANA hash names (`sha-256`) and the common unhyphenated forms
    pub fn from_name(name: &str) -> Result<Self, UnsupportedAlgorithm> {
        match name.to_ascii_lowercase().as_str() {
            "md5" => Ok(Algorithm::Md5),
            "sha-256" | "sha256" => Ok(Algorithm::Sha256),
            "sha-512" | "sha512" => Ok(Algorithm::Sha512),
            _ => Err(UnsupportedAlgorithm(name.to_string())),
        }
    }

    /// Name used in the `type` field of a [`Checksum`]
    pub fn name(&self) -> &'static str {
        match self {
            Algorithm::Md5 => "md5",
            Algorithm::Sha256 => "sha-256",
            Algorithm::Sha512 => "sha-512",
        }
    }

    /// Lower-case hex digest of `data`
    pub fn hex_digest(&self, data: &[u8]) -> String {
        match self {
            Algorithm::Md5 => format!("{:x}", md5::compute(data)),
            Algorithm::Sha256 => format!("{:x}", Sha256::digest(data)),
            Algorithm::Sha512 => format!("{:x}", Sha512::digest(data)),
        }
    }
}

/// Aggregate the checksums of a bundle's direct children into the bundle's
/// own checksum value
pub fn bundle_checksum<S: AsRef<str>>(
    algorithm: &str,
    children: &[S],
) -> Result<String, UnsupportedAlgorithm> {
    let algorithm = Algorithm::from_name(algorithm)?;

    let mut sorted: Vec<&str> = children.iter().map(|c| c.as_ref()).collect();
    sorted.sort_unstable();

    Ok(algorithm.hex_digest(sorted.concat().as_bytes()))
}

/// Like [`bundle_checksum`], but picks the children's checksums of the given
/// algorithm out of their checksum lists and returns a ready [`Checksum`].
///
/// Returns `None` if any child has no checksum of that algorithm.
pub fn aggregate(
    algorithm: &str,
    children: &[&[Checksum]],
) -> Result<Option<Checksum>, UnsupportedAlgorithm> {
    let algorithm = Algorithm::from_name(algorithm)?;

    let mut values = Vec::with_capacity(children.len());
    for checksums in children {
        let found = checksums.iter().find(|c| {
            Algorithm::from_name(&c.r#type).is_ok_and(|a| a == algorithm)
        });
        match found {
            Some(c) => values.push(c.checksum.as_str()),
            None => return Ok(None),
        }
    }

    Ok(Some(Checksum {
        checksum: bundle_checksum(algorithm.name(), &values)?,
        r#type: algorithm.name().to_string(),
    }))
}
