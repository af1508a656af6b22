pub mod checksum;
pub mod client;
pub mod config;
pub mod error;
pub mod transport;
pub mod types;
pub mod validate;

pub use client::DrsClient;
pub use config::Config;
pub use error::{Error, RemoteError, Result, ValidationError, ValidationErrorKind};
pub use validate::{UnknownFields, Validate, Validated, ValidationPolicy};
