use crate::validate::{DEFAULT_MAX_DEPTH, UnknownFields, ValidationPolicy};
use clap::Args;
use std::time::Duration;

/// Connection and validation settings for a DRS client
#[derive(Debug, Clone, Args)]
pub struct Config {
    /// DRS server host
    #[arg(long, env = "DRS_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// DRS server port
    #[arg(short, long, env = "DRS_PORT", default_value = "80")]
    pub port: u16,

    /// Path at which the DRS endpoints are served
    #[arg(long, env = "DRS_BASE_PATH", default_value = "ga4gh/drs/v1")]
    pub base_path: String,

    /// Per-request timeout in seconds, handed to the transport
    #[arg(long, env = "DRS_TIMEOUT")]
    pub timeout_secs: Option<u64>,

    /// Also require access_id/access_url on access methods and ids on bundle entries
    #[arg(long, env = "DRS_STRICT")]
    pub strict: bool,

    /// Fail validation on fields unknown to the DRS schema
    #[arg(long, env = "DRS_REJECT_UNKNOWN_FIELDS")]
    pub reject_unknown_fields: bool,

    /// Maximum nesting of bundle contents accepted from a server
    #[arg(long, env = "DRS_MAX_DEPTH", default_value_t = DEFAULT_MAX_DEPTH)]
    pub max_depth: usize,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 80,
            base_path: "ga4gh/drs/v1".to_string(),
            timeout_secs: None,
            strict: false,
            reject_unknown_fields: false,
            max_depth: DEFAULT_MAX_DEPTH,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    pub fn new(host: impl Into<String>, port: u16, base_path: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port,
            base_path: base_path.into(),
            ..Self::default()
        }
    }

    /// `http://{host}:{port}/{base_path}`
    pub fn base_url(&self) -> String {
        format!(
            "http://{}:{}/{}",
            self.host,
            self.port,
            self.base_path.trim_matches('/')
        )
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    pub fn validation_policy(&self) -> ValidationPolicy {
        ValidationPolicy {
            unknown_fields: if self.reject_unknown_fields {
                UnknownFields::Reject
            } else {
                UnknownFields::Ignore
            },
            max_depth: self.max_depth,
            strict: self.strict,
        }
    }
}
