//! Error handling for the apifactory library.
//!
//! Construction failures surface at one boundary, [`FactoryError`]. Two kinds
//! matter to callers:
//!
//! - [`FactoryError::Argument`]: the version selector was neither a string nor
//!   an object. Nothing was resolved.
//! - [`FactoryError::Construction`]: resolving or instantiating the endpoint
//!   module failed. The API name, the requested version and the original cause
//!   are all kept; the cause is reachable through [`std::error::Error::source`].
//!
//! Discovery failures are forwarded untouched as [`FactoryError::Discovery`].
//!
//! # Examples
//!
//! ```
//! use apifactory::error::{FactoryError, ResolveError};
//!
//! let err = FactoryError::construction("drive", "v999", ResolveError::MissingVersion);
//! assert!(err.to_string().starts_with("Unable to load endpoint drive(\"v999\")"));
//! ```

use std::path::PathBuf;

use thiserror::Error;

/// Boxed cause carried by construction errors.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result type for factory operations
pub type Result<T> = std::result::Result<T, FactoryError>;

/// Main error type at the construction boundary
#[derive(Debug, Error)]
pub enum FactoryError {
    /// The version selector had an unsupported shape
    #[error("Argument error: Accepts only string or object (got {found})")]
    Argument { found: &'static str },

    /// Resolution or instantiation of an endpoint module failed
    #[error("Unable to load endpoint {api}(\"{version}\"): {source}")]
    Construction {
        api: String,
        version: String,
        #[source]
        source: BoxError,
    },

    /// Discovery client failure, forwarded as-is
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl FactoryError {
    /// Wrap a resolution or instantiation failure with its API name and version
    pub fn construction(
        api: impl Into<String>,
        version: impl Into<String>,
        source: impl Into<BoxError>,
    ) -> Self {
        Self::Construction {
            api: api.into(),
            version: version.into(),
            source: source.into(),
        }
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Whether the selector was neither a string nor an object
    pub fn is_argument(&self) -> bool {
        matches!(self, Self::Argument { .. })
    }

    /// Whether resolving or instantiating a known API failed
    pub fn is_construction(&self) -> bool {
        matches!(self, Self::Construction { .. })
    }
}

/// Causes raised while resolving a version or instantiating a module.
///
/// These end up boxed inside [`FactoryError::Construction`]; downcast the
/// source to inspect them.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("no version was supplied")]
    MissingVersion,

    #[error("invalid version identifier {0:?}")]
    InvalidVersion(String),

    #[error("version {version} of {api} is not available (known: {})", .available.join(", "))]
    UnknownVersion {
        api: String,
        version: String,
        available: Vec<String>,
    },

    #[error("cannot read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },

    #[error("invalid client option {key}: {message}")]
    InvalidOption { key: String, message: String },
}

/// Errors raised by a discovery client
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("Failed to read discovery document {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to fetch discovery document from {url}: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP {status} when fetching {url}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("Failed to parse discovery document {source_name}: {message}")]
    Parse {
        source_name: String,
        message: String,
    },

    #[error("Invalid discovery index {source_name}: {message}")]
    InvalidIndex {
        source_name: String,
        message: String,
    },

    #[error("Discovery client error: {0}")]
    Client(String),
}
