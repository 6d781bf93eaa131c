//! Error types for credential loading, the streaming client and record mapping.

use std::path::PathBuf;

use serde_json::Value;
use thiserror::Error;

/// Problems with the source's `WITH` parameters or its key file. Always fatal
/// to source creation.
#[derive(Error, Debug)]
pub enum KeyError {
    /// An inline credential parameter is absent and no `key_file` was given
    #[error("key_file or {0} parameter is missing")]
    MissingParameter(&'static str),

    /// A parameter holds something other than a string
    #[error("{key} parameter must be a string: {value}")]
    NotAString { key: &'static str, value: Value },

    /// The key file couldn't be opened
    #[error("cannot open key_file {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The key file couldn't be read after opening
    #[error("cannot read key_file: {0}")]
    Read(#[from] std::io::Error),

    /// Malformed YAML (or JSON) key file
    #[error("cannot parse key_file: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Malformed TOML key file
    #[error("cannot parse key_file: {0}")]
    Toml(#[from] toml::de::Error),

    /// The key file parsed but a field is empty or absent
    #[error("{0} is missing in key_file")]
    MissingField(&'static str),
}

impl KeyError {
    /// True for failures of the filesystem rather than of the content.
    #[must_use]
    pub const fn is_io(&self) -> bool {
        matches!(self, Self::Open { .. } | Self::Read(_))
    }
}

/// Failures of the streaming client itself.
#[derive(Error, Debug)]
pub enum StreamError {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The endpoint answered with a non-success status
    #[error("Twitter API error {status}: {message}")]
    Api { status: u16, message: String },

    /// OAuth signature generation failed
    #[error("OAuth error: {0}")]
    OAuth(String),
}

/// A tweet that can't be represented as a record.
#[derive(Error, Debug, PartialEq)]
pub enum ConvertError {
    #[error("{field} is not a finite number: {value}")]
    NonFiniteNumber { field: &'static str, value: f64 },
}
