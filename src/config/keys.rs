// src/config/keys.rs
use serde::Deserialize;
use serde_json::Value;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::KeyError;
use crate::host::Params;

/// Parameter naming a file that holds all four credentials.
pub const KEY_FILE: &str = "key_file";

/// Credential parameter names, in validation order.
pub const KEY_PARAMS: [&str; 4] = [
    "consumer_key",
    "consumer_secret",
    "access_token",
    "access_token_secret",
];

const ENV_KEY_FILE: &str = "TWITTER_KEY_FILE";
const ENV_KEY_PARAMS: [&str; 4] = [
    "TWITTER_CONSUMER_KEY",
    "TWITTER_CONSUMER_SECRET",
    "TWITTER_ACCESS_TOKEN",
    "TWITTER_ACCESS_TOKEN_SECRET",
];

/// OAuth 1.0a user-context credentials.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub consumer_key: String,
    pub consumer_secret: String,
    pub access_token: String,
    pub access_token_secret: String,
}

/// Key file as written. YAML `~`/`null` and absent keys both land as `None`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawKeys {
    consumer_key: Option<String>,
    consumer_secret: Option<String>,
    access_token: Option<String>,
    access_token_secret: Option<String>,
}

impl From<RawKeys> for Credentials {
    fn from(raw: RawKeys) -> Self {
        Self {
            consumer_key: raw.consumer_key.unwrap_or_default(),
            consumer_secret: raw.consumer_secret.unwrap_or_default(),
            access_token: raw.access_token.unwrap_or_default(),
            access_token_secret: raw.access_token_secret.unwrap_or_default(),
        }
    }
}

impl Credentials {
    fn fields(&self) -> [&str; 4] {
        [
            self.consumer_key.as_str(),
            self.consumer_secret.as_str(),
            self.access_token.as_str(),
            self.access_token_secret.as_str(),
        ]
    }

    fn fields_mut(&mut self) -> [&mut String; 4] {
        [
            &mut self.consumer_key,
            &mut self.consumer_secret,
            &mut self.access_token,
            &mut self.access_token_secret,
        ]
    }

    /// First credential that is empty, by parameter name.
    fn first_missing(&self) -> Option<&'static str> {
        KEY_PARAMS
            .iter()
            .zip(self.fields())
            .find(|(_, v)| v.is_empty())
            .map(|(name, _)| *name)
    }
}

// Secrets stay out of logs; only lengths are shown.
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("consumer_key_len", &self.consumer_key.len())
            .field("consumer_secret_len", &self.consumer_secret.len())
            .field("access_token_len", &self.access_token.len())
            .field("access_token_secret_len", &self.access_token_secret.len())
            .finish()
    }
}

/// Resolve credentials from source parameters.
///
/// `key_file` wins over the inline parameters whenever it is present, even
/// if those are supplied too.
pub fn resolve(params: &Params) -> Result<Credentials, KeyError> {
    if let Some(v) = params.get(KEY_FILE) {
        let path = as_string(KEY_FILE, v)?;
        return load_key_file(path);
    }

    let mut keys = Credentials::default();
    for (name, slot) in KEY_PARAMS.into_iter().zip(keys.fields_mut()) {
        let v = params.get(name).ok_or(KeyError::MissingParameter(name))?;
        *slot = as_string(name, v)?.to_string();
    }
    Ok(keys)
}

fn as_string<'a>(key: &'static str, v: &'a Value) -> Result<&'a str, KeyError> {
    v.as_str().ok_or_else(|| KeyError::NotAString {
        key,
        value: v.clone(),
    })
}

/// Key file formats. TOML is picked by extension; everything else is read as
/// YAML, which also covers JSON documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyFormat {
    Yaml,
    Toml,
}

impl KeyFormat {
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        match ext.as_str() {
            "toml" => Self::Toml,
            _ => Self::Yaml,
        }
    }
}

/// Open `path` and load credentials from it. The handle is closed on return.
pub fn load_key_file(path: impl AsRef<Path>) -> Result<Credentials, KeyError> {
    let path = path.as_ref();
    let f = File::open(path).map_err(|source| KeyError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    load_key(f, KeyFormat::from_path(path))
}

/// Parse credentials from a reader and check none of them is empty.
pub fn load_key<R: Read>(mut r: R, format: KeyFormat) -> Result<Credentials, KeyError> {
    let mut content = String::new();
    r.read_to_string(&mut content)?;

    let raw: RawKeys = if content.trim().is_empty() {
        RawKeys::default()
    } else {
        match format {
            KeyFormat::Yaml => serde_yaml::from_str(&content)?,
            KeyFormat::Toml => toml::from_str(&content)?,
        }
    };
    let keys = Credentials::from(raw);

    match keys.first_missing() {
        Some(name) => Err(KeyError::MissingField(name)),
        None => Ok(keys),
    }
}

/// Build source parameters from the environment:
/// 1) $TWITTER_KEY_FILE becomes `key_file`
/// 2) $TWITTER_CONSUMER_KEY etc. become the inline parameters
///
/// Unset variables are left out so `resolve` reports what is missing.
pub fn params_from_env() -> Params {
    let mut params = Params::new();
    if let Ok(p) = std::env::var(ENV_KEY_FILE) {
        params.insert(KEY_FILE.to_string(), Value::String(p));
    }
    for (name, var) in KEY_PARAMS.into_iter().zip(ENV_KEY_PARAMS) {
        if let Ok(v) = std::env::var(var) {
            params.insert(name.to_string(), Value::String(v));
        }
    }
    params
}
