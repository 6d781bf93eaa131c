// src/config/mod.rs
pub mod keys;

pub use keys::{load_key_file, params_from_env, resolve, Credentials, KeyFormat};
