// src/lib.rs
// Public library surface for hosts embedding the connector (and for integration tests).

pub mod config;
pub mod error;
pub mod host;
pub mod plugin;
pub mod stream;

// ---- Re-exports for stable public API ----
pub use crate::config::{resolve, Credentials};
pub use crate::error::{ConvertError, KeyError, StreamError};
pub use crate::host::{Context, IoParams, Params, Source, SourceRegistry, Tuple, Writer};
pub use crate::plugin::register;
pub use crate::stream::{create_public_stream_source, PublicStreamSource, SOURCE_TYPE};
