// src/host/mod.rs
//! The slice of the stream engine's plugin surface this connector consumes:
//! execution context, IO parameters, the parameter map, tuples, writers and
//! sources. A host embeds the connector by implementing `Writer` and driving
//! `Source`.

pub mod registry;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

pub use registry::{SourceCreator, SourceRegistry};

/// Parameters supplied by the host when a source is created (`WITH` clause).
pub type Params = Map<String, Value>;

/// A structured record: string keys to dynamic values.
pub type Record = Map<String, Value>;

/// Log attribution for tuples flowing through a node (`NTSource` etc.).
pub const NODE_TYPE_SOURCE: &str = "source";

/// Per-topology execution context handed to every source/writer call.
#[derive(Debug, Clone, Default)]
pub struct Context {
    /// Name of the topology the node lives in; empty when running standalone.
    pub topology: String,
}

impl Context {
    pub fn new(topology: impl Into<String>) -> Self {
        Self {
            topology: topology.into(),
        }
    }
}

/// Identity of the node being created. Only `name` is used, for logging.
#[derive(Debug, Clone, Default)]
pub struct IoParams {
    pub type_name: String,
    pub name: String,
}

impl IoParams {
    pub fn new(type_name: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            name: name.into(),
        }
    }
}

/// The engine's unit of stream processing.
#[derive(Debug, Clone, PartialEq)]
pub struct Tuple {
    pub data: Record,
    /// Event time.
    pub timestamp: DateTime<Utc>,
    /// Wall clock when the tuple entered the engine.
    pub proc_timestamp: DateTime<Utc>,
}

impl Tuple {
    /// Both timestamps start at "now"; sources overwrite `timestamp`.
    pub fn new(data: Record) -> Self {
        let now = Utc::now();
        Self {
            data,
            timestamp: now,
            proc_timestamp: now,
        }
    }
}

/// Downstream sink a source writes into. Ownership of the tuple moves in.
#[async_trait::async_trait]
pub trait Writer: Send + Sync {
    async fn write(&self, ctx: &Context, tuple: Tuple) -> Result<()>;
}

/// A node producing tuples into the processing graph.
#[async_trait::async_trait]
pub trait Source: Send + Sync {
    /// Runs until the source has nothing more to emit or `stop` is called.
    /// Returns an error only when the stream can't continue.
    async fn generate_stream(&self, ctx: &Context, w: &dyn Writer) -> Result<()>;

    /// Asks a running `generate_stream` to return. Must be safe to call from
    /// another task, more than once, and before `generate_stream`.
    async fn stop(&self, ctx: &Context) -> Result<()>;
}
