// src/host/registry.rs
use anyhow::{anyhow, bail, Result};
use std::collections::HashMap;
use std::sync::Arc;

use super::{Context, IoParams, Params, Source};

/// Factory the host calls when a `CREATE SOURCE ... TYPE <name>` is issued.
pub type SourceCreator =
    Arc<dyn Fn(&Context, &IoParams, &Params) -> Result<Box<dyn Source>> + Send + Sync>;

/// Table of source types known to the host. Applications build one during
/// startup and register plugins into it explicitly.
#[derive(Default, Clone)]
pub struct SourceRegistry {
    creators: HashMap<String, SourceCreator>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Type names are case-insensitive; registering a name twice is an error.
    pub fn register(&mut self, type_name: &str, creator: SourceCreator) -> Result<()> {
        let key = type_name.to_ascii_lowercase();
        if key.is_empty() {
            bail!("source type name must not be empty");
        }
        if self.creators.contains_key(&key) {
            bail!("source type {type_name} is already registered");
        }
        self.creators.insert(key, creator);
        Ok(())
    }

    pub fn lookup(&self, type_name: &str) -> Option<SourceCreator> {
        self.creators.get(&type_name.to_ascii_lowercase()).cloned()
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.creators.contains_key(&type_name.to_ascii_lowercase())
    }

    /// Looks up `io.type_name` and runs its creator.
    pub fn create(&self, ctx: &Context, io: &IoParams, params: &Params) -> Result<Box<dyn Source>> {
        let creator = self
            .lookup(&io.type_name)
            .ok_or_else(|| anyhow!("source type {} is not registered", io.type_name))?;
        creator(ctx, io, params)
    }
}

impl std::fmt::Debug for SourceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&String> = self.creators.keys().collect();
        names.sort();
        f.debug_struct("SourceRegistry")
            .field("types", &names)
            .finish()
    }
}
