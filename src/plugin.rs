// src/plugin.rs
//! Registration of the connector's source types into a host registry. Hosts
//! call [`register`] once during their own startup.

use anyhow::Result;
use std::sync::Arc;

use crate::host::SourceRegistry;
use crate::stream::{create_public_stream_source, SOURCE_TYPE};

pub fn register(registry: &mut SourceRegistry) -> Result<()> {
    registry.register(SOURCE_TYPE, Arc::new(create_public_stream_source))
}
