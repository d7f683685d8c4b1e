//! Resource enumeration for fan-out panels
//!
//! A fan-out request that names no targets covers every resource of the
//! panel's type the inventory can see.

use super::identity::{ResourceIdentity, ResourceType};
use crate::error::TelemetryResult;
use async_trait::async_trait;
use std::collections::HashMap;

/// Lists the resources of one type visible to the caller
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ResourceInventory: Send + Sync {
    /// Every visible resource of `resource_type`; may be empty
    async fn list(&self, resource_type: &ResourceType) -> TelemetryResult<Vec<ResourceIdentity>>;
}

/// Fixed inventory built up front, e.g. from a deployment manifest
#[derive(Debug, Clone, Default)]
pub struct StaticInventory {
    resources: HashMap<ResourceType, Vec<String>>,
}

impl StaticInventory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add ids under `resource_type`, keeping insertion order
    pub fn with_resources<I, S>(mut self, resource_type: ResourceType, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.resources
            .entry(resource_type)
            .or_default()
            .extend(ids.into_iter().map(Into::into));
        self
    }
}

#[async_trait]
impl ResourceInventory for StaticInventory {
    async fn list(&self, resource_type: &ResourceType) -> TelemetryResult<Vec<ResourceIdentity>> {
        let ids = self.resources.get(resource_type).map(Vec::as_slice).unwrap_or_default();
        Ok(ids
            .iter()
            .map(|id| ResourceIdentity::new(id.as_str(), resource_type.clone()))
            .collect())
    }
}
