//! Dispatch table from (query name, resource type) to panel definition

use super::definition::PanelDefinition;
use crate::error::{TelemetryError, TelemetryResult};
use crate::resource::ResourceType;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Normalized registry key
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PanelKey {
    query_name: String,
    resource_type: ResourceType,
}

impl PanelKey {
    pub fn new(query_name: &str, resource_type: ResourceType) -> Self {
        Self {
            query_name: query_name.trim().to_ascii_lowercase(),
            resource_type,
        }
    }

    /// Parse the resource type; `AWS/EC2` and `ec2` give the same key
    pub fn parse(query_name: &str, resource_type: &str) -> TelemetryResult<Self> {
        let resource_type = resource_type
            .parse()
            .map_err(|e: String| TelemetryError::invalid_input_field(e, "resource_type"))?;
        Ok(Self::new(query_name, resource_type))
    }

    pub fn query_name(&self) -> &str {
        &self.query_name
    }

    pub fn resource_type(&self) -> &ResourceType {
        &self.resource_type
    }
}

impl fmt::Display for PanelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.query_name, self.resource_type)
    }
}

/// Registered panels. Immutable once the engine is built.
#[derive(Debug, Clone, Default)]
pub struct PanelRegistry {
    panels: HashMap<PanelKey, Arc<PanelDefinition>>,
}

impl PanelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from definitions, rejecting duplicate keys
    pub fn from_definitions<I>(definitions: I) -> TelemetryResult<Self>
    where
        I: IntoIterator<Item = PanelDefinition>,
    {
        let mut registry = Self::new();
        for definition in definitions {
            registry.register(definition)?;
        }
        Ok(registry)
    }

    pub fn register(&mut self, definition: PanelDefinition) -> TelemetryResult<()> {
        let key = PanelKey::new(&definition.query_name, definition.resource_type.clone());
        if self.panels.contains_key(&key) {
            return Err(TelemetryError::config(format!(
                "panel {} is registered twice",
                key
            )));
        }
        tracing::debug!("Registered panel {}", key);
        self.panels.insert(key, Arc::new(definition));
        Ok(())
    }

    pub fn get(&self, key: &PanelKey) -> Option<Arc<PanelDefinition>> {
        self.panels.get(key).cloned()
    }

    /// Look up by raw caller strings
    pub fn lookup(
        &self,
        query_name: &str,
        resource_type: &str,
    ) -> TelemetryResult<Arc<PanelDefinition>> {
        let key = PanelKey::parse(query_name, resource_type)
            .map_err(|_| TelemetryError::unknown_panel(query_name, resource_type))?;
        self.get(&key)
            .ok_or_else(|| TelemetryError::unknown_panel(query_name, resource_type))
    }

    pub fn len(&self) -> usize {
        self.panels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.panels.is_empty()
    }

    /// Registered keys, sorted for stable listing
    pub fn keys(&self) -> Vec<PanelKey> {
        let mut keys: Vec<PanelKey> = self.panels.keys().cloned().collect();
        keys.sort_by_key(|k| k.to_string());
        keys
    }
}
