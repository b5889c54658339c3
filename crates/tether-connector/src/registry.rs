//! Connector registry.
//!
//! Maps a provider identifier to its connector instance. Populated at
//! process start, immutable afterwards, so it needs no locking. An unknown
//! provider is a normal outcome (`None`), distinct from internal errors.

use std::collections::HashMap;
use std::sync::Arc;

use crate::connector::{Connector, ProviderMetadata};

/// Read-mostly mapping from provider id to connector.
pub struct ConnectorRegistry {
    connectors: HashMap<String, Arc<dyn Connector>>,
}

impl ConnectorRegistry {
    pub fn new() -> Self {
        Self {
            connectors: HashMap::new(),
        }
    }

    /// Wire in a connector. The only place new providers are added.
    pub fn register(mut self, connector: Arc<dyn Connector>) -> Self {
        self.connectors
            .insert(connector.provider().to_string(), connector);
        self
    }

    /// Look up a connector by its case-sensitive provider id.
    pub fn lookup(&self, provider_id: &str) -> Option<Arc<dyn Connector>> {
        self.connectors.get(provider_id).cloned()
    }

    /// Provider metadata for UI enumeration, sorted by id.
    pub fn list_available(&self) -> Vec<ProviderMetadata> {
        let mut providers: Vec<_> = self.connectors.values().map(|c| c.metadata()).collect();
        providers.sort_by(|a, b| a.id.cmp(&b.id));
        providers
    }

    pub fn len(&self) -> usize {
        self.connectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connectors.is_empty()
    }
}

impl Default for ConnectorRegistry {
    fn default() -> Self {
        Self::new()
    }
}
