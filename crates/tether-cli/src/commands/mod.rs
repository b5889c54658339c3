pub mod actions;
pub mod demo;
pub mod providers;
pub mod serve;

use std::sync::Arc;

use tether_connector::{Connector, ConnectorRegistry};
use tether_github::GithubConnector;
use tether_core::ProviderConfig;

/// Registry used by the offline commands: demo-configured connectors.
pub fn demo_registry() -> Arc<ConnectorRegistry> {
    Arc::new(
        ConnectorRegistry::new()
            .register(Arc::new(GithubConnector::new(ProviderConfig::default())) as Arc<dyn Connector>),
    )
}
