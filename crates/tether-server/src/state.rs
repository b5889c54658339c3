//! Shared application state.

use std::sync::Arc;

use tether_audit::AuditLogger;
use tether_connector::ConnectorRegistry;
use tether_core::TetherConfig;
use tether_github::GithubConnector;
use tether_planner::Planner;
use tether_runtime::Executor;
use tether_store::{MemoryStore, Store};

/// Everything the handlers need, behind one `Arc`.
pub struct AppState {
    pub config: TetherConfig,
    pub registry: Arc<ConnectorRegistry>,
    pub store: Arc<dyn Store>,
    pub audit: Arc<AuditLogger>,
    pub planner: Planner,
    pub executor: Executor,
}

impl AppState {
    /// Wire the full stack from configuration. The registry is the only
    /// place providers are added.
    pub fn init(config: TetherConfig) -> anyhow::Result<Arc<Self>> {
        let registry = Arc::new(
            ConnectorRegistry::new()
                .register(Arc::new(GithubConnector::new(config.providers.github.clone()))),
        );
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let audit = Arc::new(AuditLogger::new(config.audit.clone())?);
        let executor = Executor::new(registry.clone(), store.clone(), audit.clone());

        Ok(Arc::new(Self {
            config,
            registry,
            store,
            audit,
            planner: Planner::new(),
            executor,
        }))
    }

    /// State with an in-memory, queryable audit log (demo server and
    /// tests).
    pub fn init_demo() -> Arc<Self> {
        let config = TetherConfig::default();
        let registry = Arc::new(
            ConnectorRegistry::new()
                .register(Arc::new(GithubConnector::new(config.providers.github.clone()))),
        );
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let audit = Arc::new(AuditLogger::in_memory());
        let executor = Executor::new(registry.clone(), store.clone(), audit.clone());

        Arc::new(Self {
            config,
            registry,
            store,
            audit,
            planner: Planner::new(),
            executor,
        })
    }
}
