//! Audit logger implementation.
//!
//! Provides the main `AuditLogger` type with helper methods for logging
//! connection lifecycle, plan lifecycle, execution, and rollback events.

use std::path::PathBuf;
use std::sync::Arc;

use tether_core::config::{AuditConfig, StorageBackend};
use uuid::Uuid;

use crate::error::AuditError;
use crate::event::{AuditEvent, AuditEventType};
use crate::storage::{
    AuditFilter, AuditStorage, ConsoleStorage, DualStorage, FileStorage, MemoryStorage,
    NullStorage,
};

/// The main audit logger.
///
/// Provides convenient methods for appending the one event each
/// state-changing operation produces.
pub struct AuditLogger {
    config: AuditConfig,
    storage: Arc<dyn AuditStorage>,
}

impl AuditLogger {
    /// Create a new audit logger with the given configuration.
    pub fn new(config: AuditConfig) -> Result<Self, AuditError> {
        let storage: Arc<dyn AuditStorage> = if !config.enabled {
            Arc::new(NullStorage::new())
        } else {
            match &config.backend {
                StorageBackend::Console => Arc::new(ConsoleStorage::new()),
                StorageBackend::File => {
                    let file_path = Self::resolve_log_path(&config);
                    if config.stdout {
                        Arc::new(DualStorage::new(&file_path)?)
                    } else {
                        Arc::new(FileStorage::new(&file_path)?)
                    }
                }
            }
        };

        Ok(Self { config, storage })
    }

    /// Create a logger with a custom storage backend.
    pub fn with_storage(config: AuditConfig, storage: Arc<dyn AuditStorage>) -> Self {
        Self { config, storage }
    }

    /// Create a disabled (no-op) logger.
    pub fn disabled() -> Self {
        Self {
            config: AuditConfig {
                enabled: false,
                ..Default::default()
            },
            storage: Arc::new(NullStorage::new()),
        }
    }

    /// Create an in-memory, queryable logger (demo server and tests).
    pub fn in_memory() -> Self {
        Self {
            config: AuditConfig::default(),
            storage: Arc::new(MemoryStorage::new()),
        }
    }

    /// Resolve the log file path from configuration.
    fn resolve_log_path(config: &AuditConfig) -> PathBuf {
        let mut path = PathBuf::from(&config.directory);
        path.push("audit.log");
        path
    }

    /// Check if logging is enabled.
    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Append an audit event.
    pub async fn log(&self, event: AuditEvent) -> Result<(), AuditError> {
        if !self.config.enabled {
            return Ok(());
        }

        // Also log to tracing for structured logging integration.
        tracing::debug!(
            event_id = %event.event_id,
            event_type = %event.event_type,
            tenant = %event.tenant_id,
            provider = %event.provider,
            "Audit event"
        );

        self.storage.store(event).await
    }

    /// Log a connection creation.
    pub async fn log_connection_created(
        &self,
        tenant_id: &str,
        provider: &str,
        actor: &str,
        connection_id: Uuid,
        demo_mode: bool,
    ) -> Result<(), AuditError> {
        self.log(
            AuditEvent::new(AuditEventType::ConnectionCreated, tenant_id, provider, actor)
                .connection_id(connection_id)
                .demo_mode(demo_mode),
        )
        .await
    }

    /// Log an explicit disconnect.
    pub async fn log_connection_revoked(
        &self,
        tenant_id: &str,
        provider: &str,
        actor: &str,
        connection_id: Uuid,
    ) -> Result<(), AuditError> {
        self.log(
            AuditEvent::new(AuditEventType::ConnectionRevoked, tenant_id, provider, actor)
                .connection_id(connection_id),
        )
        .await
    }

    /// Log a capability discovery refresh.
    pub async fn log_capabilities_discovered(
        &self,
        tenant_id: &str,
        provider: &str,
        actor: &str,
        connection_id: Uuid,
        action_count: usize,
        demo_mode: bool,
    ) -> Result<(), AuditError> {
        self.log(
            AuditEvent::new(
                AuditEventType::CapabilitiesDiscovered,
                tenant_id,
                provider,
                actor,
            )
            .connection_id(connection_id)
            .step_count(action_count)
            .demo_mode(demo_mode),
        )
        .await
    }

    /// Log plan creation.
    pub async fn log_plan_created(
        &self,
        tenant_id: &str,
        provider: &str,
        actor: &str,
        plan_id: Uuid,
        step_count: usize,
    ) -> Result<(), AuditError> {
        self.log(
            AuditEvent::new(AuditEventType::PlanCreated, tenant_id, provider, actor)
                .plan_id(plan_id)
                .step_count(step_count),
        )
        .await
    }

    /// Log plan approval.
    pub async fn log_plan_approved(
        &self,
        tenant_id: &str,
        provider: &str,
        actor: &str,
        plan_id: Uuid,
    ) -> Result<(), AuditError> {
        self.log(
            AuditEvent::new(AuditEventType::PlanApproved, tenant_id, provider, actor)
                .plan_id(plan_id),
        )
        .await
    }

    /// Log an execution (real or dry-run).
    #[allow(clippy::too_many_arguments)]
    pub async fn log_run(
        &self,
        tenant_id: &str,
        provider: &str,
        actor: &str,
        plan_id: Uuid,
        run_id: Uuid,
        dry_run: bool,
        success: bool,
        step_count: usize,
        error: Option<&str>,
    ) -> Result<(), AuditError> {
        let event_type = if success {
            AuditEventType::RunExecuted
        } else {
            AuditEventType::RunFailed
        };
        let mut event = AuditEvent::new(event_type, tenant_id, provider, actor)
            .plan_id(plan_id)
            .run_id(run_id)
            .dry_run(dry_run)
            .step_count(step_count);
        if let Some(error) = error {
            event = event.error(error);
        }
        self.log(event).await
    }

    /// Log a rollback attempt.
    pub async fn log_rollback(
        &self,
        tenant_id: &str,
        provider: &str,
        actor: &str,
        run_id: Uuid,
        reversed_steps: usize,
        partial: bool,
    ) -> Result<(), AuditError> {
        self.log(
            AuditEvent::new(AuditEventType::RollbackExecuted, tenant_id, provider, actor)
                .run_id(run_id)
                .step_count(reversed_steps)
                .meta(serde_json::json!({ "partial": partial })),
        )
        .await
    }

    /// Query audit events with filters.
    pub async fn query(&self, filter: AuditFilter) -> Result<Vec<AuditEvent>, AuditError> {
        self.storage.query(filter).await
    }

    /// Get recent events for a tenant.
    pub async fn recent_for_tenant(
        &self,
        tenant_id: &str,
        limit: usize,
    ) -> Result<Vec<AuditEvent>, AuditError> {
        self.query(AuditFilter {
            tenant_id: Some(tenant_id.to_string()),
            limit: Some(limit),
            ..Default::default()
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn disabled_logger_swallows_events() {
        let logger = AuditLogger::disabled();
        assert!(!logger.is_enabled());

        logger
            .log_connection_created("acme", "github", "user-1", Uuid::new_v4(), true)
            .await
            .unwrap();
        assert!(logger.query(AuditFilter::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn in_memory_logger_records_the_full_flow() {
        let logger = AuditLogger::in_memory();
        let connection_id = Uuid::new_v4();
        let plan_id = Uuid::new_v4();
        let run_id = Uuid::new_v4();

        logger
            .log_connection_created("acme", "github", "user-1", connection_id, true)
            .await
            .unwrap();
        logger
            .log_capabilities_discovered("acme", "github", "user-1", connection_id, 10, true)
            .await
            .unwrap();
        logger
            .log_plan_created("acme", "github", "user-1", plan_id, 2)
            .await
            .unwrap();
        logger
            .log_plan_approved("acme", "github", "user-1", plan_id)
            .await
            .unwrap();
        logger
            .log_run("acme", "github", "user-1", plan_id, run_id, false, true, 2, None)
            .await
            .unwrap();
        logger
            .log_rollback("acme", "github", "user-1", run_id, 2, false)
            .await
            .unwrap();

        let events = logger.recent_for_tenant("acme", 10).await.unwrap();
        assert_eq!(events.len(), 6);

        let rollbacks = logger
            .query(AuditFilter {
                run_id: Some(run_id),
                event_type: Some(AuditEventType::RollbackExecuted),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(rollbacks.len(), 1);
        assert_eq!(rollbacks[0].meta["partial"], false);
    }

    #[tokio::test]
    async fn failed_run_is_logged_with_error() {
        let logger = AuditLogger::in_memory();
        logger
            .log_run(
                "acme",
                "github",
                "user-1",
                Uuid::new_v4(),
                Uuid::new_v4(),
                false,
                false,
                1,
                Some("provider request failed"),
            )
            .await
            .unwrap();

        let events = logger
            .query(AuditFilter {
                event_type: Some(AuditEventType::RunFailed),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(events.len(), 1);
        assert!(events[0].error.as_deref().unwrap().contains("provider"));
    }
}
