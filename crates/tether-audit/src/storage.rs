//! Audit storage backends.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use crate::error::AuditError;
use crate::event::{AuditEvent, AuditEventType};

/// Filter for querying audit events.
#[derive(Debug, Clone, Default)]
pub struct AuditFilter {
    /// Filter by tenant ID.
    pub tenant_id: Option<String>,
    /// Filter by provider.
    pub provider: Option<String>,
    /// Filter by event type.
    pub event_type: Option<AuditEventType>,
    /// Filter by run.
    pub run_id: Option<uuid::Uuid>,
    /// Maximum number of results (newest first).
    pub limit: Option<usize>,
}

impl AuditFilter {
    fn matches(&self, event: &AuditEvent) -> bool {
        if let Some(tenant) = &self.tenant_id {
            if &event.tenant_id != tenant {
                return false;
            }
        }
        if let Some(provider) = &self.provider {
            if &event.provider != provider {
                return false;
            }
        }
        if let Some(event_type) = self.event_type {
            if event.event_type != event_type {
                return false;
            }
        }
        if let Some(run_id) = self.run_id {
            if event.run_id != Some(run_id) {
                return false;
            }
        }
        true
    }
}

/// Trait for audit storage backends. Append-only: there is no update or
/// delete surface.
#[async_trait]
pub trait AuditStorage: Send + Sync {
    /// Append an audit event.
    async fn store(&self, event: AuditEvent) -> Result<(), AuditError>;

    /// Query audit events, newest first.
    async fn query(&self, filter: AuditFilter) -> Result<Vec<AuditEvent>, AuditError>;
}

/// No-op storage for disabled logging.
pub struct NullStorage;

impl NullStorage {
    pub fn new() -> Self {
        Self
    }
}

impl Default for NullStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AuditStorage for NullStorage {
    async fn store(&self, _event: AuditEvent) -> Result<(), AuditError> {
        Ok(())
    }

    async fn query(&self, _filter: AuditFilter) -> Result<Vec<AuditEvent>, AuditError> {
        Ok(vec![])
    }
}

/// Console storage (logs to stdout).
pub struct ConsoleStorage;

impl ConsoleStorage {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ConsoleStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AuditStorage for ConsoleStorage {
    async fn store(&self, event: AuditEvent) -> Result<(), AuditError> {
        println!("{}", event.log_line());
        Ok(())
    }

    async fn query(&self, _filter: AuditFilter) -> Result<Vec<AuditEvent>, AuditError> {
        // Console storage doesn't support querying.
        Ok(vec![])
    }
}

/// In-memory storage, queryable. Backs the API's audit endpoint and tests.
pub struct MemoryStorage {
    events: RwLock<Vec<AuditEvent>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self {
            events: RwLock::new(Vec::new()),
        }
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AuditStorage for MemoryStorage {
    async fn store(&self, event: AuditEvent) -> Result<(), AuditError> {
        self.events
            .write()
            .map_err(|_| AuditError::StoreFailed("lock poisoned".to_string()))?
            .push(event);
        Ok(())
    }

    async fn query(&self, filter: AuditFilter) -> Result<Vec<AuditEvent>, AuditError> {
        let events = self
            .events
            .read()
            .map_err(|_| AuditError::StoreFailed("lock poisoned".to_string()))?;

        let mut results: Vec<_> = events.iter().filter(|e| filter.matches(e)).cloned().collect();
        results.sort_by(|a, b| b.occurred_at.cmp(&a.occurred_at));
        if let Some(limit) = filter.limit {
            results.truncate(limit);
        }
        Ok(results)
    }
}

/// File storage (appends JSON lines), with an in-memory mirror for
/// querying.
pub struct FileStorage {
    path: PathBuf,
    mirror: MemoryStorage,
}

impl FileStorage {
    pub fn new(path: impl AsRef<Path>) -> Result<Self, AuditError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    AuditError::InitializationFailed(format!(
                        "cannot create audit directory {}: {e}",
                        parent.display()
                    ))
                })?;
            }
        }
        Ok(Self {
            path,
            mirror: MemoryStorage::new(),
        })
    }
}

#[async_trait]
impl AuditStorage for FileStorage {
    async fn store(&self, event: AuditEvent) -> Result<(), AuditError> {
        let json = serde_json::to_string(&event)?;

        use std::io::Write;
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}", json)?;

        self.mirror.store(event).await
    }

    async fn query(&self, filter: AuditFilter) -> Result<Vec<AuditEvent>, AuditError> {
        self.mirror.query(filter).await
    }
}

/// Dual output: file plus console.
pub struct DualStorage {
    file: FileStorage,
}

impl DualStorage {
    pub fn new(path: impl AsRef<Path>) -> Result<Self, AuditError> {
        Ok(Self {
            file: FileStorage::new(path)?,
        })
    }
}

#[async_trait]
impl AuditStorage for DualStorage {
    async fn store(&self, event: AuditEvent) -> Result<(), AuditError> {
        println!("{}", event.log_line());
        self.file.store(event).await
    }

    async fn query(&self, filter: AuditFilter) -> Result<Vec<AuditEvent>, AuditError> {
        self.file.query(filter).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(event_type: AuditEventType, tenant: &str) -> AuditEvent {
        AuditEvent::new(event_type, tenant, "github", "user-1")
    }

    #[tokio::test]
    async fn memory_storage_filters_by_tenant_and_type() {
        let storage = MemoryStorage::new();
        storage
            .store(event(AuditEventType::ConnectionCreated, "acme"))
            .await
            .unwrap();
        storage
            .store(event(AuditEventType::RunExecuted, "acme"))
            .await
            .unwrap();
        storage
            .store(event(AuditEventType::RunExecuted, "globex"))
            .await
            .unwrap();

        let results = storage
            .query(AuditFilter {
                tenant_id: Some("acme".to_string()),
                event_type: Some(AuditEventType::RunExecuted),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].tenant_id, "acme");
    }

    #[tokio::test]
    async fn file_storage_appends_json_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.log");
        let storage = FileStorage::new(&path).unwrap();

        storage
            .store(event(AuditEventType::PlanApproved, "acme"))
            .await
            .unwrap();
        storage
            .store(event(AuditEventType::RunExecuted, "acme"))
            .await
            .unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 2);
        assert!(contents.contains("plan_approved"));

        let results = storage.query(AuditFilter::default()).await.unwrap();
        assert_eq!(results.len(), 2);
    }
}
