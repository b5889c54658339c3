//! Persistence boundary.
//!
//! The engine behind this trait is a deployment choice; this core only
//! relies on the contract: durable, strongly consistent per record. The
//! in-memory implementation backs the demo path and tests.

pub mod memory;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use tether_core::{CapabilityProfile, Connection, Plan, RollbackRecord, Run};

pub use memory::MemoryStore;

/// Errors from the persistence boundary.
///
/// Absence of a record is not an error — lookups return `Option`.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Write targeted a record that does not exist.
    #[error("{kind} not found: {id}")]
    MissingRecord { kind: &'static str, id: Uuid },

    /// Storage backend failure.
    #[error("storage error: {0}")]
    Storage(String),
}

/// Durable persistence for connections, profiles, plans, runs, and
/// rollback records.
#[async_trait]
pub trait Store: Send + Sync {
    async fn create_connection(&self, connection: Connection) -> Result<(), StoreError>;
    async fn get_connection(&self, id: Uuid) -> Result<Option<Connection>, StoreError>;
    async fn update_connection(&self, connection: Connection) -> Result<(), StoreError>;

    /// Store a fresh profile for a connection, superseding any previous
    /// one. Profiles are replaced whole; there is no partial update.
    async fn create_capability_profile(&self, profile: CapabilityProfile)
        -> Result<(), StoreError>;
    async fn get_capability_profile(
        &self,
        connection_id: Uuid,
    ) -> Result<Option<CapabilityProfile>, StoreError>;

    async fn create_plan(&self, plan: Plan) -> Result<(), StoreError>;
    async fn get_plan(&self, id: Uuid) -> Result<Option<Plan>, StoreError>;
    async fn update_plan(&self, plan: Plan) -> Result<(), StoreError>;

    async fn create_run(&self, run: Run) -> Result<(), StoreError>;
    async fn get_run(&self, id: Uuid) -> Result<Option<Run>, StoreError>;
    /// The one permitted post-completion update: the rollback reference.
    async fn update_run(&self, run: Run) -> Result<(), StoreError>;

    async fn create_rollback_record(&self, record: RollbackRecord) -> Result<(), StoreError>;
    async fn get_rollback_records(&self, run_id: Uuid) -> Result<Vec<RollbackRecord>, StoreError>;
}
