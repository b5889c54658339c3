//! In-memory store.
//!
//! Backs the demo path and tests. Maps live behind `RwLock`s; each method
//! touches a single record, matching the per-record consistency contract.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use uuid::Uuid;

use tether_core::{CapabilityProfile, Connection, Plan, RollbackRecord, Run};

use crate::{Store, StoreError};

#[derive(Default)]
pub struct MemoryStore {
    connections: RwLock<HashMap<Uuid, Connection>>,
    /// Keyed by connection id: a new discovery supersedes the old profile.
    profiles: RwLock<HashMap<Uuid, CapabilityProfile>>,
    plans: RwLock<HashMap<Uuid, Plan>>,
    runs: RwLock<HashMap<Uuid, Run>>,
    rollbacks: RwLock<Vec<RollbackRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock_err<T>(_: T) -> StoreError {
    StoreError::Storage("store lock poisoned".to_string())
}

#[async_trait]
impl Store for MemoryStore {
    async fn create_connection(&self, connection: Connection) -> Result<(), StoreError> {
        self.connections
            .write()
            .map_err(lock_err)?
            .insert(connection.id, connection);
        Ok(())
    }

    async fn get_connection(&self, id: Uuid) -> Result<Option<Connection>, StoreError> {
        Ok(self.connections.read().map_err(lock_err)?.get(&id).cloned())
    }

    async fn update_connection(&self, connection: Connection) -> Result<(), StoreError> {
        let mut connections = self.connections.write().map_err(lock_err)?;
        if !connections.contains_key(&connection.id) {
            return Err(StoreError::MissingRecord {
                kind: "connection",
                id: connection.id,
            });
        }
        connections.insert(connection.id, connection);
        Ok(())
    }

    async fn create_capability_profile(
        &self,
        profile: CapabilityProfile,
    ) -> Result<(), StoreError> {
        self.profiles
            .write()
            .map_err(lock_err)?
            .insert(profile.connection_id, profile);
        Ok(())
    }

    async fn get_capability_profile(
        &self,
        connection_id: Uuid,
    ) -> Result<Option<CapabilityProfile>, StoreError> {
        Ok(self
            .profiles
            .read()
            .map_err(lock_err)?
            .get(&connection_id)
            .cloned())
    }

    async fn create_plan(&self, plan: Plan) -> Result<(), StoreError> {
        self.plans.write().map_err(lock_err)?.insert(plan.id, plan);
        Ok(())
    }

    async fn get_plan(&self, id: Uuid) -> Result<Option<Plan>, StoreError> {
        Ok(self.plans.read().map_err(lock_err)?.get(&id).cloned())
    }

    async fn update_plan(&self, plan: Plan) -> Result<(), StoreError> {
        let mut plans = self.plans.write().map_err(lock_err)?;
        if !plans.contains_key(&plan.id) {
            return Err(StoreError::MissingRecord {
                kind: "plan",
                id: plan.id,
            });
        }
        plans.insert(plan.id, plan);
        Ok(())
    }

    async fn create_run(&self, run: Run) -> Result<(), StoreError> {
        self.runs.write().map_err(lock_err)?.insert(run.id, run);
        Ok(())
    }

    async fn get_run(&self, id: Uuid) -> Result<Option<Run>, StoreError> {
        Ok(self.runs.read().map_err(lock_err)?.get(&id).cloned())
    }

    async fn update_run(&self, run: Run) -> Result<(), StoreError> {
        let mut runs = self.runs.write().map_err(lock_err)?;
        if !runs.contains_key(&run.id) {
            return Err(StoreError::MissingRecord {
                kind: "run",
                id: run.id,
            });
        }
        runs.insert(run.id, run);
        Ok(())
    }

    async fn create_rollback_record(&self, record: RollbackRecord) -> Result<(), StoreError> {
        self.rollbacks.write().map_err(lock_err)?.push(record);
        Ok(())
    }

    async fn get_rollback_records(&self, run_id: Uuid) -> Result<Vec<RollbackRecord>, StoreError> {
        Ok(self
            .rollbacks
            .read()
            .map_err(lock_err)?
            .iter()
            .filter(|r| r.run_id == run_id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tether_core::{AuthLevel, ConnectionStatus};

    fn connection() -> Connection {
        Connection {
            id: Uuid::new_v4(),
            tenant_id: "acme".to_string(),
            user_id: "u".to_string(),
            provider: "github".to_string(),
            account_id: "1".to_string(),
            account_name: "bot".to_string(),
            auth_level: AuthLevel::Read,
            scopes: vec![],
            status: ConnectionStatus::Active,
            access_token: "demo-x".to_string(),
            refresh_token: None,
            token_expires_at: None,
            last_discovered_at: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn missing_lookup_is_none_not_error() {
        let store = MemoryStore::new();
        assert!(store.get_connection(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_of_absent_record_is_an_error() {
        let store = MemoryStore::new();
        let err = store.update_connection(connection()).await.unwrap_err();
        assert!(matches!(err, StoreError::MissingRecord { kind: "connection", .. }));
    }

    #[tokio::test]
    async fn fresh_profile_supersedes_the_old_one() {
        let store = MemoryStore::new();
        let conn = connection();
        let make_profile = |limitations: Vec<String>| CapabilityProfile {
            connection_id: conn.id,
            actions: vec![],
            readable_capabilities: vec![],
            write_capabilities: vec![],
            limitations,
            discovered_at: Utc::now(),
        };

        store
            .create_capability_profile(make_profile(vec!["missing scope: repo".to_string()]))
            .await
            .unwrap();
        store.create_capability_profile(make_profile(vec![])).await.unwrap();

        let profile = store.get_capability_profile(conn.id).await.unwrap().unwrap();
        assert!(profile.limitations.is_empty());
    }
}
