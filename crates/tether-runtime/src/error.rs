//! Error types for the execution engine.
//!
//! These cover caller mistakes and collaborator failures. Step-level
//! connector errors never appear here: the executor folds them into the
//! failing step's result and keeps the run record intact.

use thiserror::Error;
use uuid::Uuid;

use tether_core::PlanStatus;
use tether_store::StoreError;

/// Errors that can occur around (not inside) a run.
#[derive(Debug, Error)]
pub enum ExecutorError {
    /// The connection is revoked or expired; no step was touched.
    #[error("connection {connection_id} is not active")]
    ConnectionInactive { connection_id: Uuid },

    /// The connection names a provider the registry does not know.
    #[error("unknown provider: {provider}")]
    UnknownProvider { provider: String },

    /// A real run requires an approved, not-yet-terminal plan.
    #[error("plan {plan_id} is {status:?}, expected approved")]
    PlanNotExecutable { plan_id: Uuid, status: PlanStatus },

    /// Rollback target does not exist.
    #[error("run not found: {run_id}")]
    RunNotFound { run_id: Uuid },

    /// The run cannot be rolled back (dry-run, failed, or already rolled
    /// back).
    #[error("run {run_id} is not rollbackable: {reason}")]
    NotRollbackable { run_id: Uuid, reason: String },

    /// Store unavailability is a hard failure, propagated to the caller.
    #[error(transparent)]
    Store(#[from] StoreError),
}
