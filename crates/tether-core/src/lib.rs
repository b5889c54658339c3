//! Core data model shared across all Tether crates.
//!
//! The model follows the action-execution pipeline: a [`Connection`] holds a
//! credential to a provider, a [`CapabilityProfile`] snapshots what that
//! credential can do right now, a [`Plan`] sequences actions against it, and
//! a [`Run`] records one execution attempt with per-step results and
//! rollback material.

pub mod capability;
pub mod config;
pub mod connection;
pub mod plan;
pub mod run;

pub use capability::{
    ActionCapability, AuthLevel, CapabilityProfile, ExecutionMode, RiskLevel, RollbackSupport,
};
pub use config::{AuditConfig, ProviderConfig, ServerConfig, TetherConfig};
pub use connection::{Connection, ConnectionStatus};
pub use plan::{
    aggregate_risk, aggregate_rollbackability, confirm_required, InvalidPlanTransition, Plan,
    PlanStatus, PlanStep, Rollbackability,
};
pub use run::{
    RollbackPlan, RollbackRecord, RollbackStepOutcome, RollbackStepResult, Run, RunStatus,
    StepResult,
};
