//! The demo pipeline: connect, discover, plan, dry-run, execute, rollback,
//! all in-process against the simulated backend.

use std::sync::Arc;

use anyhow::{bail, Context};
use chrono::Utc;
use uuid::Uuid;

use tether_audit::AuditLogger;
use tether_connector::Connector;
use tether_core::{Connection, ConnectionStatus};
use tether_planner::{PlanOutcome, Planner, PlannerContext};
use tether_runtime::Executor;
use tether_store::{MemoryStore, Store};

use crate::commands::demo_registry;

pub async fn run(intent: &str, execute: bool, rollback: bool) -> anyhow::Result<()> {
    let registry = demo_registry();
    let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
    let audit = Arc::new(AuditLogger::in_memory());
    let executor = Executor::new(registry.clone(), store.clone(), audit.clone());

    let connector = registry
        .lookup("github")
        .context("github connector must be registered")?;

    // Connect with the demo credential and discover what it can do.
    let credential = connector.exchange_code("demo").await?;
    let discovery = connector
        .discover_capabilities(&credential.access_token)
        .await?;
    println!(
        "connected as {} (demo), {} actions available",
        discovery.account_name,
        discovery.actions.len()
    );

    let connection = Connection {
        id: Uuid::new_v4(),
        tenant_id: "demo-tenant".to_string(),
        user_id: "demo-operator".to_string(),
        provider: "github".to_string(),
        account_id: discovery.account_id.clone(),
        account_name: discovery.account_name.clone(),
        auth_level: discovery.auth_level,
        scopes: discovery.scopes.clone(),
        status: ConnectionStatus::Active,
        access_token: credential.access_token.clone(),
        refresh_token: None,
        token_expires_at: credential.expires_at,
        last_discovered_at: Some(Utc::now()),
        created_at: Utc::now(),
    };
    store.create_connection(connection.clone()).await?;
    let profile = discovery.to_profile(connection.id);
    store.create_capability_profile(profile.clone()).await?;

    // Plan.
    let context = PlannerContext {
        session_id: "cli-demo".to_string(),
        connection: Some(connection.clone()),
        profile: Some(profile),
    };
    let mut plan = match Planner::new().generate_plan(intent, &context) {
        PlanOutcome::Plan(plan) => plan,
        PlanOutcome::NoMatch => bail!("no plan template matches: {intent}"),
        PlanOutcome::NoConnection => bail!("no active connection"),
        PlanOutcome::InsufficientPermissions {
            granted,
            missing_actions,
        } => bail!(
            "insufficient permissions (granted {granted:?}) for {}",
            missing_actions.join(", ")
        ),
    };
    println!(
        "plan '{}': {} step(s), risk {:?}, confirm required: {}",
        plan.title,
        plan.steps.len(),
        plan.risk_level,
        plan.confirm_required
    );
    store.create_plan(plan.clone()).await?;

    // Dry-run first, always.
    let preview = executor.execute_plan(&plan, &connection, true).await?;
    println!("dry-run: success={}", preview.success);
    for step in &preview.step_results {
        println!(
            "  {} -> {}",
            step.action_id,
            serde_json::to_string(&step.output)?
        );
    }

    if !execute {
        return Ok(());
    }

    // Approve, then run for real.
    plan.approve()?;
    store.update_plan(plan.clone()).await?;
    let run = executor.execute_plan(&plan, &connection, false).await?;
    println!(
        "executed: run {} success={} snapshot={:?}",
        run.id, run.success, run.snapshot_id
    );
    if let Some(error) = &run.error {
        println!("  error: {error}");
    }

    if !rollback || !run.success {
        return Ok(());
    }

    let record = executor.execute_rollback(run.id, "demo-operator").await?;
    println!(
        "rollback: success={} partial={} ({} step(s))",
        record.success,
        record.partial,
        record.steps.len()
    );
    for step in &record.steps {
        println!("  {} -> {:?}", step.action_id, step.outcome);
    }

    Ok(())
}
