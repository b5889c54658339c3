//! End-to-end pipeline over the demo credential path:
//! connect -> discover -> plan -> dry-run -> execute -> rollback.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use tether_audit::{AuditFilter, AuditLogger};
use tether_connector::{Connector, ConnectorRegistry};
use tether_core::{Connection, ConnectionStatus, ExecutionMode, RiskLevel, RunStatus};
use tether_github::GithubConnector;
use tether_planner::{PlanOutcome, Planner, PlannerContext};
use tether_runtime::Executor;
use tether_store::{MemoryStore, Store};

struct Pipeline {
    github: Arc<GithubConnector>,
    store: Arc<MemoryStore>,
    audit: Arc<AuditLogger>,
    executor: Executor,
}

fn pipeline() -> Pipeline {
    let github = Arc::new(GithubConnector::demo());
    let registry =
        Arc::new(ConnectorRegistry::new().register(github.clone() as Arc<dyn Connector>));
    let store = Arc::new(MemoryStore::new());
    let audit = Arc::new(AuditLogger::in_memory());
    let executor = Executor::new(registry, store.clone() as Arc<dyn Store>, audit.clone());
    Pipeline {
        github,
        store,
        audit,
        executor,
    }
}

async fn connect(p: &Pipeline) -> Connection {
    let credential = p.github.exchange_code("demo").await.unwrap();
    assert!(credential.demo_mode);

    let discovery = p
        .github
        .discover_capabilities(&credential.access_token)
        .await
        .unwrap();

    let connection = Connection {
        id: Uuid::new_v4(),
        tenant_id: "acme".to_string(),
        user_id: "operator-1".to_string(),
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
    p.store.create_connection(connection.clone()).await.unwrap();
    p.store
        .create_capability_profile(discovery.to_profile(connection.id))
        .await
        .unwrap();
    connection
}

#[tokio::test]
async fn protect_branch_flow_previews_executes_and_rolls_back() {
    let p = pipeline();
    let connection = connect(&p).await;
    let profile = p
        .store
        .get_capability_profile(connection.id)
        .await
        .unwrap()
        .unwrap();

    // Plan from a free-form intent.
    let context = PlannerContext {
        session_id: "session-1".to_string(),
        connection: Some(connection.clone()),
        profile: Some(profile),
    };
    let outcome = Planner::new().generate_plan("protect the main branch of acme/website", &context);
    let PlanOutcome::Plan(mut plan) = outcome else {
        panic!("expected a plan");
    };
    assert_eq!(plan.risk_level, RiskLevel::High);
    assert!(plan.confirm_required);
    p.store.create_plan(plan.clone()).await.unwrap();

    // Dry-run: previews every step, mutates nothing.
    let preview = p
        .executor
        .execute_plan(&plan, &connection, true)
        .await
        .unwrap();
    assert!(preview.success);
    assert!(preview
        .step_results
        .iter()
        .all(|s| s.execution_mode == ExecutionMode::PlanOnly));
    assert!(p
        .github
        .simulated()
        .get_protection("acme/website", "main")
        .unwrap()
        .is_none());

    // Approve, then execute for real.
    plan.approve().unwrap();
    p.store.update_plan(plan.clone()).await.unwrap();
    let run = p
        .executor
        .execute_plan(&plan, &connection, false)
        .await
        .unwrap();
    assert!(run.success);
    assert_eq!(run.status, RunStatus::Succeeded);
    assert!(p
        .github
        .simulated()
        .get_protection("acme/website", "main")
        .unwrap()
        .is_some());
    // Evidence marks the effect as simulated.
    assert_eq!(run.step_results[0].evidence["demoMode"], true);

    // Roll back: protection is removed again; the read step is a recorded
    // limitation, not a failure.
    let record = p
        .executor
        .execute_rollback(run.id, "operator-2")
        .await
        .unwrap();
    assert!(record.success);
    assert!(record.partial);
    assert!(p
        .github
        .simulated()
        .get_protection("acme/website", "main")
        .unwrap()
        .is_none());

    let stored = p.store.get_run(run.id).await.unwrap().unwrap();
    assert_eq!(stored.status, RunStatus::RolledBack);

    // Every state-changing operation left an audit event.
    let events = p
        .audit
        .query(AuditFilter {
            tenant_id: Some("acme".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    // dry-run + real run + rollback (connection bookkeeping is the API
    // layer's job and is exercised in tether-server).
    assert_eq!(events.len(), 3);
}

#[tokio::test]
async fn dry_run_of_archive_leaves_the_repo_untouched() {
    let p = pipeline();
    let connection = connect(&p).await;
    let profile = p
        .store
        .get_capability_profile(connection.id)
        .await
        .unwrap()
        .unwrap();

    let context = PlannerContext {
        session_id: "session-2".to_string(),
        connection: Some(connection.clone()),
        profile: Some(profile),
    };
    let PlanOutcome::Plan(plan) =
        Planner::new().generate_plan("archive acme/api", &context)
    else {
        panic!("expected a plan");
    };
    p.store.create_plan(plan.clone()).await.unwrap();

    let preview = p
        .executor
        .execute_plan(&plan, &connection, true)
        .await
        .unwrap();
    assert!(preview.success);

    let repo = p.github.simulated().get_repo("acme/api").unwrap();
    assert_eq!(repo["archived"], false);
}
