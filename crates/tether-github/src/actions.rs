//! Per-action handlers.
//!
//! Every handler follows the same contract: select the live or simulated
//! backend once, perform zero mutating calls on a dry-run (returning a
//! projected outcome plus the current state as snapshot), and on a real run
//! of a rollback-capable action, record a rollback plan that is sufficient
//! on its own to reverse the effect.

use futures::future::BoxFuture;
use serde_json::{json, Value};

use tether_connector::{
    ActionRequest, ActionResult, ConnectorError, HandlerTable, Strategy,
};
use tether_core::{ExecutionMode, RollbackPlan};

use crate::api::GithubApi;
use crate::catalog;
use crate::simulated::{BranchProtection, SimulatedGithub};
use crate::GithubConnector;

/// Build the dispatch table. Adding an action is one registration here plus
/// its catalog entry.
pub(crate) fn handler_table() -> HandlerTable<GithubConnector> {
    let mut table = HandlerTable::new();
    table
        .register(catalog::REPO_GET, repo_get)
        .register(catalog::REPO_LIST, repo_list)
        .register(catalog::ISSUE_LIST, issue_list)
        .register(catalog::ISSUE_CREATE, issue_create)
        .register(catalog::ISSUE_CLOSE, issue_close)
        .register(catalog::ISSUE_REOPEN, issue_reopen)
        .register(catalog::ISSUE_COMMENT, issue_comment)
        .register(catalog::REPO_SET_DEFAULT_BRANCH, set_default_branch)
        .register(catalog::REPO_SET_BRANCH_PROTECTION, set_branch_protection)
        .register(catalog::REPO_ARCHIVE, repo_archive);
    table
}

fn repo_get(c: &GithubConnector, r: ActionRequest) -> BoxFuture<'_, Result<ActionResult, ConnectorError>> {
    Box::pin(c.handle_repo_get(r))
}
fn repo_list(c: &GithubConnector, r: ActionRequest) -> BoxFuture<'_, Result<ActionResult, ConnectorError>> {
    Box::pin(c.handle_repo_list(r))
}
fn issue_list(c: &GithubConnector, r: ActionRequest) -> BoxFuture<'_, Result<ActionResult, ConnectorError>> {
    Box::pin(c.handle_issue_list(r))
}
fn issue_create(c: &GithubConnector, r: ActionRequest) -> BoxFuture<'_, Result<ActionResult, ConnectorError>> {
    Box::pin(c.handle_issue_create(r))
}
fn issue_close(c: &GithubConnector, r: ActionRequest) -> BoxFuture<'_, Result<ActionResult, ConnectorError>> {
    Box::pin(c.handle_issue_set_state(r, "closed", catalog::ISSUE_REOPEN))
}
fn issue_reopen(c: &GithubConnector, r: ActionRequest) -> BoxFuture<'_, Result<ActionResult, ConnectorError>> {
    Box::pin(c.handle_issue_set_state(r, "open", catalog::ISSUE_CLOSE))
}
fn issue_comment(c: &GithubConnector, r: ActionRequest) -> BoxFuture<'_, Result<ActionResult, ConnectorError>> {
    Box::pin(c.handle_issue_comment(r))
}
fn set_default_branch(c: &GithubConnector, r: ActionRequest) -> BoxFuture<'_, Result<ActionResult, ConnectorError>> {
    Box::pin(c.handle_set_default_branch(r))
}
fn set_branch_protection(c: &GithubConnector, r: ActionRequest) -> BoxFuture<'_, Result<ActionResult, ConnectorError>> {
    Box::pin(c.handle_set_branch_protection(r))
}
fn repo_archive(c: &GithubConnector, r: ActionRequest) -> BoxFuture<'_, Result<ActionResult, ConnectorError>> {
    Box::pin(c.handle_repo_archive(r))
}

// ---- input parsing ----------------------------------------------------

fn require_str<'a>(input: &'a Value, action_id: &str, field: &str) -> Result<&'a str, ConnectorError> {
    input[field]
        .as_str()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ConnectorError::InvalidInput {
            action_id: action_id.to_string(),
            reason: format!("missing required field '{field}'"),
        })
}

fn require_u64(input: &Value, action_id: &str, field: &str) -> Result<u64, ConnectorError> {
    input[field]
        .as_u64()
        .ok_or_else(|| ConnectorError::InvalidInput {
            action_id: action_id.to_string(),
            reason: format!("missing required numeric field '{field}'"),
        })
}

fn optional_protection(input: &Value) -> Result<Option<BranchProtection>, ConnectorError> {
    match input.get("protection") {
        None | Some(Value::Null) => Ok(None),
        Some(v) => serde_json::from_value(v.clone())
            .map(Some)
            .map_err(|e| ConnectorError::InvalidInput {
                action_id: catalog::REPO_SET_BRANCH_PROTECTION.to_string(),
                reason: format!("invalid protection settings: {e}"),
            }),
    }
}

// ---- result builders ---------------------------------------------------

fn evidence(demo: bool) -> Value {
    json!({ "provider": "github", "demoMode": demo })
}

fn read_result(output: Value, demo: bool, dry_run: bool) -> ActionResult {
    ActionResult {
        execution_mode: if dry_run {
            ExecutionMode::PlanOnly
        } else {
            ExecutionMode::ReadOnly
        },
        output,
        evidence: evidence(demo),
        snapshot: None,
        rollback_plan: None,
    }
}

fn preview_result(would_apply: Value, snapshot: Value, demo: bool) -> ActionResult {
    ActionResult {
        execution_mode: ExecutionMode::PlanOnly,
        output: would_apply,
        evidence: evidence(demo),
        snapshot: Some(snapshot),
        rollback_plan: None,
    }
}

fn applied_result(
    output: Value,
    snapshot: Option<Value>,
    rollback_plan: Option<RollbackPlan>,
    demo: bool,
) -> ActionResult {
    ActionResult {
        execution_mode: ExecutionMode::Auto,
        output,
        evidence: evidence(demo),
        snapshot,
        rollback_plan,
    }
}

/// Translate canonical protection settings into the REST body GitHub
/// expects.
fn live_protection_body(p: &BranchProtection) -> Value {
    json!({
        "required_status_checks": if p.required_status_checks.is_empty() {
            Value::Null
        } else {
            json!({ "strict": true, "contexts": p.required_status_checks })
        },
        "enforce_admins": p.enforce_admins,
        "required_pull_request_reviews": {
            "required_approving_review_count": p.required_reviews
        },
        "restrictions": Value::Null,
    })
}

/// Reduce a live protection response to the canonical shape used in
/// snapshots and rollback plans.
fn canonical_protection(live: &Value) -> BranchProtection {
    BranchProtection {
        required_reviews: live["required_pull_request_reviews"]["required_approving_review_count"]
            .as_u64()
            .unwrap_or(0) as u32,
        enforce_admins: live["enforce_admins"]["enabled"].as_bool().unwrap_or(false),
        required_status_checks: live["required_status_checks"]["contexts"]
            .as_array()
            .map(|a| {
                a.iter()
                    .filter_map(|c| c.as_str().map(String::from))
                    .collect()
            })
            .unwrap_or_default(),
    }
}

fn protection_json(p: &Option<BranchProtection>) -> Value {
    match p {
        Some(p) => serde_json::to_value(p).unwrap_or(Value::Null),
        None => Value::Null,
    }
}

// ---- handlers ----------------------------------------------------------

impl GithubConnector {
    fn backend<'a>(&'a self, request: &ActionRequest) -> Strategy<&'a GithubApi, &'a SimulatedGithub> {
        Strategy::select(&request.context.access_token, self.api(), self.simulated())
    }

    pub(crate) async fn handle_repo_get(
        &self,
        request: ActionRequest,
    ) -> Result<ActionResult, ConnectorError> {
        let repo = require_str(&request.input, catalog::REPO_GET, "repo")?.to_string();
        let backend = self.backend(&request);
        let demo = backend.is_simulated();
        let output = match backend {
            Strategy::Live(api) => api.get_repo(&request.context.access_token, &repo).await?,
            Strategy::Simulated(sim) => sim.get_repo(&repo)?,
        };
        Ok(read_result(output, demo, request.dry_run))
    }

    pub(crate) async fn handle_repo_list(
        &self,
        request: ActionRequest,
    ) -> Result<ActionResult, ConnectorError> {
        let backend = self.backend(&request);
        let demo = backend.is_simulated();
        let output = match backend {
            Strategy::Live(api) => api.list_repos(&request.context.access_token).await?,
            Strategy::Simulated(sim) => Value::Array(sim.list_repos()),
        };
        Ok(read_result(output, demo, request.dry_run))
    }

    pub(crate) async fn handle_issue_list(
        &self,
        request: ActionRequest,
    ) -> Result<ActionResult, ConnectorError> {
        let repo = require_str(&request.input, catalog::ISSUE_LIST, "repo")?.to_string();
        let backend = self.backend(&request);
        let demo = backend.is_simulated();
        let output = match backend {
            Strategy::Live(api) => api.list_issues(&request.context.access_token, &repo).await?,
            Strategy::Simulated(sim) => serde_json::to_value(sim.list_issues(&repo)?)?,
        };
        Ok(read_result(output, demo, request.dry_run))
    }

    pub(crate) async fn handle_issue_create(
        &self,
        request: ActionRequest,
    ) -> Result<ActionResult, ConnectorError> {
        let repo = require_str(&request.input, catalog::ISSUE_CREATE, "repo")?.to_string();
        let title = require_str(&request.input, catalog::ISSUE_CREATE, "title")?.to_string();
        let body = request.input["body"].as_str().unwrap_or_default().to_string();

        let backend = self.backend(&request);
        let demo = backend.is_simulated();

        if request.dry_run {
            // Confirm the repository exists; no issue is created.
            let snapshot = match backend {
                Strategy::Live(api) => api.get_repo(&request.context.access_token, &repo).await?,
                Strategy::Simulated(sim) => sim.get_repo(&repo)?,
            };
            return Ok(preview_result(
                json!({ "wouldApply": { "createIssue": { "repo": repo, "title": title } } }),
                snapshot,
                demo,
            ));
        }

        let (created, number) = match backend {
            Strategy::Live(api) => {
                let issue = api
                    .create_issue(&request.context.access_token, &repo, &title, &body)
                    .await?;
                let number = issue["number"].as_u64().unwrap_or_default();
                (issue, number)
            }
            Strategy::Simulated(sim) => {
                let issue = sim.create_issue(&repo, &title, &body)?;
                let number = issue.number;
                (serde_json::to_value(issue)?, number)
            }
        };

        Ok(applied_result(
            created,
            None,
            Some(RollbackPlan {
                action_id: catalog::ISSUE_CLOSE.to_string(),
                input: json!({ "repo": repo, "number": number }),
            }),
            demo,
        ))
    }

    /// Shared close/reopen path: the rollback of one is the other.
    pub(crate) async fn handle_issue_set_state(
        &self,
        request: ActionRequest,
        target_state: &str,
        reverse_action: &str,
    ) -> Result<ActionResult, ConnectorError> {
        let action_id = if target_state == "closed" {
            catalog::ISSUE_CLOSE
        } else {
            catalog::ISSUE_REOPEN
        };
        let repo = require_str(&request.input, action_id, "repo")?.to_string();
        let number = require_u64(&request.input, action_id, "number")?;

        let backend = self.backend(&request);
        let demo = backend.is_simulated();

        if request.dry_run {
            let current = match backend {
                Strategy::Live(api) => {
                    api.get_issue(&request.context.access_token, &repo, number)
                        .await?
                }
                Strategy::Simulated(sim) => serde_json::to_value(sim.get_issue(&repo, number)?)?,
            };
            return Ok(preview_result(
                json!({ "wouldApply": { "issue": number, "state": target_state } }),
                current,
                demo,
            ));
        }

        let (previous, updated) = match backend {
            Strategy::Live(api) => {
                let previous = api
                    .get_issue(&request.context.access_token, &repo, number)
                    .await?;
                let updated = api
                    .set_issue_state(&request.context.access_token, &repo, number, target_state)
                    .await?;
                (previous, updated)
            }
            Strategy::Simulated(sim) => {
                let previous = sim.set_issue_state(&repo, number, target_state)?;
                let updated = sim.get_issue(&repo, number)?;
                (serde_json::to_value(previous)?, serde_json::to_value(updated)?)
            }
        };

        Ok(applied_result(
            updated,
            Some(previous),
            Some(RollbackPlan {
                action_id: reverse_action.to_string(),
                input: json!({ "repo": repo, "number": number }),
            }),
            demo,
        ))
    }

    pub(crate) async fn handle_issue_comment(
        &self,
        request: ActionRequest,
    ) -> Result<ActionResult, ConnectorError> {
        let repo = require_str(&request.input, catalog::ISSUE_COMMENT, "repo")?.to_string();
        let number = require_u64(&request.input, catalog::ISSUE_COMMENT, "number")?;
        let comment = require_str(&request.input, catalog::ISSUE_COMMENT, "body")?.to_string();

        let backend = self.backend(&request);
        let demo = backend.is_simulated();

        if request.dry_run {
            let current = match backend {
                Strategy::Live(api) => {
                    api.get_issue(&request.context.access_token, &repo, number)
                        .await?
                }
                Strategy::Simulated(sim) => serde_json::to_value(sim.get_issue(&repo, number)?)?,
            };
            return Ok(preview_result(
                json!({ "wouldApply": { "comment": { "issue": number } } }),
                current,
                demo,
            ));
        }

        let output = match backend {
            Strategy::Live(api) => {
                api.comment_issue(&request.context.access_token, &repo, number, &comment)
                    .await?
            }
            Strategy::Simulated(sim) => serde_json::to_value(sim.comment_issue(&repo, number, &comment)?)?,
        };

        // Comments declare no rollback support.
        Ok(applied_result(output, None, None, demo))
    }

    pub(crate) async fn handle_set_default_branch(
        &self,
        request: ActionRequest,
    ) -> Result<ActionResult, ConnectorError> {
        let repo =
            require_str(&request.input, catalog::REPO_SET_DEFAULT_BRANCH, "repo")?.to_string();
        let branch =
            require_str(&request.input, catalog::REPO_SET_DEFAULT_BRANCH, "branch")?.to_string();

        let backend = self.backend(&request);
        let demo = backend.is_simulated();

        let current_branch = match &backend {
            Strategy::Live(api) => api.get_repo(&request.context.access_token, &repo).await?
                ["default_branch"]
                .as_str()
                .unwrap_or_default()
                .to_string(),
            Strategy::Simulated(sim) => sim.get_repo(&repo)?["defaultBranch"]
                .as_str()
                .unwrap_or_default()
                .to_string(),
        };

        if request.dry_run {
            return Ok(preview_result(
                json!({ "wouldApply": { "defaultBranch": branch } }),
                json!({ "defaultBranch": current_branch }),
                demo,
            ));
        }

        let output = match backend {
            Strategy::Live(api) => {
                api.update_repo(
                    &request.context.access_token,
                    &repo,
                    &json!({ "default_branch": branch }),
                )
                .await?
            }
            Strategy::Simulated(sim) => {
                sim.set_default_branch(&repo, &branch)?;
                sim.get_repo(&repo)?
            }
        };

        Ok(applied_result(
            output,
            Some(json!({ "defaultBranch": current_branch.clone() })),
            Some(RollbackPlan {
                action_id: catalog::REPO_SET_DEFAULT_BRANCH.to_string(),
                input: json!({ "repo": repo, "branch": current_branch }),
            }),
            demo,
        ))
    }

    pub(crate) async fn handle_set_branch_protection(
        &self,
        request: ActionRequest,
    ) -> Result<ActionResult, ConnectorError> {
        let action_id = catalog::REPO_SET_BRANCH_PROTECTION;
        let repo = require_str(&request.input, action_id, "repo")?.to_string();
        let branch = require_str(&request.input, action_id, "branch")?.to_string();
        let desired = optional_protection(&request.input)?;

        let backend = self.backend(&request);
        let demo = backend.is_simulated();

        // Pre-change state, captured for both preview and rollback.
        let current = match &backend {
            Strategy::Live(api) => api
                .get_branch_protection(&request.context.access_token, &repo, &branch)
                .await?
                .map(|live| canonical_protection(&live)),
            Strategy::Simulated(sim) => sim.get_protection(&repo, &branch)?,
        };
        let snapshot =
            json!({ "branch": branch.clone(), "protection": protection_json(&current) });

        if request.dry_run {
            return Ok(preview_result(
                json!({ "wouldApply": { "branch": branch, "protection": protection_json(&desired) } }),
                snapshot,
                demo,
            ));
        }

        match &backend {
            Strategy::Live(api) => match &desired {
                Some(p) => {
                    api.put_branch_protection(
                        &request.context.access_token,
                        &repo,
                        &branch,
                        &live_protection_body(p),
                    )
                    .await?;
                }
                None => {
                    api.delete_branch_protection(&request.context.access_token, &repo, &branch)
                        .await?;
                }
            },
            Strategy::Simulated(sim) => {
                sim.set_protection(&repo, &branch, desired.clone())?;
            }
        }

        Ok(applied_result(
            json!({ "branch": branch.clone(), "protection": protection_json(&desired) }),
            Some(snapshot),
            Some(RollbackPlan {
                action_id: action_id.to_string(),
                input: json!({
                    "repo": repo,
                    "branch": branch,
                    "protection": protection_json(&current),
                }),
            }),
            demo,
        ))
    }

    pub(crate) async fn handle_repo_archive(
        &self,
        request: ActionRequest,
    ) -> Result<ActionResult, ConnectorError> {
        let repo = require_str(&request.input, catalog::REPO_ARCHIVE, "repo")?.to_string();
        let archived = request.input["archived"].as_bool().unwrap_or(true);

        let backend = self.backend(&request);
        let demo = backend.is_simulated();

        let current = match &backend {
            Strategy::Live(api) => api.get_repo(&request.context.access_token, &repo).await?
                ["archived"]
                .as_bool()
                .unwrap_or(false),
            Strategy::Simulated(sim) => sim.get_repo(&repo)?["archived"]
                .as_bool()
                .unwrap_or(false),
        };

        if request.dry_run {
            return Ok(preview_result(
                json!({ "wouldApply": { "archived": archived } }),
                json!({ "archived": current }),
                demo,
            ));
        }

        let output = match backend {
            Strategy::Live(api) => {
                api.update_repo(
                    &request.context.access_token,
                    &repo,
                    &json!({ "archived": archived }),
                )
                .await?
            }
            Strategy::Simulated(sim) => {
                sim.set_archived(&repo, archived)?;
                sim.get_repo(&repo)?
            }
        };

        Ok(applied_result(
            output,
            Some(json!({ "archived": current })),
            Some(RollbackPlan {
                action_id: catalog::REPO_ARCHIVE.to_string(),
                input: json!({ "repo": repo, "archived": current }),
            }),
            demo,
        ))
    }
}
